//! Jack Compiler - Main Entry Point
//!
//! Compiles Jack source (a single `.jack` file or a directory of them)
//! into Hack VM code, one `.vm` file per input class.
//!
//! # Usage
//! ```bash
//! jack-compiler <input.jack | input-dir>
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

use std::env;
use std::path::Path;
use std::process;

use jack_compiler::{compile_path, Config};
use log::info;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <input.jack | input-dir>", args[0]);
        process::exit(1);
    }

    let input = Path::new(&args[1]);

    match compile_path(input, &Config::default()) {
        Ok(outputs) => {
            info!("compiled {} file(s) from {input:?}", outputs.len());
            for out in &outputs {
                println!("Compilation complete: {out:?}");
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
