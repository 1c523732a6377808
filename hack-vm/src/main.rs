//! Hack VM Translator - Main Entry Point
//!
//! Lowers Hack VM code (a single `.vm` file or a directory of them) into
//! Hack assembly.
//!
//! # Usage
//! ```bash
//! hack-vm <input.vm | input-dir>
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

use std::env;
use std::path::Path;
use std::process;

use hack_vm::{output_path, translate, Config};
use log::info;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <input.vm | input-dir>", args[0]);
        process::exit(1);
    }

    let input = Path::new(&args[1]);
    let output = output_path(input);

    match translate(input, &output, &Config::default()) {
        Ok(count) => {
            info!("translated {count} file(s) from {input:?} -> {output:?}");
            println!("Translation complete: {:?} -> {:?}", input, output);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
