//! Compiler for the `Nand2Tetris` "Jack" language, emitting Hack VM code.
//!
//! # Architecture
//!
//! - [`tokenizer`]: lazy, single-pass lexical analysis
//! - [`symbol_table`]: two-scope (class/subroutine) symbol table
//! - [`vm_writer`]: thin formatter over the fixed VM instruction set
//! - [`compilation_engine`]: recursive-descent parser driving the above two
//! - [`compile_file`]/[`compile_path`]: the driver tying file discovery and
//!   per-class compilation together

#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod compilation_engine;
pub mod symbol_table;
pub mod tokenizer;
pub mod vm_writer;

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub use compilation_engine::CompilationEngine;
pub use symbol_table::{Kind, SymbolTable};
pub use tokenizer::{Token, TokenKind, Tokenizer};

use log::{debug, info};
use thiserror::Error;

/// Top-level error type for the Jack compiler.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {0}: unterminated block comment")]
    UnterminatedComment(usize),
    #[error("line {0}: unterminated string constant")]
    UnterminatedString(usize),
    #[error("line {1}: unrecognized character {0:?}")]
    UnrecognizedCharacter(char, usize),
    #[error("line {1}: integer constant {0} is out of range (max 32767)")]
    IntegerOutOfRange(String, usize),
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("line {line}: expected {expected}, found {found:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
    },
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("no .jack files found under {0}")]
    NoJackFiles(PathBuf),
}

/// Behavioral knobs for the compiler driver.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Reserved for callers that want compilation of a batch to keep going
    /// past one file's failure rather than aborting at the first error.
    pub keep_going: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { keep_going: false }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }
}

/// Compiles a single already-read Jack source string to VM text.
pub fn compile_source(source: &str) -> Result<String, CompileError> {
    let mut engine = CompilationEngine::new(source, Vec::new());
    engine.compile_class()?;
    Ok(String::from_utf8(engine.into_inner()).expect("VM writer only emits ASCII"))
}

/// Compiles a single `.jack` file to the `.vm` file alongside it (same
/// stem, `.vm` extension), returning the output path.
pub fn compile_file(input: &Path) -> Result<PathBuf, CompileError> {
    let source = fs::read_to_string(input)?;
    let output_path = input.with_extension("vm");
    let file = fs::File::create(&output_path)?;
    let mut engine = CompilationEngine::new(&source, BufWriter::new(file));
    engine.compile_class()?;
    drop(engine.into_inner());

    debug!("compiled {input:?} -> {output_path:?}");
    Ok(output_path)
}

/// Resolves `input` to a sorted list of `.jack` files: the file itself if
/// `input` is a file, or every `.jack` file directly under it (sorted by
/// name for deterministic output) if `input` is a directory.
fn discover_jack_files(input: &Path) -> Result<Vec<PathBuf>, CompileError> {
    if input.is_dir() {
        let mut files: Vec<PathBuf> = fs::read_dir(input)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("jack"))
            .collect();
        files.sort();
        if files.is_empty() {
            return Err(CompileError::NoJackFiles(input.to_path_buf()));
        }
        Ok(files)
    } else {
        Ok(vec![input.to_path_buf()])
    }
}

/// Compiles every `.jack` file found under `input` (a single file or a
/// directory), emitting one `.vm` file per input class. Returns the list
/// of output paths written, in the same (sorted) order the inputs were
/// discovered.
pub fn compile_path(input: &Path, config: &Config) -> Result<Vec<PathBuf>, CompileError> {
    let files = discover_jack_files(input)?;
    let mut outputs = Vec::with_capacity(files.len());
    let mut first_error = None;

    for file in &files {
        match compile_file(file) {
            Ok(out) => outputs.push(out),
            Err(err) => {
                log::warn!("failed to compile {file:?}: {err}");
                if first_error.is_none() {
                    first_error = Some(err);
                }
                if !config.keep_going {
                    return Err(first_error.unwrap());
                }
            }
        }
    }

    if let Some(err) = first_error {
        return Err(err);
    }

    info!(
        "compiled {} file(s) from {:?} -> {} .vm file(s)",
        files.len(),
        input,
        outputs.len()
    );
    Ok(outputs)
}
