//! VM-to-Hack-assembly translator for the `Nand2Tetris` platform
//!
//! Lowers the stack-machine VM language (push/pop, arithmetic, branching,
//! function call/return) into Hack assembly.
//!
//! # Architecture
//!
//! - [`parser`]: whitespace-tokenized, comment-stripped VM command parsing
//! - [`code_writer`]: emits Hack assembly for each VM command
//! - [`translate`]/[`translate_path`]: the driver tying file discovery,
//!   bootstrap emission, and per-file module naming together

#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod code_writer;
pub mod parser;

use std::fs;
use std::path::{Path, PathBuf};

pub use code_writer::CodeWriter;
pub use parser::{CommandType, Parser};

use log::debug;
use thiserror::Error;

/// Driver-level error type for the VM translator.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed command: {0}")]
    MalformedCommand(String),
    #[error("unknown arithmetic command: {0}")]
    UnknownArithmetic(String),
    #[error("unknown segment: {0}")]
    UnknownSegment(String),
    #[error("cannot pop into the constant segment")]
    PopConstant,
    #[error("segment index out of range: {segment} {index} (max {max})")]
    IndexOutOfRange {
        segment: &'static str,
        index: i32,
        max: i32,
    },
    #[error("no .vm files found under {0}")]
    NoVmFiles(PathBuf),
}

/// Behavioral knobs for the translator driver.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Emit the bootstrap sequence (`SP=256`, `call Sys.init 0`) ahead of
    /// the translated output. Only meaningful, and only applied, in
    /// directory mode.
    pub bootstrap: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { bootstrap: true }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }
}

/// Translates a single already-opened `.vm` file's commands into `writer`.
fn translate_commands(path: &Path, writer: &mut CodeWriter) -> Result<(), TranslateError> {
    let mut parser = Parser::from_path(path)?;
    writer.set_filename(
        path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown"),
    );

    while parser.has_more_commands() {
        parser.advance();
        match parser.command_type() {
            CommandType::Arithmetic => writer.write_arithmetic(parser.arg1()?)?,
            CommandType::Push => writer.write_push_pop(true, parser.arg1()?, parser.arg2()?)?,
            CommandType::Pop => writer.write_push_pop(false, parser.arg1()?, parser.arg2()?)?,
            CommandType::Label => writer.write_label(parser.arg1()?)?,
            CommandType::Goto => writer.write_goto(parser.arg1()?)?,
            CommandType::If => writer.write_if(parser.arg1()?)?,
            CommandType::Function => writer.write_function(parser.arg1()?, parser.arg2()?)?,
            CommandType::Call => writer.write_call(parser.arg1()?, parser.arg2()?)?,
            CommandType::Return => writer.write_return()?,
        }
    }

    Ok(())
}

/// Resolves `input` to a sorted list of `.vm` files: the file itself if
/// `input` is a file, or every `.vm` file directly under it (sorted by
/// name for deterministic output) if `input` is a directory.
fn discover_vm_files(input: &Path) -> Result<Vec<PathBuf>, TranslateError> {
    if input.is_dir() {
        let mut files: Vec<PathBuf> = fs::read_dir(input)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("vm"))
            .collect();
        files.sort();
        if files.is_empty() {
            return Err(TranslateError::NoVmFiles(input.to_path_buf()));
        }
        Ok(files)
    } else {
        Ok(vec![input.to_path_buf()])
    }
}

/// Derives the single output `.asm` path for a translation unit: for a
/// directory input `Dir/`, the output is `Dir/Dir.asm`; for a single file
/// `Foo.vm`, the output is `Foo.asm`.
#[must_use]
pub fn output_path(input: &Path) -> PathBuf {
    if input.is_dir() {
        let dir_name = input
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("Output");
        input.join(format!("{dir_name}.asm"))
    } else {
        input.with_extension("asm")
    }
}

/// Translates `input` (a single `.vm` file or a directory of them) to
/// `output`, returning the number of source files processed.
pub fn translate(input: &Path, output: &Path, config: &Config) -> Result<usize, TranslateError> {
    let files = discover_vm_files(input)?;
    let directory_mode = input.is_dir();

    let mut writer = CodeWriter::new(output)?;
    if directory_mode && config.bootstrap {
        writer.write_bootstrap()?;
    }

    for file in &files {
        translate_commands(file, &mut writer)?;
    }
    writer.close()?;

    debug!("translated {} file(s) from {:?} into {:?}", files.len(), input, output);
    Ok(files.len())
}
