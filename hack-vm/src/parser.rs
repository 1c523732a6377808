//! Parser module for the Hack VM language
//!
//! Whitespace-tokenized, comment-stripped, with per-line parts cached on
//! `advance` to avoid re-splitting the same command twice.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::TranslateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Arithmetic,
    Push,
    Pop,
    Label,
    Goto,
    If,
    Function,
    Return,
    Call,
}

pub struct Parser {
    lines: Vec<String>,
    current_line: usize,
    current_command: String,
    /// Cached parts of the current command to avoid repeated parsing
    cached_parts: Vec<String>,
}

impl Parser {
    pub fn from_path(path: &Path) -> Result<Self, TranslateError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut lines = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let line = if let Some(pos) = line.find("//") {
                &line[..pos]
            } else {
                &line
            };

            let trimmed = line.trim();

            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }

        Ok(Parser {
            lines,
            current_line: 0,
            current_command: String::new(),
            cached_parts: Vec::new(),
        })
    }

    #[inline]
    pub fn has_more_commands(&self) -> bool {
        self.current_line < self.lines.len()
    }

    #[inline]
    pub fn advance(&mut self) {
        if self.has_more_commands() {
            std::mem::swap(
                &mut self.current_command,
                &mut self.lines[self.current_line],
            );

            self.cached_parts.clear();
            self.cached_parts.extend(
                self.current_command
                    .split_whitespace()
                    .map(|s| s.to_string()),
            );

            self.current_line += 1;
        }
    }

    #[inline]
    pub fn command_type(&self) -> CommandType {
        match self.cached_parts.first().map(String::as_str) {
            Some("push") => CommandType::Push,
            Some("pop") => CommandType::Pop,
            Some("label") => CommandType::Label,
            Some("goto") => CommandType::Goto,
            Some("if-goto") => CommandType::If,
            Some("function") => CommandType::Function,
            Some("return") => CommandType::Return,
            Some("call") => CommandType::Call,
            _ => CommandType::Arithmetic,
        }
    }

    #[inline]
    pub fn arg1(&self) -> Result<&str, TranslateError> {
        match self.command_type() {
            CommandType::Arithmetic => self
                .cached_parts
                .first()
                .map(String::as_str)
                .ok_or_else(|| TranslateError::MalformedCommand(self.current_command.clone())),
            CommandType::Return => Err(TranslateError::MalformedCommand(
                "arg1 is not defined for return".to_string(),
            )),
            _ => self
                .cached_parts
                .get(1)
                .map(String::as_str)
                .ok_or_else(|| TranslateError::MalformedCommand(self.current_command.clone())),
        }
    }

    #[inline]
    pub fn arg2(&self) -> Result<i32, TranslateError> {
        match self.command_type() {
            CommandType::Push | CommandType::Pop | CommandType::Function | CommandType::Call => {
                self.cached_parts
                    .get(2)
                    .ok_or_else(|| TranslateError::MalformedCommand(self.current_command.clone()))?
                    .parse::<i32>()
                    .map_err(|_| TranslateError::MalformedCommand(self.current_command.clone()))
            }
            _ => Err(TranslateError::MalformedCommand(
                "arg2 is not defined for this command type".to_string(),
            )),
        }
    }
}
