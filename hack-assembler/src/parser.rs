//! Parser module for Hack assembly language
//!
//! Provides zero-copy parsing with performance optimizations:
//! - Byte-level comment detection for speed
//! - Manual whitespace trimming to avoid allocations

use thiserror::Error;

#[derive(Debug, PartialEq, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // Command suffix is intentional and clear
pub enum CommandType {
    /// @Xxx where Xxx is either a symbol or a decimal number
    ACommand,
    /// dest=comp;jump
    CCommand,
    /// (Xxx) where Xxx is a symbol
    LCommand,
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid parser state: {0}")]
    InvalidState(&'static str),
}

/// Parser for assembly lines with zero-copy string slicing
pub struct ParserLines<'a> {
    lines: std::slice::Iter<'a, String>,
    current_line: &'a str,
    current_command_type: Option<CommandType>,
}

impl<'a> ParserLines<'a> {
    /// Creates a new parser from a slice of lines
    #[inline]
    #[must_use]
    pub fn from_lines(lines: &'a [String]) -> Self {
        Self {
            lines: lines.iter(),
            current_line: "",
            current_command_type: None,
        }
    }

    /// Advances to the next valid command, skipping comments and whitespace
    #[inline]
    pub fn advance(&mut self) -> bool {
        for line in self.lines.by_ref() {
            if line.is_empty() {
                continue;
            }

            let clean_line = Self::strip_comment(line);
            let trimmed = clean_line.trim();

            if !trimmed.is_empty() {
                self.current_line = trimmed;
                self.current_command_type = Some(Self::classify_command(trimmed));
                return true;
            }
        }

        self.current_command_type = None;
        false
    }

    /// Strips comments from a line using optimized byte scanning
    #[inline]
    fn strip_comment(line: &str) -> &str {
        let bytes = line.as_bytes();

        for i in 0..bytes.len().saturating_sub(1) {
            if bytes[i] == b'/' && bytes[i + 1] == b'/' {
                return &line[..i];
            }
        }

        line
    }

    /// Classifies command type based on first character
    #[inline]
    fn classify_command(line: &str) -> CommandType {
        let first_byte = line.as_bytes()[0];
        match first_byte {
            b'@' => CommandType::ACommand,
            b'(' => CommandType::LCommand,
            _ => CommandType::CCommand,
        }
    }

    /// Returns the current command type
    #[inline]
    pub fn command_type(&self) -> Result<CommandType, ParserError> {
        self.current_command_type
            .ok_or(ParserError::InvalidState("no current line available"))
    }

    /// Returns the symbol from A-command or L-command
    ///
    /// # Errors
    /// Returns an error if called on a C-command or if no command is available.
    #[inline]
    pub fn symbol(&self) -> Result<&str, ParserError> {
        match self.current_command_type {
            Some(CommandType::ACommand) => Ok(&self.current_line[1..]),
            Some(CommandType::LCommand) => {
                let len = self.current_line.len();
                Ok(&self.current_line[1..len - 1])
            }
            Some(CommandType::CCommand) => {
                Err(ParserError::InvalidState("called symbol() on C-command"))
            }
            None => Err(ParserError::InvalidState("no current line available")),
        }
    }

    /// Returns the dest part of a C-command; `Some("")` if absent.
    #[inline]
    pub fn dest(&self) -> Result<Option<&str>, ParserError> {
        match self.current_command_type {
            Some(CommandType::CCommand) => {
                if let Some(pos) = self.current_line.find('=') {
                    Ok(Some(&self.current_line[..pos]))
                } else {
                    Ok(Some(""))
                }
            }
            Some(_) => Ok(None),
            None => Err(ParserError::InvalidState("no current line available")),
        }
    }

    /// Returns the comp part of a C-command
    #[inline]
    pub fn comp(&self) -> Result<Option<&str>, ParserError> {
        match self.current_command_type {
            Some(CommandType::CCommand) => {
                let start = self.current_line.find('=').map_or(0, |pos| pos + 1);
                let end = self
                    .current_line
                    .find(';')
                    .unwrap_or(self.current_line.len());
                Ok(Some(&self.current_line[start..end]))
            }
            Some(_) => Ok(None),
            None => Err(ParserError::InvalidState("no current line available")),
        }
    }

    /// Returns the jump part of a C-command; `Some("")` if absent.
    #[inline]
    pub fn jump(&self) -> Result<Option<&str>, ParserError> {
        match self.current_command_type {
            Some(CommandType::CCommand) => {
                if let Some(pos) = self.current_line.find(';') {
                    Ok(Some(&self.current_line[pos + 1..]))
                } else {
                    Ok(Some(""))
                }
            }
            Some(_) => Ok(None),
            None => Err(ParserError::InvalidState("no current line available")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_classification() {
        assert_eq!(ParserLines::classify_command("@100"), CommandType::ACommand);
        assert_eq!(
            ParserLines::classify_command("(LOOP)"),
            CommandType::LCommand
        );
        assert_eq!(ParserLines::classify_command("D=M"), CommandType::CCommand);
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(ParserLines::strip_comment("@100 // comment"), "@100 ");
        assert_eq!(ParserLines::strip_comment("D=M"), "D=M");
        assert_eq!(ParserLines::strip_comment("// only comment"), "");
    }

    #[test]
    fn test_parser_advance() {
        let lines = vec![
            "// comment".to_string(),
            String::new(),
            "@100".to_string(),
            "D=M // inline comment".to_string(),
        ];
        let mut parser = ParserLines::from_lines(&lines);

        assert!(parser.advance());
        assert_eq!(parser.command_type().unwrap(), CommandType::ACommand);
        assert_eq!(parser.symbol().unwrap(), "100");

        assert!(parser.advance());
        assert_eq!(parser.command_type().unwrap(), CommandType::CCommand);
        assert_eq!(parser.dest().unwrap(), Some("D"));
        assert_eq!(parser.comp().unwrap(), Some("M"));

        assert!(!parser.advance());
    }

    #[test]
    fn test_c_command_parsing() {
        let lines = vec!["MD=D+1;JMP".to_string()];
        let mut parser = ParserLines::from_lines(&lines);
        parser.advance();

        assert_eq!(parser.dest().unwrap(), Some("MD"));
        assert_eq!(parser.comp().unwrap(), Some("D+1"));
        assert_eq!(parser.jump().unwrap(), Some("JMP"));
    }

    #[test]
    fn test_c_command_no_dest() {
        let lines = vec!["D+1;JMP".to_string()];
        let mut parser = ParserLines::from_lines(&lines);
        parser.advance();

        assert_eq!(parser.dest().unwrap(), Some(""));
        assert_eq!(parser.comp().unwrap(), Some("D+1"));
        assert_eq!(parser.jump().unwrap(), Some("JMP"));
    }

    #[test]
    fn test_c_command_no_jump() {
        let lines = vec!["D=D+1".to_string()];
        let mut parser = ParserLines::from_lines(&lines);
        parser.advance();

        assert_eq!(parser.dest().unwrap(), Some("D"));
        assert_eq!(parser.comp().unwrap(), Some("D+1"));
        assert_eq!(parser.jump().unwrap(), Some(""));
    }

    #[test]
    fn test_l_command_parsing() {
        let lines = vec!["(LOOP)".to_string()];
        let mut parser = ParserLines::from_lines(&lines);
        parser.advance();

        assert_eq!(parser.command_type().unwrap(), CommandType::LCommand);
        assert_eq!(parser.symbol().unwrap(), "LOOP");
    }

    #[test]
    fn test_whitespace_handling() {
        let lines = vec!["   @100   ".to_string(), "  D=M  // comment  ".to_string()];
        let mut parser = ParserLines::from_lines(&lines);

        assert!(parser.advance());
        assert_eq!(parser.symbol().unwrap(), "100");

        assert!(parser.advance());
        assert_eq!(parser.dest().unwrap(), Some("D"));
    }
}
