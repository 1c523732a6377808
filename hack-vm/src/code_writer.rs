//! Translates parsed VM commands into Hack assembly.
//!
//! Segment arithmetic, comparison labeling and the function call/return
//! convention follow the course's reference VM translator; label and
//! call-site naming are namespaced per module so a multi-file translation
//! unit never collides (see `CodeWriter::set_filename`).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::TranslateError;

macro_rules! write_asm {
    ($writer:expr, $($line:literal)*) => {
        $writer.write_all(concat!($($line, "\n"),*).as_bytes())
    };
}

#[derive(Clone, Copy)]
enum Segment {
    Local,
    Argument,
    This,
    That,
    Temp,
    Pointer,
    Static,
    Constant,
}

impl Segment {
    fn parse(segment: &str) -> Result<Self, TranslateError> {
        match segment {
            "local" => Ok(Segment::Local),
            "argument" => Ok(Segment::Argument),
            "this" => Ok(Segment::This),
            "that" => Ok(Segment::That),
            "temp" => Ok(Segment::Temp),
            "pointer" => Ok(Segment::Pointer),
            "static" => Ok(Segment::Static),
            "constant" => Ok(Segment::Constant),
            other => Err(TranslateError::UnknownSegment(other.to_string())),
        }
    }

    fn base_symbol(self) -> &'static str {
        match self {
            Segment::Local => "LCL",
            Segment::Argument => "ARG",
            Segment::This => "THIS",
            Segment::That => "THAT",
            Segment::Temp | Segment::Pointer | Segment::Static | Segment::Constant => "",
        }
    }
}

const TEMP_SIZE: i32 = 8;
const POINTER_SIZE: i32 = 2;

pub struct CodeWriter {
    output_file: BufWriter<File>,
    label_counter: usize,
    call_counter: usize,
    filename: String,
}

impl CodeWriter {
    /// Creates a new `CodeWriter` writing to `output_filename`.
    pub fn new(output_filename: &Path) -> Result<Self, TranslateError> {
        let file = File::create(output_filename)?;
        let buffered = BufWriter::with_capacity(8192, file);
        Ok(CodeWriter {
            output_file: buffered,
            label_counter: 0,
            call_counter: 0,
            filename: String::new(),
        })
    }

    /// Sets the current module name used to namespace static variables,
    /// branch labels, and comparison labels.
    #[inline]
    pub fn set_filename(&mut self, filename: &str) {
        let name = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown");
        self.filename.clear();
        self.filename.push_str(name);
    }

    /// Emits the bootstrap sequence: initializes `SP` to 256 and calls `Sys.init`.
    pub fn write_bootstrap(&mut self) -> Result<(), TranslateError> {
        write_asm!(self.output_file,
            "// bootstrap"
            "@256"
            "D=A"
            "@SP"
            "M=D"
        )?;
        self.write_call("Sys.init", 0)
    }

    pub fn write_arithmetic(&mut self, command: &str) -> Result<(), TranslateError> {
        writeln!(self.output_file, "// vm command:{command}")?;

        match command {
            "add" => self.write_binary_op("D+M"),
            "sub" => self.write_binary_op("D-M"),
            "and" => self.write_binary_op("D&M"),
            "or" => self.write_binary_op("D|M"),
            "neg" => self.write_unary_op(true),
            "not" => self.write_unary_op(false),
            "eq" => self.write_comparison("JEQ"),
            "gt" => self.write_comparison("JGT"),
            "lt" => self.write_comparison("JLT"),
            other => Err(TranslateError::UnknownArithmetic(other.to_string())),
        }
    }

    #[inline]
    fn write_binary_op(&mut self, operation: &str) -> Result<(), TranslateError> {
        write!(
            self.output_file,
            "// get the top element of stack\n\
             @SP\n\
             M=M-1\n\
             A=M\n\
             D=M\n\
             // store the result temporarily\n\
             @R14\n\
             M=D\n\
             // get the top element of stack\n\
             @SP\n\
             M=M-1\n\
             A=M\n\
             D=M\n\
             // store the result temporarily\n\
             @R13\n\
             M=D\n\
             @R13\n\
             D=M\n\
             @R14\n\
             D={operation}\n"
        )?;

        self.write_push_d()?;
        self.output_file.write_all(b"\n")?;
        Ok(())
    }

    #[inline]
    fn write_unary_op(&mut self, is_neg: bool) -> Result<(), TranslateError> {
        write_asm!(self.output_file,
            "// get the top element of stack"
            "@SP"
            "M=M-1"
            "A=M"
            "D=M"
        )?;

        if is_neg {
            write_asm!(self.output_file,
                "@0"
                "D=A-D"
            )?;
        } else {
            write_asm!(self.output_file, "D=!D")?;
        }

        self.write_push_d()?;
        self.output_file.write_all(b"\n")?;
        Ok(())
    }

    #[inline]
    fn write_comparison(&mut self, jump: &str) -> Result<(), TranslateError> {
        let k = self.label_counter;
        self.label_counter += 1;
        let jump_label = format!("{}$JUMP{k}", self.filename);
        let end_label = format!("{}$ENDJUMP{k}", self.filename);

        write!(
            self.output_file,
            "// get the top element of stack\n\
             @SP\n\
             M=M-1\n\
             A=M\n\
             D=M\n\
             // store the result temporarily\n\
             @R14\n\
             M=D\n\
             // get the top element of stack\n\
             @SP\n\
             M=M-1\n\
             A=M\n\
             D=M\n\
             // store the result temporarily\n\
             @R13\n\
             M=D\n\
             @R13\n\
             D=M\n\
             @R14\n\
             D=D-M\n\
             @{jump_label}\n\
             D;{jump}\n\
             // push the value into stack\n\
             @SP\n\
             A=M\n\
             M=0\n\
             @SP\n\
             M=M+1\n\
             @{end_label}\n\
             0;JMP\n\
             ({jump_label})\n\
             // push the value into stack\n\
             @SP\n\
             A=M\n\
             M=-1\n\
             @SP\n\
             M=M+1\n\
             ({end_label})\n\n"
        )?;
        Ok(())
    }

    pub fn write_push_pop(
        &mut self,
        is_push: bool,
        segment: &str,
        index: i32,
    ) -> Result<(), TranslateError> {
        writeln!(
            self.output_file,
            "// vm command:{} {} {}",
            if is_push { "push" } else { "pop" },
            segment,
            index
        )?;

        if is_push {
            self.write_push(segment, index)?;
        } else {
            self.write_pop(segment, index)?;
        }

        self.output_file.write_all(b"\n")?;
        Ok(())
    }

    #[inline]
    fn write_push(&mut self, segment: &str, index: i32) -> Result<(), TranslateError> {
        match Segment::parse(segment)? {
            Segment::Constant => {
                write!(self.output_file, "@{index}\nD=A\n")?;
                self.write_push_d()
            }
            seg @ (Segment::Local | Segment::Argument | Segment::This | Segment::That) => {
                write!(
                    self.output_file,
                    "@{}\nD=M\n@{index}\nA=D+A\nD=M\n",
                    seg.base_symbol()
                )?;
                self.write_push_d()
            }
            Segment::Temp => {
                let addr = Self::checked_offset("temp", 5, index, TEMP_SIZE)?;
                write!(self.output_file, "@R{addr}\nD=M\n")?;
                self.write_push_d()
            }
            Segment::Pointer => {
                let addr = Self::checked_offset("pointer", 3, index, POINTER_SIZE)?;
                write!(self.output_file, "@R{addr}\nD=M\n")?;
                self.write_push_d()
            }
            Segment::Static => {
                write!(self.output_file, "@{}.{index}\nD=M\n", self.filename)?;
                self.write_push_d()
            }
        }
    }

    #[inline]
    fn write_pop(&mut self, segment: &str, index: i32) -> Result<(), TranslateError> {
        match Segment::parse(segment)? {
            Segment::Constant => Err(TranslateError::PopConstant),
            seg @ (Segment::Local | Segment::Argument | Segment::This | Segment::That) => {
                write!(
                    self.output_file,
                    "@{}\n\
                     D=M\n\
                     @{index}\n\
                     D=D+A\n\
                     // store the result temporarily\n\
                     @R13\n\
                     M=D\n",
                    seg.base_symbol()
                )?;
                self.write_pop_to_d()?;
                write_asm!(self.output_file,
                    "// store the top value"
                    "@R13"
                    "A=M"
                    "M=D"
                )?;
                Ok(())
            }
            Segment::Temp => {
                let addr = Self::checked_offset("temp", 5, index, TEMP_SIZE)?;
                self.write_pop_to_d()?;
                writeln!(self.output_file, "@R{addr}\nM=D")?;
                Ok(())
            }
            Segment::Pointer => {
                let addr = Self::checked_offset("pointer", 3, index, POINTER_SIZE)?;
                self.write_pop_to_d()?;
                writeln!(self.output_file, "@R{addr}\nM=D")?;
                Ok(())
            }
            Segment::Static => {
                self.write_pop_to_d()?;
                writeln!(self.output_file, "@{}.{index}\nM=D", self.filename)?;
                Ok(())
            }
        }
    }

    fn checked_offset(
        name: &'static str,
        base: i32,
        index: i32,
        size: i32,
    ) -> Result<i32, TranslateError> {
        if index < 0 || index >= size {
            return Err(TranslateError::IndexOutOfRange {
                segment: name,
                index,
                max: size - 1,
            });
        }
        Ok(base + index)
    }

    pub fn write_label(&mut self, label: &str) -> Result<(), TranslateError> {
        writeln!(self.output_file, "({}${label})", self.filename)?;
        Ok(())
    }

    pub fn write_goto(&mut self, label: &str) -> Result<(), TranslateError> {
        writeln!(self.output_file, "@{}${label}", self.filename)?;
        writeln!(self.output_file, "0;JMP")?;
        Ok(())
    }

    pub fn write_if(&mut self, label: &str) -> Result<(), TranslateError> {
        self.write_pop_to_d()?;
        writeln!(self.output_file, "@{}${label}", self.filename)?;
        writeln!(self.output_file, "D;JNE")?;
        Ok(())
    }

    pub fn write_function(&mut self, function: &str, num_locals: i32) -> Result<(), TranslateError> {
        writeln!(self.output_file, "({function})")?;
        for _ in 0..num_locals {
            write!(self.output_file, "@0\nD=A\n")?;
            self.write_push_d()?;
        }
        Ok(())
    }

    pub fn write_call(&mut self, function: &str, num_args: i32) -> Result<(), TranslateError> {
        let ret_label = format!("RET.{function}.{}", self.call_counter);
        self.call_counter += 1;

        writeln!(self.output_file, "@{ret_label}")?;
        write_asm!(self.output_file, "D=A")?;
        self.write_push_d()?;

        for seg in ["LCL", "ARG", "THIS", "THAT"] {
            writeln!(self.output_file, "@{seg}")?;
            write_asm!(self.output_file, "D=M")?;
            self.write_push_d()?;
        }

        write_asm!(self.output_file,
            "@SP"
            "D=M"
            "@LCL"
            "M=D"
        )?;

        writeln!(self.output_file, "@{}", num_args + 5)?;
        write_asm!(self.output_file,
            "D=D-A"
            "@ARG"
            "M=D"
        )?;

        writeln!(self.output_file, "@{function}")?;
        write_asm!(self.output_file, "0;JMP")?;

        writeln!(self.output_file, "({ret_label})")?;
        Ok(())
    }

    pub fn write_return(&mut self) -> Result<(), TranslateError> {
        write_asm!(self.output_file,
            "@LCL"
            "D=M"
            "@R13"
            "M=D"
        )?;

        write_asm!(self.output_file,
            "@R13"
            "D=M"
            "@5"
            "D=D-A"
            "A=D"
            "D=M"
            "@R14"
            "M=D"
        )?;

        self.write_pop_to_d()?;
        write_asm!(self.output_file,
            "@ARG"
            "A=M"
            "M=D"
        )?;

        write_asm!(self.output_file,
            "@ARG"
            "D=M"
            "@SP"
            "M=D+1"
        )?;

        for (offset, seg) in [(1, "THAT"), (2, "THIS"), (3, "ARG"), (4, "LCL")] {
            writeln!(self.output_file, "@R13")?;
            write_asm!(self.output_file, "D=M")?;
            writeln!(self.output_file, "@{offset}")?;
            write_asm!(self.output_file,
                "D=D-A"
                "A=D"
                "D=M"
            )?;
            writeln!(self.output_file, "@{seg}")?;
            write_asm!(self.output_file, "M=D")?;
        }

        write_asm!(self.output_file, "@R14")?;
        writeln!(self.output_file, "A=M")?;
        write_asm!(self.output_file, "0;JMP")?;
        Ok(())
    }

    #[inline]
    fn write_push_d(&mut self) -> Result<(), TranslateError> {
        write_asm!(self.output_file,
            "// push the value into stack"
            "@SP"
            "A=M"
            "M=D"
            "@SP"
            "M=M+1"
        )?;
        Ok(())
    }

    #[inline]
    fn write_pop_to_d(&mut self) -> Result<(), TranslateError> {
        write_asm!(self.output_file,
            "// get the top element of stack"
            "@SP"
            "M=M-1"
            "A=M"
            "D=M"
        )?;
        Ok(())
    }

    #[inline]
    pub fn close(&mut self) -> Result<(), TranslateError> {
        self.output_file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn writer() -> (tempfile::TempDir, CodeWriter, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.asm");
        let cw = CodeWriter::new(&path).unwrap();
        (dir, cw, path)
    }

    #[test]
    fn push_constant_emits_literal_load() {
        let (_dir, mut cw, path) = writer();
        cw.set_filename("Main.vm");
        cw.write_push_pop(true, "constant", 17).unwrap();
        cw.close().unwrap();
        let out = fs::read_to_string(path).unwrap();
        assert!(out.contains("@17"));
        assert!(out.contains("D=A"));
    }

    #[test]
    fn pop_constant_is_rejected() {
        let (_dir, mut cw, _path) = writer();
        cw.set_filename("Main.vm");
        let err = cw.write_push_pop(false, "constant", 0).unwrap_err();
        assert!(matches!(err, TranslateError::PopConstant));
    }

    #[test]
    fn temp_index_out_of_range_is_rejected() {
        let (_dir, mut cw, _path) = writer();
        cw.set_filename("Main.vm");
        let err = cw.write_push_pop(true, "temp", 8).unwrap_err();
        assert!(matches!(err, TranslateError::IndexOutOfRange { .. }));
    }

    #[test]
    fn comparison_labels_are_module_qualified_and_unique() {
        let (_dir, mut cw, path) = writer();
        cw.set_filename("Main.vm");
        cw.write_arithmetic("eq").unwrap();
        cw.write_arithmetic("gt").unwrap();
        cw.close().unwrap();
        let out = fs::read_to_string(path).unwrap();
        assert!(out.contains("Main$JUMP0"));
        assert!(out.contains("Main$JUMP1"));
        assert_ne!(out.matches("Main$JUMP0").count(), 0);
    }

    #[test]
    fn call_labels_increment_regardless_of_target() {
        let (_dir, mut cw, path) = writer();
        cw.set_filename("Main.vm");
        cw.write_call("Foo.bar", 2).unwrap();
        cw.write_call("Foo.bar", 0).unwrap();
        cw.close().unwrap();
        let out = fs::read_to_string(path).unwrap();
        assert!(out.contains("RET.Foo.bar.0"));
        assert!(out.contains("RET.Foo.bar.1"));
    }

    #[test]
    fn bootstrap_initializes_sp_and_calls_sys_init() {
        let (_dir, mut cw, path) = writer();
        cw.write_bootstrap().unwrap();
        cw.close().unwrap();
        let out = fs::read_to_string(path).unwrap();
        assert!(out.starts_with("// bootstrap\n@256\nD=A\n@SP\nM=D\n"));
        assert!(out.contains("@Sys.init"));
        assert!(out.contains("RET.Sys.init.0"));
    }
}
