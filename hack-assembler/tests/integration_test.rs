use hack_assembler::{assemble_file, Config};
use std::fs;

/// spec.md §8 scenario 1, driven through the file-level entry point.
#[test]
fn assembles_add_program_to_binary() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("Prog.asm");
    fs::write(&input, "@5\nD=A\n@R1\nM=D\n").unwrap();

    let output = dir.path().join("Prog.hack");
    let count = assemble_file(&input, &output, &Config::default()).unwrap();
    assert_eq!(count, 4);

    let generated = fs::read_to_string(&output).unwrap();
    assert_eq!(
        generated,
        "0000000000000101\n1110110000010000\n0000000000000001\n1110001100001000\n"
    );
}

/// A loop with a user variable and a label, exercising both passes together.
#[test]
fn assembles_loop_with_variable_and_label() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("Loop.asm");
    fs::write(
        &input,
        "// initialize sum\n@sum\nM=0\n(LOOP)\n@LOOP\n0;JMP\n",
    )
    .unwrap();

    let output = dir.path().join("Loop.hack");
    assemble_file(&input, &output, &Config::default()).unwrap();

    let generated = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = generated.lines().collect();
    assert_eq!(
        lines,
        vec![
            "0000000000010000",
            "1110101010001000",
            "0000000000000010",
            "1110101010000111",
        ]
    );
}

#[test]
fn comments_and_blank_lines_are_ignored() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("Commented.asm");
    fs::write(
        &input,
        "// a standalone comment\n\n@1 // trailing comment\n\nD=A\n",
    )
    .unwrap();

    let output = dir.path().join("Commented.hack");
    let count = assemble_file(&input, &output, &Config::default()).unwrap();
    assert_eq!(count, 2);
}

#[test]
fn missing_input_file_is_a_fatal_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("Missing.asm");
    let output = dir.path().join("Missing.hack");

    let err = assemble_file(&input, &output, &Config::default()).unwrap_err();
    assert!(matches!(err, hack_assembler::AssemblerError::Io(_)));
}
