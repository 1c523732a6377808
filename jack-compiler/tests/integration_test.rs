use jack_compiler::{compile_path, Config};
use std::fs;

fn write_jack(dir: &std::path::Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// spec.md §8 scenario 5, driven through the file-based entry point.
#[test]
fn compiles_single_file_to_sibling_vm_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_jack(
        dir.path(),
        "Main.jack",
        "class Main { function void main() { return; } }",
    );

    let outputs = compile_path(&input, &Config::default()).unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0], dir.path().join("Main.vm"));

    let vm = fs::read_to_string(&outputs[0]).unwrap();
    assert_eq!(vm, "function Main.main 0\npush constant 0\nreturn\n");
}

#[test]
fn directory_mode_compiles_every_class_to_its_own_vm_file() {
    let dir = tempfile::tempdir().unwrap();
    write_jack(
        dir.path(),
        "Main.jack",
        "class Main { function void main() { do Foo.run(); return; } }",
    );
    write_jack(
        dir.path(),
        "Foo.jack",
        "class Foo { function void run() { return; } }",
    );

    let outputs = compile_path(dir.path(), &Config::default()).unwrap();
    assert_eq!(outputs.len(), 2);
    assert!(outputs.iter().any(|p| p.ends_with("Main.vm")));
    assert!(outputs.iter().any(|p| p.ends_with("Foo.vm")));

    let main_vm = fs::read_to_string(dir.path().join("Main.vm")).unwrap();
    assert!(main_vm.contains("call Foo.run 0\n"));
}

#[test]
fn parse_error_aborts_the_unit() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_jack(dir.path(), "Bad.jack", "class Bad { let x = 1; } ");

    let err = compile_path(&input, &Config::default()).unwrap_err();
    assert!(matches!(err, jack_compiler::CompileError::UnexpectedToken { .. }));
}

#[test]
fn undefined_variable_is_a_fatal_symbol_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_jack(
        dir.path(),
        "Bad.jack",
        "class Bad { function void f() { return missing; } }",
    );

    let err = compile_path(&input, &Config::default()).unwrap_err();
    assert!(matches!(err, jack_compiler::CompileError::UndefinedVariable(name) if name == "missing"));
}

#[test]
fn empty_directory_is_a_fatal_compile_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = compile_path(dir.path(), &Config::default()).unwrap_err();
    assert!(matches!(err, jack_compiler::CompileError::NoJackFiles(_)));
}
