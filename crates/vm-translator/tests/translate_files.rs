//! File- and directory-mode translator tests.

use std::fs;

#[test]
fn file_mode_writes_sibling_asm_without_bootstrap() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("SimpleAdd.vm");
    fs::write(&src, "push constant 7\npush constant 8\nadd\n").unwrap();

    let out = hackvm::translate_file(&src).unwrap();
    assert_eq!(out, dir.path().join("SimpleAdd.asm"));

    let asm = fs::read_to_string(&out).unwrap();
    assert!(!asm.contains("Sys.init"));
    assert!(asm.starts_with("// push constant 7\n"));
}

#[test]
fn directory_mode_links_files_behind_the_bootstrap() {
    let dir = tempfile::tempdir().unwrap();
    let unit = dir.path().join("FibonacciElement");
    fs::create_dir(&unit).unwrap();
    fs::write(
        unit.join("Sys.vm"),
        "function Sys.init 0\npush constant 4\ncall Main.fibonacci 1\nlabel END\ngoto END\n",
    )
    .unwrap();
    fs::write(
        unit.join("Main.vm"),
        "function Main.fibonacci 0\n\
         push argument 0\n\
         push constant 2\n\
         lt\n\
         if-goto BASE\n\
         push argument 0\n\
         push constant 2\n\
         sub\n\
         call Main.fibonacci 1\n\
         push argument 0\n\
         push constant 1\n\
         sub\n\
         call Main.fibonacci 1\n\
         add\n\
         return\n\
         label BASE\n\
         push argument 0\n\
         return\n",
    )
    .unwrap();

    let out = hackvm::translate_dir(&unit).unwrap();
    assert_eq!(out, unit.join("FibonacciElement.asm"));

    let asm = fs::read_to_string(&out).unwrap();
    assert!(asm.starts_with("// bootstrap\n@256\n"));
    assert!(asm.contains("@Sys.init\n0;JMP"));
    // labels are scoped to their enclosing function
    assert!(asm.contains("(Main.fibonacci$BASE)"));
    assert!(asm.contains("(Sys.init$END)"));
    // Main.vm sorts before Sys.vm
    assert!(asm.find("(Main.fibonacci)").unwrap() < asm.find("(Sys.init)").unwrap());
}

#[test]
fn statics_from_different_files_do_not_collide() {
    let dir = tempfile::tempdir().unwrap();
    let unit = dir.path().join("Statics");
    fs::create_dir(&unit).unwrap();
    fs::write(
        unit.join("Sys.vm"),
        "function Sys.init 0\npush constant 1\npop static 0\n",
    )
    .unwrap();
    fs::write(
        unit.join("Other.vm"),
        "function Other.get 0\npush static 0\nreturn\n",
    )
    .unwrap();

    let out = hackvm::translate_dir(&unit).unwrap();
    let asm = fs::read_to_string(&out).unwrap();
    assert!(asm.contains("@Sys.0"));
    assert!(asm.contains("@Other.0"));
}

#[test]
fn emitted_assembly_survives_the_assembler() {
    let dir = tempfile::tempdir().unwrap();
    let unit = dir.path().join("Pipeline");
    fs::create_dir(&unit).unwrap();
    fs::write(
        unit.join("Sys.vm"),
        "function Sys.init 0\n\
         push constant 10\n\
         push constant 3\n\
         sub\n\
         pop temp 0\n\
         push temp 0\n\
         push constant 7\n\
         eq\n\
         if-goto DONE\n\
         label DONE\n\
         goto DONE\n",
    )
    .unwrap();

    let out = hackvm::translate_dir(&unit).unwrap();
    let asm = fs::read_to_string(&out).unwrap();
    let binary = hackasm::assemble_source(&asm).unwrap();
    assert!(!binary.is_empty());
    for line in binary.lines() {
        assert_eq!(line.len(), 16);
        assert!(line.chars().all(|c| c == '0' || c == '1'));
    }
}
