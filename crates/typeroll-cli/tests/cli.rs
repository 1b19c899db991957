//! Tests for the `typeroll` command.

use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn typeroll_command() -> Command {
    Command::new(env!("CARGO_BIN_EXE_typeroll"))
}

#[test]
fn bundles_entry_to_out_dir() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(
        dir.path().join("src/index.ts"),
        "export interface User {\n  id: number;\n}\n",
    )
    .unwrap();

    let output = typeroll_command()
        .arg("src/index.ts")
        .args(["--cwd", dir.path().to_str().unwrap()])
        .args(["--out-dir", dir.path().join("dist").to_str().unwrap()])
        .output()
        .unwrap();

    assert!(output.status.success(), "command failed: {output:?}");
    let dts = dir.path().join("dist/index.d.ts");
    assert!(dts.exists(), "expected {} to exist", dts.display());
    let content = fs::read_to_string(&dts).unwrap();
    assert!(
        content.contains("interface User"),
        "expected 'interface User' in output, got:\n{content}"
    );
}

#[test]
fn stdout_mode_prints_declarations() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("api.ts"),
        "export type Id = string;\n",
    )
    .unwrap();

    let output = typeroll_command()
        .arg("api.ts")
        .args(["--cwd", dir.path().to_str().unwrap()])
        .arg("--stdout")
        .output()
        .unwrap();

    assert!(output.status.success(), "command failed: {output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("type Id = string;"),
        "expected declaration on stdout, got:\n{stdout}"
    );
}

#[test]
fn entry_config_from_typeroll_toml() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/main.ts"), "export type A = 1;\n").unwrap();
    fs::write(
        dir.path().join("typeroll.toml"),
        "entry = [\"src/main.ts\"]\n\n[bundle]\nout_dir = \"types\"\n",
    )
    .unwrap();

    let status = typeroll_command()
        .args(["--cwd", dir.path().to_str().unwrap()])
        .status()
        .unwrap();

    assert!(status.success());
    assert!(dir.path().join("types/main.d.ts").exists());
}

#[test]
fn fails_without_entrypoints() {
    let dir = tempdir().unwrap();
    let output = typeroll_command()
        .args(["--cwd", dir.path().to_str().unwrap()])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("no entrypoints"),
        "expected 'no entrypoints' in stderr, got:\n{stderr}"
    );
}
