//! Runs every program under `tests/programs` through the `beans` binary and checks it against
//! the JSON header on its first line.

use serde::Deserialize;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, PartialEq, Eq, Deserialize)]
enum Status {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "fail")]
    Fail,
}

#[derive(Debug, Deserialize)]
struct TestArgs {
    status: Status,
    stdout: Option<String>,
    stderr: Option<String>,
    flags: Option<Vec<String>>,
    #[serde(default)]
    ignore: bool,
}

fn programs() -> Vec<PathBuf> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/programs");
    let mut programs: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().map_or(false, |ext| ext == "beans"))
        .collect();
    programs.sort();
    programs
}

fn parse_header(path: &Path) -> TestArgs {
    let src = fs::read_to_string(path).unwrap();
    let header = src.lines().next().unwrap();
    assert!(header.starts_with(";; "), "{} has no header", path.display());
    serde_json::from_str(&header[3..]).unwrap()
}

fn run(path: &Path, args: &TestArgs) -> Result<(), String> {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_beans"));
    cmd.arg("-c").arg(path).arg("--color").arg("never");
    if let Some(flags) = &args.flags {
        cmd.args(flags);
    }
    let output = cmd.output().map_err(|err| err.to_string())?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let succeeded = output.status.success();
    if succeeded != (args.status == Status::Ok) {
        return Err(format!(
            "unexpected exit status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            stdout,
            stderr
        ));
    }
    if let Some(expected) = &args.stdout {
        if stdout.trim_end() != expected.trim_end() {
            return Err(format!("expected {:?} on stdout, got {:?}", expected, stdout));
        }
    }
    if let Some(expected) = &args.stderr {
        if !stderr.contains(expected.as_str()) {
            return Err(format!("expected {:?} on stderr, got {:?}", expected, stderr));
        }
    }
    Ok(())
}

#[test]
fn programs_behave_as_their_headers_say() {
    let programs = programs();
    assert!(!programs.is_empty());
    let mut failures = vec![];
    for path in programs.iter() {
        let args = parse_header(path);
        if let Err(failure) = run(path, &args) {
            if !args.ignore {
                failures.push(format!("{}: {}", path.display(), failure));
            }
        }
    }
    assert!(failures.is_empty(), "\n{}", failures.join("\n\n"));
}
