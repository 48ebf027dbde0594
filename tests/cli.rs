use std::fs;
use std::process::{Command, Output};

use tempfile::TempDir;

const SWAP: &str = "(deftype One)
(deftype Two)
(deftype Pair fst snd)

(defn swap (p)
  (case p
    Pair (let (a (proj fst p) b (proj snd p) r (new Pair b a)) (ret r))))

(defn main ()
  (let (one (new One) two (new Two) p (new Pair one two) r (swap p))
    (ret r)))
";

fn beans(src: &str, args: &[&str]) -> Output {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("main.beans");
    fs::write(&path, src).unwrap();
    Command::new(env!("CARGO_BIN_EXE_beans"))
        .arg("-c")
        .arg(&path)
        .args(&["--color", "never"])
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn prints_the_result_of_main() {
    let output = beans(SWAP, &[]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "(Pair Two One)\n");
}

#[test]
fn dumps_the_transformed_ir() {
    let output = beans(SWAP, &["--reuse", "--dump-ir"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("(reset p)"), "{}", stdout);
    assert!(stdout.contains("(reuse _r0 Pair b a)"), "{}", stdout);
    assert!(stdout.trim_end().ends_with("(Pair Two One)"), "{}", stdout);
    assert_eq!(stdout.matches("(defn swap").count(), 1, "{}", stdout);
}

#[test]
fn dumps_the_lowered_ir_without_reuse() {
    let output = beans(SWAP, &["--dump-ir"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("(defn swap").count(), 1, "{}", stdout);
    assert!(!stdout.contains("reset"), "{}", stdout);
}

#[test]
fn reports_heap_statistics() {
    let output = beans(SWAP, &["--reuse", "--stats", "--check-leaks"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("allocations: 3, reuses: 1, frees: 1, declined resets: 0"),
        "{}",
        stderr
    );
}

#[test]
fn selects_another_entry_point() {
    let src = format!("{}\n(defn other () (let (one (new One)) (ret one)))\n", SWAP);
    let output = beans(&src, &["--entry", "other"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "One\n");
}

#[test]
fn load_errors_point_at_the_source() {
    let output = beans("(deftype A)\n(defn main () (ret x))\n", &[]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("reference to unbound variable"), "{}", stderr);
    assert!(stderr.contains("main.beans:2:"), "{}", stderr);
}

#[test]
fn missing_files_fail() {
    let dir = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_beans"))
        .arg("-c")
        .arg(dir.path().join("missing.beans"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read source file"));
}
