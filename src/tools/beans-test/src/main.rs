use serde::Deserialize;

use std::error::Error;
use std::ffi::OsStr;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read as _, Write as _};
use std::path::{Path, PathBuf};
use std::process::{self, Command, Output};

use structopt::StructOpt;

use termion::color;

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;

const EXT: &str = "beans";

#[derive(StructOpt, Debug)]
#[structopt(name = "beans-test")]
pub struct Opts {
    /// The interpreter binary under test
    #[structopt(long, parse(from_os_str), default_value = "target/debug/beans")]
    pub build: PathBuf,
    #[structopt(long = "path", parse(from_os_str), default_value = "tests/programs")]
    pub test_path: PathBuf,
    #[structopt(long, short = "v")]
    pub verbose: bool,
    /// Extra flags passed to every run
    #[structopt(short = "-")]
    pub beans_args: Vec<String>,
}

#[derive(Debug)]
struct Failure {
    path: PathBuf,
    kind: FailureKind,
    cause: Option<Box<dyn Error + 'static>>,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.path.display())?;
        writeln!(f, "{}", self.kind)?;
        if let Some(cause) = &self.cause {
            writeln!(f, "{}", cause)
        } else {
            Ok(())
        }
    }
}

impl Error for Failure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self.cause {
            Some(ref cause) => Some(&**cause),
            _ => None,
        }
    }
}

fn write_output(f: &mut fmt::Formatter, output: &Output) -> fmt::Result {
    writeln!(f, "stdout:")?;
    writeln!(f, "{}", String::from_utf8_lossy(&output.stdout))?;
    writeln!(f, "stderr:")?;
    write!(f, "{}", String::from_utf8_lossy(&output.stderr))
}

#[derive(Debug)]
enum FailureKind {
    Fatal,
    StatusMismatch(Output),
    StdoutMismatch { expected: String, actual: String },
    StderrMismatch { expected: String, output: Output },
    ArgumentParseFailure(String),
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FailureKind::Fatal => write!(f, "a fatal error occured"),
            FailureKind::StatusMismatch(output) => {
                if output.status.success() {
                    writeln!(f, "evaluation succeeded when it was expected to fail")?;
                } else {
                    writeln!(f, "evaluation failed when it was expected to succeed")?;
                }
                write_output(f, output)
            }
            FailureKind::StdoutMismatch { expected, actual } => write!(
                f,
                "expected output was {:?}, but got {:?}",
                expected, actual
            ),
            FailureKind::StderrMismatch { expected, output } => {
                writeln!(f, "expected stderr to mention {:?}", expected)?;
                write_output(f, output)
            }
            FailureKind::ArgumentParseFailure(reason) => {
                write!(f, "failed to parse test arguments because {}", reason)
            }
        }
    }
}

impl FailureKind {
    fn with_path_and_cause(self, path: &Path, cause: Box<dyn Error + 'static>) -> Failure {
        Failure {
            kind: self,
            path: path.to_owned(),
            cause: Some(cause),
        }
    }

    fn with_path(self, path: &Path) -> Failure {
        Failure {
            kind: self,
            path: path.to_owned(),
            cause: None,
        }
    }
}

fn visit_dirs(dir: &Path, cb: &mut impl FnMut(&Path) -> io::Result<()>) -> io::Result<()> {
    if dir.is_dir() {
        let mut entries = fs::read_dir(dir)?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<io::Result<Vec<_>>>()?;
        entries.sort();
        for path in entries {
            if path.is_dir() {
                visit_dirs(&path, cb)?;
            } else {
                cb(&path)?;
            }
        }
        Ok(())
    } else {
        cb(dir)
    }
}

fn collect_tests(opts: &Opts) -> Result<Vec<PathBuf>, Failure> {
    let mut tests = vec![];
    let extension = OsStr::new(EXT);
    visit_dirs(&opts.test_path, &mut |path| {
        if path.extension() == Some(extension) {
            if opts.verbose {
                println!("found {}", &path.display());
            }
            tests.push(path.to_owned());
        }
        Ok(())
    })
    .map_err(|err| FailureKind::Fatal.with_path_and_cause(&opts.test_path, Box::new(err)))?;
    println!(
        "found {}{}{} test file(s)",
        color::Fg(color::Green),
        tests.len(),
        color::Fg(color::Reset),
    );
    Ok(tests)
}

#[derive(Copy, Clone, PartialEq, Eq, Deserialize)]
enum Status {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "fail")]
    Fail,
}

/// The JSON header on the first line of every test program, after `;; `.
#[derive(Deserialize)]
struct TestArgs {
    status: Status,
    stdout: Option<String>,
    stderr: Option<String>,
    flags: Option<Vec<String>>,
    #[serde(default)]
    ignore: bool,
}

fn parse_test(path: &Path) -> Result<TestArgs, Failure> {
    let mut test_src = String::new();
    let mut file = File::open(path)
        .map_err(|err| FailureKind::Fatal.with_path_and_cause(path, Box::new(err)))?;
    file.read_to_string(&mut test_src)
        .map_err(|err| FailureKind::Fatal.with_path_and_cause(path, Box::new(err)))?;
    let unparsed = test_src.lines().next().ok_or_else(|| {
        FailureKind::ArgumentParseFailure("file appears to be empty".to_string()).with_path(path)
    })?;
    if !unparsed.starts_with(";; ") {
        return Err(FailureKind::ArgumentParseFailure(
            "the first line is not a ';; ' comment".to_string(),
        )
        .with_path(path));
    }
    serde_json::from_str(&unparsed[3..]).map_err(|err| {
        FailureKind::ArgumentParseFailure("the argument json could not be parsed".to_string())
            .with_path_and_cause(path, Box::new(err))
    })
}

fn check_output(test_args: &TestArgs, path: &Path, output: Output) -> Result<(), Failure> {
    match test_args.status {
        Status::Ok if !output.status.success() => {
            return Err(FailureKind::StatusMismatch(output).with_path(path))
        }
        Status::Fail if output.status.success() => {
            return Err(FailureKind::StatusMismatch(output).with_path(path))
        }
        _ => {}
    }
    if let Some(expected) = &test_args.stdout {
        let actual = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
        if actual != expected.trim_end() {
            return Err(FailureKind::StdoutMismatch {
                expected: expected.clone(),
                actual,
            }
            .with_path(path));
        }
    }
    if let Some(expected) = &test_args.stderr {
        if !String::from_utf8_lossy(&output.stderr).contains(expected.as_str()) {
            return Err(FailureKind::StderrMismatch {
                expected: expected.clone(),
                output,
            }
            .with_path(path));
        }
    }
    Ok(())
}

fn run_test(opts: &Opts, path: &Path) -> Result<(), Failure> {
    let test_args = parse_test(path)?;
    let mut run = Command::new(&opts.build);
    run.arg("-c").arg(path).arg("--color").arg("never");
    run.args(opts.beans_args.iter());
    if let Some(flags) = &test_args.flags {
        run.args(flags.iter());
    }
    if opts.verbose {
        println!("{:?}", run);
    }
    let result = run
        .output()
        .map_err(|err| FailureKind::Fatal.with_path_and_cause(path, Box::new(err)))
        .and_then(|output| check_output(&test_args, path, output));
    if test_args.ignore && result.is_err() {
        print!(
            "({}ignored{}) ",
            color::Fg(color::Yellow),
            color::Fg(color::Reset)
        );
        Ok(())
    } else {
        result
    }
}

fn run_tests(opts: &Opts, tests: &[PathBuf]) -> Vec<Failure> {
    let mut failures = vec![];
    for test in tests.iter() {
        print!("running {}... ", test.display());
        // a failed flush only delays the progress line
        let _ = io::stdout().flush();
        if opts.verbose {
            println!();
        }
        if let Err(failure) = run_test(opts, test) {
            failures.push(failure);
            println!("{}FAIL{}", color::Fg(color::Red), color::Fg(color::Reset));
        } else {
            println!("{}OK{}", color::Fg(color::Green), color::Fg(color::Reset));
        }
    }
    failures
}

fn driver(opts: &Opts) -> i32 {
    let tests = match collect_tests(&opts) {
        Ok(tests) => tests,
        Err(failure) => {
            println!("{}", failure);
            return EXIT_FAILURE;
        }
    };
    let failures = run_tests(&opts, &tests);
    if failures.is_empty() {
        println!(
            "all {}{}{} test(s) passed! {}<3{}",
            color::Fg(color::Green),
            tests.len(),
            color::Fg(color::Reset),
            color::Fg(color::Red),
            color::Fg(color::Reset),
        );
        EXIT_SUCCESS
    } else {
        println!(
            "{}{}{} of {} test(s) failed! {}</3{}",
            color::Fg(color::Red),
            failures.len(),
            color::Fg(color::Reset),
            tests.len(),
            color::Fg(color::Red),
            color::Fg(color::Reset),
        );
        println!("failures:");
        for failure in failures.iter() {
            println!("{}", failure);
        }
        EXIT_FAILURE
    }
}

fn main() {
    let opts = Opts::from_args();
    let exit_code = driver(&opts);
    println!("exiting with status code {}", exit_code);
    process::exit(exit_code);
}
