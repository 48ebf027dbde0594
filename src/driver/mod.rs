use crate::diagnostics::{self, Diagnostic, FileId, Files, Label, Result, Span};
use crate::{back, middle};

use std::fs;
use std::process;
use std::time::Instant;

use structopt::StructOpt;

mod opts;

pub use opts::*;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

fn open_src_file(opts: &Opts, files: &mut Files) -> Result<FileId> {
    match fs::read_to_string(&opts.src) {
        Ok(src) => Ok(files.add(opts.src_file_name().to_owned(), src)),
        Err(err) => {
            // the file never made it into the database, so span the error on an empty stand-in
            let file_id = files.add(opts.src_file_name().to_owned(), "");
            Err(Diagnostic::new_error(
                "failed to read source file",
                Label::new(file_id, Span::dummy(), err.to_string()),
            ))
        }
    }
}

fn check_leaks(
    program: &middle::ir::Program,
    heap: &mut back::Heap,
    result: back::Location,
) -> Result<()> {
    heap.dec(&[result]).map_err(|err| {
        Diagnostic::new_bug(
            "missing heap location",
            Label::new(program.file_id(), Span::dummy(), err.to_string()),
        )
    })?;
    if heap.is_empty() {
        return Ok(());
    }
    warn!("{} heap cell(s) outlived the result", heap.len());
    Err(Diagnostic::new_error(
        "heap is not empty after dropping the result",
        Label::new(
            program.file_id(),
            Span::dummy(),
            format!("{} cell(s) are still live", heap.len()),
        ),
    ))
}

fn run_pipeline(opts: &Opts, files: &mut Files) -> Result<()> {
    let file_id = open_src_file(opts, files)?;
    let program = crate::load(opts, files, file_id)?;
    let program = if opts.reuse {
        middle::transforms::insert_reuse(opts, &program)?
    } else {
        program
    };
    let mut heap = back::Heap::new();
    let result = back::run(&program, &mut heap, &opts.entry)?;
    println!("{}", back::render(&program, &heap, result)?);
    if opts.stats {
        eprintln!("{}", heap.stats());
    }
    if opts.check_leaks {
        check_leaks(&program, &mut heap, result)?;
    }
    Ok(())
}

fn init_env_logger() {
    env_logger::init_from_env("BEANS_LOG");
    debug!("beans v{}", VERSION);
}

fn parse_args() -> Opts {
    let opts = Opts::from_args();
    debug!("{:#?}", opts);
    opts
}

pub fn driver() {
    let start = Instant::now();
    init_env_logger();
    let opts = parse_args();
    let mut files = Files::new();
    let exit_code = match run_pipeline(&opts, &mut files) {
        Ok(_) => EXIT_SUCCESS,
        Err(diagnostic) => {
            diagnostics::emit(&opts, &files, &diagnostic);
            EXIT_FAILURE
        }
    };
    debug!(
        "evaluation completed in {}ms (exit code {})",
        start.elapsed().as_millis(),
        exit_code
    );
    process::exit(exit_code);
}
