use codespan_reporting::term::ColorArg;

use structopt::StructOpt;

use std::path::PathBuf;

#[derive(StructOpt, Debug)]
#[structopt(name = "beans")]
pub struct Opts {
    #[structopt(short = "c", long, parse(from_os_str))]
    pub src: PathBuf,
    /// Name of the zero-parameter function to evaluate
    #[structopt(long, default_value = "main")]
    pub entry: String,
    /// Insert explicit drop, reset and reuse operations before evaluating
    #[structopt(long)]
    pub reuse: bool,
    /// Report heap counters on stderr after evaluation
    #[structopt(long)]
    pub stats: bool,
    /// Drop the result and fail unless the heap is left empty
    #[structopt(long = "check-leaks")]
    pub check_leaks: bool,
    #[structopt(long = "dump-trees")]
    pub dump_trees: bool,
    #[structopt(long = "pretty-print")]
    pub pretty_print: bool,
    #[structopt(long = "dump-ir")]
    pub dump_ir: bool,
    #[structopt(
        long = "color",
        parse(try_from_str),
        default_value = "auto",
        possible_values = ColorArg::VARIANTS,
        case_insensitive = true
    )]
    pub color: ColorArg,
}

impl Opts {
    pub fn src_file_name(&self) -> &str {
        self.src.to_str().unwrap_or("[FATAL]")
    }
}
