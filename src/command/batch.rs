//! Batch annotation of a directory of FASTA files.

use std::{
    cmp::max,
    path::{Path, PathBuf},
    time::Instant,
};
use colored::Colorize;
use const_format::str_repeat;
use crate::{
    Error,
    err::validate_param,
    emapper::{self, SearchParams, AnnotParams, SysRunner},
    ext,
};

/// Directories of the pathogen proteome analysis, used when no arguments are given.
const DEF_INPUT_DIR: &'static str =
    "/home/anshu/upasana/Mitoinfect/Orthologs/eggnog-mapper/13BPP_Pathogen_EvoAnalysis/fasta";
const DEF_OUTPUT_DIR: &'static str =
    "/home/anshu/upasana/Mitoinfect/Orthologs/eggnog-mapper/13BPP_Pathogen_EvoAnalysis/eggnog_output";

struct Args {
    input_dir: PathBuf,
    output_dir: Option<PathBuf>,
    search: SearchParams,
    annot: AnnotParams,
    emapper: PathBuf,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEF_INPUT_DIR),
            output_dir: Some(PathBuf::from(DEF_OUTPUT_DIR)),
            search: SearchParams::default(),
            annot: AnnotParams::default(),
            emapper: PathBuf::from("emapper.py"),
        }
    }
}

pub(super) fn print_help() {
    const KEY: usize = 18;
    const VAL: usize = 5;
    const EMPTY: &'static str = str_repeat!(" ", KEY + VAL + 5);

    let defaults = Args::default();
    println!("{}", "Annotate a directory of FASTA files with eggNOG-mapper.".yellow());

    println!("\n{} {} [arguments]", "Usage:".bold(), env!("CARGO_PKG_NAME"));
    println!("{EMPTY}Without arguments, the built-in directories are processed.");

    println!("\n{}", "Input/output arguments:".bold());
    println!("    {:KEY$} {:VAL$}  Directory with input FASTA files (*.fasta, *.faa, *.fa).\n\
        {EMPTY}  Defaults to: {}.",
        "-i, --input".green(), "DIR".yellow(), ext::fmt::path(&defaults.input_dir));
    println!("    {:KEY$} {:VAL$}  Output directory, created if missing.\n\
        {EMPTY}  Defaults to: {}.",
        "-o, --output".green(), "DIR".yellow(), ext::fmt::path(Path::new(DEF_OUTPUT_DIR)));
    println!("    {:KEY$} {:VAL$}  Diamond database with eggNOG reference proteins.",
        "-d, --db".green(), "FILE".yellow());

    println!("\n{}", "Search parameters:".bold());
    println!("    {:KEY$} {:VAL$}  Diamond sensitivity mode [{}].",
        "-s, --sensmode".green(), "STR".yellow(), defaults.search.sensmode);
    println!("    {:KEY$} {:VAL$}  Minimal percent identity of hits [{}].",
        "    --pident".green(), "FLOAT".yellow(), defaults.search.min_pident);
    println!("    {:KEY$} {:VAL$}  Minimal query coverage of hits [{}].",
        "    --query-cover".green(), "FLOAT".yellow(), defaults.search.min_query_cover);
    println!("    {:KEY$} {:VAL$}  Maximal e-value of hits [{}].",
        "    --evalue".green(), "FLOAT".yellow(), defaults.search.max_evalue);
    println!("    {:KEY$} {:VAL$}  Target taxa and taxonomic scope of the annotation [{}].",
        "-t, --taxa".green(), "INT".yellow(), defaults.annot.taxon);

    println!("\n{}", "Execution parameters:".bold());
    println!("    {:KEY$} {:VAL$}  Number of emapper workers [{}].",
        "-@, --cpu".green(), "INT".yellow(), defaults.search.cpu);
    println!("    {:KEY$} {:VAL$}  emapper.py executable [{}].",
        "    --emapper".green(), "EXE".yellow(), defaults.emapper.display());

    println!("\n{}", "Other parameters:".bold());
    println!("    {:KEY$} {:VAL$}  Show this help message.", "-h, --help".green(), "");
    println!("    {:KEY$} {:VAL$}  Show version.", "-V, --version".green(), "");
}

fn parse_args(argv: &[String]) -> Result<Args, lexopt::Error> {
    use lexopt::prelude::*;
    let mut args = Args::default();
    let mut parser = lexopt::Parser::from_args(argv);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('i') | Long("input") => args.input_dir = parser.value()?.parse()?,
            Short('o') | Long("output") => args.output_dir = Some(parser.value()?.parse()?),
            Short('d') | Long("db") => args.search.db = parser.value()?.parse()?,

            Short('s') | Long("sensmode") => args.search.sensmode = parser.value()?.parse()?,
            Long("pident") => args.search.min_pident = parser.value()?.parse()?,
            Long("query-cover") | Long("query_cover") => args.search.min_query_cover = parser.value()?.parse()?,
            Long("evalue") => args.search.max_evalue = parser.value()?.parse()?,
            Short('t') | Long("taxa") => args.annot.taxon = parser.value()?.parse()?,

            Short('@') | Long("cpu") | Long("threads") => args.search.cpu = parser.value()?.parse()?,
            Long("emapper") => args.emapper = parser.value()?.parse()?,

            Short('V') | Long("version") => {
                super::print_version();
                std::process::exit(0);
            }
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            _ => Err(arg.unexpected())?,
        }
    }
    Ok(args)
}

fn process_args(mut args: Args) -> Result<Args, Error> {
    validate_param!(0.0 <= args.search.min_pident && args.search.min_pident <= 100.0,
        "Percent identity ({}) must be within [0, 100]", args.search.min_pident);
    validate_param!(0.0 <= args.search.min_query_cover && args.search.min_query_cover <= 100.0,
        "Query coverage ({}) must be within [0, 100]", args.search.min_query_cover);
    validate_param!(args.search.max_evalue > 0.0,
        "E-value threshold ({}) must be positive", args.search.max_evalue);
    args.search.cpu = max(args.search.cpu, 1);
    args.emapper = ext::sys::find_exe(&args.emapper)?;
    Ok(args)
}

pub(super) fn run(argv: &[String]) -> Result<(), Error> {
    let args = process_args(parse_args(argv)?)?;

    let files = ext::sys::sequence_files(&args.input_dir)?;
    if files.is_empty() {
        log::warn!("No FASTA files found in {}!", ext::fmt::path(&args.input_dir));
        return Ok(());
    }
    log::info!("Found {} FASTA files to process", files.len());

    let mut runner = SysRunner;
    let mut failed = 0_usize;
    for file in files.iter() {
        let timer = Instant::now();
        let success = emapper::process_file(&mut runner, &args.emapper, file,
            args.output_dir.as_deref(), &args.search, &args.annot)?;
        if success {
            log::info!("Successfully processed {} in {}",
                ext::fmt::path(file), ext::fmt::Duration(timer.elapsed()));
        } else {
            failed += 1;
            log::error!("Failed to process {}", ext::fmt::path(file));
        }
    }
    // Failed files do not change the exit code, the batch always runs to the end.
    if failed > 0 {
        log::warn!("{} of {} files failed", failed, files.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn to_argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn default_arguments() {
        let args = parse_args(&[]).unwrap();
        assert_eq!(args.input_dir, Path::new(DEF_INPUT_DIR));
        assert_eq!(args.output_dir.as_deref(), Some(Path::new(DEF_OUTPUT_DIR)));
        assert_eq!(args.search.sensmode, "more-sensitive");
        assert_eq!(args.search.min_pident, 80.0);
        assert_eq!(args.search.min_query_cover, 90.0);
        assert_eq!(args.search.max_evalue, 1e-4);
        assert_eq!(args.search.cpu, 16);
        assert_eq!(args.annot.taxon, 2);
        assert_eq!(args.emapper, Path::new("emapper.py"));
    }

    #[test]
    fn overriding_arguments() {
        let argv = to_argv(&["-i", "/data/in", "-o", "/data/out", "-d", "/data/bacteria.dmnd",
            "--pident", "85.5", "--evalue", "1e-6", "-t", "1224", "-@", "8"]);
        let args = parse_args(&argv).unwrap();
        assert_eq!(args.input_dir, Path::new("/data/in"));
        assert_eq!(args.output_dir.as_deref(), Some(Path::new("/data/out")));
        assert_eq!(args.search.db, Path::new("/data/bacteria.dmnd"));
        assert_eq!(args.search.min_pident, 85.5);
        assert_eq!(args.search.max_evalue, 1e-6);
        assert_eq!(args.annot.taxon, 1224);
        assert_eq!(args.search.cpu, 8);
    }

    #[test]
    fn unknown_arguments_are_rejected() {
        assert!(parse_args(&to_argv(&["--frobnicate"])).is_err());
        assert!(parse_args(&to_argv(&["positional"])).is_err());
    }

    #[test]
    fn thresholds_are_validated() {
        let args = parse_args(&to_argv(&["--pident", "150"])).unwrap();
        assert!(matches!(process_args(args), Err(Error::InvalidInput(_))));
        let args = parse_args(&to_argv(&["--query-cover", "-5"])).unwrap();
        assert!(matches!(process_args(args), Err(Error::InvalidInput(_))));
        let args = parse_args(&to_argv(&["--evalue", "0"])).unwrap();
        assert!(matches!(process_args(args), Err(Error::InvalidInput(_))));
    }
}
