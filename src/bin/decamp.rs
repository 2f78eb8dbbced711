//! Command-line interface for decamp
//! Converts a DataCamp course repository into the layout of the course-starter site.
//!
//! Usage:
//!   decamp `<inrepo>` `<outdir>` [--log `<level>`] [--config `<file>`] [--dry-run]
//!
//! Writes `chapters/`, `exercises/` and `slides/` under `<outdir>`. With `--dry-run`
//! nothing is written; a JSON list of the files that would be produced is printed.

use clap::{Arg, ArgAction, ArgMatches, Command};
use decamp::decamp::{write_outputs, Course};
use decamp_config::{DecampConfig, Loader};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Optional per-repository configuration file, layered over the defaults.
const REPO_CONFIG: &str = "decamp.toml";

fn main() {
    let matches = Command::new("decamp")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert DataCamp repos to the format of ines/course-starter-python")
        .arg_required_else_help(true)
        .arg(
            Arg::new("inrepo")
                .help("Input (DataCamp) repo with chapters and slides")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("outdir")
                .help("Output directory to write subdirectories chapters/, exercises/, and slides/")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::new("log")
                .long("log")
                .help("Logging level. One of {TRACE, DEBUG, INFO, WARN, ERROR} (case-insensitive)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Additional TOML configuration file"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Convert without writing; print the files that would be written as JSON")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let inrepo = PathBuf::from(matches.get_one::<String>("inrepo").unwrap());
    let outdir = PathBuf::from(matches.get_one::<String>("outdir").unwrap());

    let config = load_config(&matches, &inrepo).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let level = config.logging.level.parse::<Level>().unwrap_or_else(|_| {
        eprintln!("Error: Invalid log level: {}", config.logging.level);
        std::process::exit(1);
    });
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::default().add_directive(LevelFilter::from_level(level).into()))
        .with_writer(std::io::stdout)
        .init();

    handle_convert_command(&config, inrepo, outdir, matches.get_flag("dry-run"));
}

fn load_config(matches: &ArgMatches, inrepo: &std::path::Path) -> Result<DecampConfig, String> {
    let mut loader = Loader::new().with_optional_file(inrepo.join(REPO_CONFIG));
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    if let Some(level) = matches.get_one::<String>("log") {
        loader = loader
            .set_override("logging.level", level.as_str())
            .map_err(|e| e.to_string())?;
    }
    loader.build().map_err(|e| e.to_string())
}

/// Convert the course, then write it or describe it
fn handle_convert_command(config: &DecampConfig, inrepo: PathBuf, outdir: PathBuf, dry_run: bool) {
    let course = Course::new(config, inrepo, outdir);
    let outputs = course.convert().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    if dry_run {
        let summary = serde_json::to_string_pretty(&outputs.summary()).unwrap_or_else(|e| {
            eprintln!("Error formatting summary: {}", e);
            std::process::exit(1);
        });
        println!("{}", summary);
        return;
    }

    if let Err(e) = write_outputs(&outputs, course.layout()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
