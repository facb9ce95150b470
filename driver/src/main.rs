// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

mod config;

use std::{path::{Path, PathBuf}, process::exit};

use anyhow::Context;
use clap::Subcommand;
use colored::Colorize;
use kiezel_compiler::{select_instructions, FunctionDescription, ScheduleCoverOracle};
use kiezel_regexp::{parse_regexp, RegExpFlags, StdUnicodeOracle};
use log::{debug, info, LevelFilter};

use self::config::ConfigRoot;

#[derive(clap::Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file, `kiezel.toml` when omitted and present.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        use clap::Parser;
        Self::parse()
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a regular expression and print its tree.
    Regexp {
        pattern: String,

        /// Any of `gimsuy`.
        #[arg(short, long, default_value = "")]
        flags: String,
    },

    /// Select MIPS32 instructions for a function description.
    Select {
        file: PathBuf,
    },
}

fn main() {
    let args = Args::parse_args();

    if let Err(e) = run(args) {
        eprintln!("{}: {}", "fout".red().bold(), format!("{e:#}").bold());
        exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = ConfigRoot::load(args.config.as_deref())?;
    initialize_logger(config.log.debug || args.verbose);

    match args.command {
        Commands::Regexp { pattern, flags } => run_regexp(&config, &pattern, &flags),
        Commands::Select { file } => run_select(&config, &file),
    }
}

fn initialize_logger(debug: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();

    info!("Logger is ingesteld");
}

fn run_regexp(config: &ConfigRoot, pattern: &str, flags: &str) -> anyhow::Result<()> {
    let flags: RegExpFlags = flags.parse()?;
    let input: Vec<u16> = pattern.encode_utf16().collect();

    let data = parse_regexp(&input, flags, &config.regexp, &StdUnicodeOracle)
        .with_context(|| format!("Ongeldige reguliere expressie /{pattern}/"))?;

    println!("{}", data.tree);
    println!("{} {}", "vangsten:".bold(), data.capture_count);
    println!("{} {}", "eenvoudig:".bold(), yes_no(data.simple));
    println!("{} {}", "anker:".bold(), yes_no(data.contains_anchor));

    Ok(())
}

fn run_select(config: &ConfigRoot, path: &Path) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Kon `{}` niet lezen", path.display()))?;

    let description = FunctionDescription::from_toml(&source)?;
    let (graph, schedule) = description.build()?;
    debug!("Functie met {} knopen en {} blokken ingelezen", graph.len(), schedule.blocks().len());

    let cover = ScheduleCoverOracle::new(&graph, &schedule);
    let sequence = select_instructions(&graph, &schedule, &cover, &config.selector)
        .with_context(|| format!("Instructieselectie voor `{}` mislukt", path.display()))?;

    print!("{sequence}");
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value { "ja" } else { "nee" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, Parser};
    use rstest::rstest;

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[rstest]
    #[case(&["kiezel", "regexp", "a|b"], "a|b", "")]
    #[case(&["kiezel", "regexp", "--flags", "gi", "(a)"], "(a)", "gi")]
    #[case(&["kiezel", "regexp", "-f", "u", "[a-z]+"], "[a-z]+", "u")]
    fn regexp_arguments(#[case] argv: &[&str], #[case] expected_pattern: &str, #[case] expected_flags: &str) {
        let args = Args::try_parse_from(argv).unwrap();
        let Commands::Regexp { pattern, flags } = args.command else {
            panic!("verwachtte het `regexp`-commando");
        };
        assert_eq!(pattern, expected_pattern);
        assert_eq!(flags, expected_flags);
    }

    #[test]
    fn global_options_follow_the_subcommand() {
        let args = Args::try_parse_from(["kiezel", "select", "f.toml", "--verbose", "--config", "k.toml"]).unwrap();
        assert!(args.verbose);
        assert_eq!(args.config.as_deref(), Some(Path::new("k.toml")));
        assert!(matches!(args.command, Commands::Select { file } if file.as_path() == Path::new("f.toml")));
    }

    #[test]
    fn invalid_flags_are_rejected() {
        let result = run_regexp(&ConfigRoot::default(), "a", "gg");
        assert!(result.is_err());
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let error = run_regexp(&ConfigRoot::default(), "(a", "").unwrap_err();
        assert_eq!(format!("{error:#}"), "Ongeldige reguliere expressie /(a/: Unterminated group");
    }

    #[test]
    fn selects_demo_function() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../demos/multiply-by-three.toml");
        assert!(run_select(&ConfigRoot::default(), &path).is_ok());
    }
}
