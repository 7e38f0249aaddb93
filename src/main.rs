//! CLI entry point for cleave

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use cleave::{
    RunOptions, ScanMode, SplitConfig, locate_config, print_summary, print_summary_json, run,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Exit status for setup failures (unreadable input or configuration).
const EXIT_FATAL: i32 = 2;

/// Color output mode
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and environment
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Determine whether to use color output based on mode and environment.
fn should_use_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            // Respect NO_COLOR environment variable (https://no-color.org/)
            if std::env::var_os("NO_COLOR").is_some() {
                return false;
            }
            if std::env::var_os("FORCE_COLOR").is_some() {
                return true;
            }
            if std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false) {
                return false;
            }
            std::io::stdout().is_terminal()
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "cleave")]
#[command(about = "Split a monolithic member-function file into generated fragments")]
#[command(version)]
struct Args {
    /// Implementation file to split
    input: PathBuf,

    /// Declarations file (default: sibling with a header extension)
    #[arg(long = "declarations", value_name = "FILE")]
    declarations: Option<PathBuf>,

    /// Config file (default: cleave.toml beside the input)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Owning type whose members are split (default: input file stem)
    #[arg(long = "owner", value_name = "TYPE")]
    owner: Option<String>,

    /// Output directory, relative to the input's directory
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Method overloaded once per variant type
    #[arg(long = "dispatch-method", value_name = "NAME")]
    dispatch_method: Option<String>,

    /// Keep this function in the core file (can be used multiple times)
    #[arg(long = "core", value_name = "NAME")]
    core: Vec<String>,

    /// Route this variant key's dispatch overload to helpers (can be used multiple times)
    #[arg(long = "exclude", value_name = "KEY")]
    exclude: Vec<String>,

    /// Route this function to helpers without a warning (can be used multiple times)
    #[arg(long = "helper", value_name = "NAME")]
    helper: Vec<String>,

    /// Require each signature and its opening brace on one line
    #[arg(long = "single-line")]
    single_line: bool,

    /// How braces inside literals and comments are treated
    #[arg(long = "scan-mode", value_name = "MODE")]
    scan_mode: Option<ScanMode>,

    /// Report what would be written without touching any file
    #[arg(short = 'n', long = "dry-run")]
    dry_run: bool,

    /// Rewrite the input even when code would be lost
    #[arg(short = 'f', long = "force")]
    force: bool,

    /// Treat warnings (unrecognized shapes, default classifications) as failures
    #[arg(long = "strict")]
    strict: bool,

    /// Output the run summary as JSON
    #[arg(long = "json")]
    json: bool,

    /// Control color output: auto, always, never
    #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Only print errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    quiet: bool,
}

impl Args {
    /// Load the config file (if any) and layer the CLI flags over it.
    fn build_config(&self) -> Result<SplitConfig> {
        let mut config = match locate_config(self.config.as_deref(), &self.input) {
            Some(path) => SplitConfig::load(&path)?,
            None => SplitConfig::default(),
        };

        if let Some(owner) = &self.owner {
            config.owner_type = Some(owner.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.output_directory = dir.clone();
        }
        if let Some(method) = &self.dispatch_method {
            config.dispatch_method = method.clone();
        }
        config.core_functions.extend(self.core.iter().cloned());
        config.dispatch_exclusions.extend(self.exclude.iter().cloned());
        config.helper_functions.extend(self.helper.iter().cloned());
        if self.single_line {
            config.multiline_signatures = false;
        }
        if let Some(mode) = self.scan_mode {
            config.scan_mode = mode;
        }

        config.validate()?;
        Ok(config)
    }

    fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn try_main(args: &Args) -> Result<i32> {
    let config = args.build_config()?;
    let options = RunOptions {
        input: args.input.clone(),
        declarations: args.declarations.clone(),
        config,
        dry_run: args.dry_run,
        force: args.force,
    };

    let summary = run(&options)?;

    if args.json {
        print_summary_json(&summary, args.strict).context("error writing output")?;
    } else if !args.quiet {
        print_summary(&summary, should_use_color(args.color), args.verbose > 0)
            .context("error writing output")?;
    }

    Ok(summary.exit_code(args.strict))
}

fn main() {
    let args = Args::parse();
    init_logging(args.log_filter());

    match try_main(&args) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("cleave: {:#}", e);
            process::exit(EXIT_FATAL);
        }
    }
}
