//! md2tex - convert Markdown documents to LaTeX and build them

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use mdlatex::{
    convert_file, render_file, utils::reports_to_json, DriverOptions, RenderOptions,
    RenderReport, DEFAULT_BUILD_COMMAND,
};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "md2tex")]
#[command(version)]
#[command(about = "Convert Markdown documents to LaTeX", long_about = None)]
struct Cli {
    /// Markdown files to convert
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file path (single input only; defaults to <input>.tex)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print LaTeX to stdout instead of writing files
    #[arg(long)]
    stdout: bool,

    /// Do not run the build command after writing
    #[arg(long)]
    no_build: bool,

    /// Command used to build the written .tex file
    #[arg(long, default_value = DEFAULT_BUILD_COMMAND)]
    build_cmd: String,

    /// Default author when the document has no Author directive
    #[arg(long)]
    author: Option<String>,

    /// Fixed date (YYYY-MM-DD) for documents without a Date directive
    #[arg(long)]
    today: Option<String>,

    /// Write a JSON render report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if cli.output.is_some() && cli.inputs.len() > 1 {
        eprintln!("--output can only be used with a single input file");
        std::process::exit(2);
    }

    let mut render = RenderOptions::default();
    if let Some(author) = cli.author.clone() {
        render.default_author = author;
    }
    if let Some(ref today) = cli.today {
        match chrono::NaiveDate::parse_from_str(today, "%Y-%m-%d") {
            Ok(date) => render.today = Some(date),
            Err(err) => {
                eprintln!("Invalid --today value '{}': {}", today, err);
                std::process::exit(2);
            }
        }
    }

    let options = DriverOptions {
        output: cli.output.clone(),
        build: !cli.no_build,
        build_command: cli.build_cmd.clone(),
        render,
    };

    let mut reports: Vec<RenderReport> = Vec::new();
    let mut failed = false;
    for path in &cli.inputs {
        let result = if cli.stdout {
            convert_file(path, &options.render).map(|conversion| {
                print!("{}", conversion.latex);
                RenderReport::new(path.display().to_string(), None, &conversion)
            })
        } else {
            render_file(path, &options)
        };
        match result {
            Ok(report) => {
                if let Some(ref output) = report.output {
                    eprintln!("✓ Output written to: {}", output);
                }
                for warning in &report.warnings {
                    eprintln!("Warning: {}", warning);
                }
                reports.push(report);
            }
            Err(err) => {
                eprintln!("Problem processing \"{}\": {}", path.display(), err);
                failed = true;
            }
        }
    }

    if let Some(ref report_path) = cli.report {
        let written = reports_to_json(&reports).and_then(|json| {
            fs::write(report_path, json).map_err(|err| mdlatex::ConversionError::io(report_path, err))
        });
        match written {
            Ok(()) => eprintln!("✓ Report written to: {}", report_path.display()),
            Err(err) => {
                eprintln!("{}", err);
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install mdlatex --features cli");
    eprintln!("  md2tex [OPTIONS] <INPUTS>...");
}
