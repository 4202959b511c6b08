//! Jander Compiler
//!
//! Compiles LA (Linguagem Algoritmica) programs to C.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use jander::driver::{compile_source, Outcome};

/// Jander Compiler
#[derive(Parser, Debug)]
#[command(name = "janderc")]
#[command(author = "Z1529")]
#[command(version = "0.1.0")]
#[command(about = "Jander - compiles LA programs to C")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input source file (.la)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output file for the C code or the diagnostics (stdout when omitted)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Print the outcome as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a source file to C
    Build {
        /// Input source file
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a source file for errors
    Check {
        /// Input source file
        input: PathBuf,
    },
    /// Print version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Commands::Build { input, output }) => compile_file(input, output.as_deref(), cli.json),
        Some(Commands::Check { input }) => check_file(input, cli.json),
        Some(Commands::Version) => {
            println!("janderc {}", env!("CARGO_PKG_VERSION"));
            println!("Jander - LA to C compiler");
            println!("License: Apache-2.0");
            Ok(())
        }
        None => match &cli.input {
            Some(input) => compile_file(input, cli.output.as_deref(), cli.json),
            None => bail!("no input file specified\nUsage: janderc <INPUT> [OUTPUT] or janderc build <INPUT>"),
        },
    }
}

fn compile(input: &Path) -> Result<Outcome> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let outcome = compile_source(&source)
        .with_context(|| format!("failed to compile {}", input.display()))?;
    Ok(outcome)
}

fn render(outcome: &Outcome, json: bool) -> Result<String> {
    if json {
        let mut text = serde_json::to_string_pretty(outcome)?;
        text.push('\n');
        Ok(text)
    } else {
        Ok(outcome.render())
    }
}

/// Compile a source file, writing C code or diagnostics to `output`
fn compile_file(input: &Path, output: Option<&Path>, json: bool) -> Result<()> {
    log::info!("compiling {}", input.display());
    let outcome = compile(input)?;
    let text = render(&outcome, json)?;

    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("wrote {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

/// Check a source file for errors without writing C code
fn check_file(input: &Path, json: bool) -> Result<()> {
    let outcome = compile(input)?;
    if json {
        print!("{}", render(&outcome, true)?);
    } else if outcome.is_generated() {
        println!("No errors found in {}", input.display());
    } else {
        print!("{}", outcome.render());
    }
    Ok(())
}
