use anyhow::{bail, Context, Result};
use archproof_core::{SpecDocument, VerificationResult};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "archproof")]
#[command(about = "ArchProof - microservice architecture conformance verification", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract routes from implementation sources into a route document
    Extract {
        /// Source files to scan
        #[arg(long, num_args = 1..)]
        files: Vec<PathBuf>,

        /// Directory to scan recursively
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Output path for the route document
        #[arg(long, default_value = "routes.json")]
        output: PathBuf,
    },

    /// Verify a route document against an architecture specification
    Verify {
        /// Path to the specification document (JSON)
        #[arg(long)]
        specs: PathBuf,

        /// Path to the extracted route document (JSON)
        #[arg(long)]
        routes: PathBuf,

        /// Output path for the verification result
        #[arg(long, default_value = "verification_result.json")]
        output: PathBuf,
    },

    /// Extract and verify in one pass
    Check {
        /// Path to the specification document (JSON)
        #[arg(long)]
        specs: PathBuf,

        /// Source files to scan
        #[arg(long, num_args = 1..)]
        files: Vec<PathBuf>,

        /// Directory to scan recursively
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Output path for the verification result
        #[arg(long, default_value = "verification_result.json")]
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Extract { files, dir, output } => {
            let paths = gather_inputs(files, dir)?;
            let document = archproof_extract::scan_files(&paths);
            write_json(&output, &document)?;
            println!(
                "Parsed {} routes from {} service(s).",
                document.metadata.total_routes, document.metadata.total_services
            );
            println!("Output saved to: {}", output.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Verify {
            specs,
            routes,
            output,
        } => {
            let result = archproof_verify::verify_files(&specs, &routes);
            finish_verification(&result, &output)
        }
        Commands::Check {
            specs,
            files,
            dir,
            output,
        } => {
            let paths = gather_inputs(files, dir)?;
            let implementation = archproof_extract::scan_files(&paths);
            let result = match SpecDocument::load(&specs) {
                Ok(spec) => archproof_verify::verify(&spec, &implementation),
                Err(e) => VerificationResult::unsatisfiable(vec![format!(
                    "Failed to load input files: {}",
                    e
                )]),
            };
            finish_verification(&result, &output)
        }
    }
}

fn gather_inputs(files: Vec<PathBuf>, dir: Option<PathBuf>) -> Result<Vec<PathBuf>> {
    let mut paths = files;
    if let Some(dir) = dir {
        paths.extend(archproof_extract::collect_source_files(&dir)?);
    }
    if paths.is_empty() {
        bail!("no input files: pass --files and/or --dir");
    }
    Ok(paths)
}

fn finish_verification(result: &VerificationResult, output: &Path) -> Result<ExitCode> {
    write_json(output, result)?;
    render_report(result, output);
    if result.is_satisfiable {
        Ok(ExitCode::SUCCESS)
    } else {
        // Distinct exit code so scripted callers can branch on conformance.
        Ok(ExitCode::from(2))
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    std::fs::write(path, rendered)
        .with_context(|| format!("writing {}", path.display()))
}

fn render_report(result: &VerificationResult, output: &Path) {
    println!();
    println!("{}", "=".repeat(50));
    println!("      ArchProof Verification Report");
    println!("{}", "=".repeat(50));

    if result.is_clean() {
        println!(
            "\n{}",
            "SUCCESS: The implementation perfectly matches the specification!".green()
        );
    }

    if result.is_satisfiable {
        println!("\n[STATUS] {}", "SATISFIABLE".green().bold());
        println!("  The implemented architecture is consistent with the formal policies.");
    } else {
        println!("\n[STATUS] {}", "UNSATISFIABLE".red().bold());
        println!("  The implemented architecture violates the formal policies or is architecturally unsound.");
    }

    if !result.errors.is_empty() {
        println!("\n{}", "--- ERRORS (Must Fix) ---".red());
        for error in &result.errors {
            println!("  - {}", error);
        }
    }

    if !result.suggestions.is_empty() {
        println!("\n{}", "--- SUGGESTIONS (To match spec) ---".cyan());
        for suggestion in &result.suggestions {
            println!("  - {}", suggestion);
        }
    }

    if !result.warnings.is_empty() {
        println!("\n{}", "--- WARNINGS (Best Practices) ---".yellow());
        for warning in &result.warnings {
            println!("  - {}", warning);
        }
    }

    println!("\nFull JSON report saved to {}\n", output.display());
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
