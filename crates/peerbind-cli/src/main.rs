use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use peerbind_config::{ProjectConfig, CONFIG_FILE};
use peerbind_driver::{Build, Driver, Include};
use peerbind_parser::InfoMap;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "peerbind")]
#[command(author, version, about = "Parse C/C++ headers into peer-class declarations")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse headers and print the declaration text
    Parse {
        #[command(flatten)]
        input: Input,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse headers and report warnings without printing output
    Check {
        #[command(flatten)]
        input: Input,
    },

    /// Print the declaration records of a build
    Dump {
        #[command(flatten)]
        input: Input,

        /// Output format
        #[arg(long, default_value = "json")]
        format: DumpFormat,
    },
}

/// Where the headers and rules come from.
#[derive(Args)]
struct Input {
    /// Headers to parse; overrides the includes of the project file
    headers: Vec<String>,

    /// Project file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Additional include search directories
    #[arg(short = 'I', long = "include-path")]
    include_paths: Vec<PathBuf>,

    /// Parse the listed headers as C
    #[arg(long)]
    as_c: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum DumpFormat {
    /// Declaration records as JSON
    Json,
    /// One line per declaration: kind, signature, text
    Text,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_env("PEERBIND_LOG").unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

/// Loads the project file (explicit, or `peerbind.toml` in the current
/// directory when no headers are given) and runs the build.
fn run(input: &Input) -> Result<Build> {
    let config_path = input
        .config
        .clone()
        .or_else(|| input.headers.is_empty().then(|| PathBuf::from(CONFIG_FILE)));
    let config = config_path.as_deref().map(ProjectConfig::from_file).transpose()?;

    let (driver, mut includes) = match &config {
        Some(config) => (Driver::from_config(config)?, Driver::includes(config)),
        None => (Driver::new(InfoMap::new()), Vec::new()),
    };
    if !input.headers.is_empty() {
        includes = input
            .headers
            .iter()
            .map(|h| if input.as_c { Include::c(h.as_str()) } else { Include::cpp(h.as_str()) })
            .collect();
    }
    let mut search_path = input.include_paths.clone();
    if let Some(config) = &config {
        search_path.extend(config.search_path());
    }
    let mut driver = driver.with_search_path(search_path);
    driver.build(&includes)
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Parse { input, output } => {
            let build = run(&input)?;
            for warning in &build.warnings {
                eprintln!("warning: {warning}");
            }
            let text = build.text();
            if let Some(ref output_path) = output {
                std::fs::write(output_path, &text)
                    .map_err(|e| miette::miette!("Failed to write {}: {}", output_path.display(), e))?;
                println!("Wrote {} declarations to {}", build.declarations.len(), output_path.display());
            } else {
                print!("{text}");
            }
        }

        Commands::Check { input } => {
            let build = run(&input)?;
            for warning in &build.warnings {
                eprintln!("warning: {warning}");
            }
            for file in &build.files {
                println!("{}: OK", file.display());
            }
            println!(
                "{} declarations, {} warnings",
                build.declarations.len(),
                build.warnings.len()
            );
        }

        Commands::Dump { input, format } => {
            let build = run(&input)?;
            match format {
                DumpFormat::Json => {
                    let json = serde_json::to_string_pretty(&build).into_diagnostic()?;
                    println!("{json}");
                }
                DumpFormat::Text => {
                    for decl in &build.declarations {
                        let kind = if decl.function {
                            "function"
                        } else if decl.variable {
                            "variable"
                        } else if decl.comment {
                            "comment"
                        } else if decl.ty.is_some() {
                            "type"
                        } else {
                            "text"
                        };
                        println!("{kind:<9} {:<40} {}", decl.signature, decl.text.trim().replace('\n', " "));
                    }
                }
            }
        }
    }

    Ok(())
}
