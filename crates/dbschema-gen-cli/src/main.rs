//! dbschema-gen CLI - generate schema documents from database catalogs.

use clap::{Parser, Subcommand, ValueEnum};
use dbschema_gen::{Config, GenError, Orchestrator};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dbschema-gen")]
#[command(about = "Generate IDL and builder schema documents from MySQL/PostgreSQL catalogs")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Log verbosity for dbschema-gen itself; RUST_LOG overrides it
    #[arg(long, value_enum, default_value_t = Verbosity::Info)]
    verbosity: Verbosity,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum Verbosity {
    Debug,
    Info,
    Warn,
    Error,
}

impl Verbosity {
    fn as_str(self) -> &'static str {
        match self {
            Verbosity::Debug => "debug",
            Verbosity::Info => "info",
            Verbosity::Warn => "warn",
            Verbosity::Error => "error",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the configured documents
    Generate {
        /// Print documents to stdout instead of writing files
        #[arg(long)]
        dry_run: bool,

        /// Keep only these tables (overrides the configured filter)
        #[arg(long, value_delimiter = ',')]
        include: Option<Vec<String>>,

        /// Drop these tables (overrides the configured filter)
        #[arg(long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,
    },

    /// Load the catalog and report what would be generated
    Validate,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), GenError> {
    let cli = Cli::parse();

    setup_logging(cli.verbosity, cli.log_format);

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Generate {
            dry_run,
            include,
            exclude,
        } => {
            // Apply overrides
            if include.is_some() || exclude.is_some() {
                config.filter.include = include;
                config.filter.exclude = exclude;
                config.validate()?;
            }

            let orchestrator = Orchestrator::new(config);

            if dry_run {
                let schema = orchestrator.load_schema().await?;
                let rendered = orchestrator.render(&schema)?;
                if let Some(idl) = rendered.idl {
                    println!("{}", idl);
                }
                if let Some(dsl) = rendered.dsl {
                    println!("{}", dsl);
                }
                return Ok(());
            }

            let result = orchestrator.run().await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!("\nGeneration completed!");
                println!("  Engine: {}", result.engine);
                println!("  Duration: {:.2}s", result.duration_seconds);
                println!("  Models: {}", result.models);
                println!("  Enums: {}", result.enums);
                for path in &result.written {
                    println!("  Wrote: {}", path.display());
                }
                if !result.tables_without_key.is_empty() {
                    println!("  Tables without primary key: {:?}", result.tables_without_key);
                }
            }
        }

        Commands::Validate => {
            let orchestrator = Orchestrator::new(config);
            let schema = orchestrator.load_schema().await?;
            orchestrator.render(&schema)?;

            let without_key: Vec<&str> = schema
                .models()
                .filter(|m| !m.has_primary_key())
                .map(|m| m.table.as_str())
                .collect();

            println!("Catalog OK");
            println!("  Engine: {}", schema.engine());
            println!("  Models: {}", schema.len());
            println!("  Enums: {}", schema.enums().len());
            if !without_key.is_empty() {
                println!("  Tables without primary key: {:?}", without_key);
            }
        }
    }

    Ok(())
}

/// Log to stderr so documents printed by `--dry-run` stay clean.
///
/// Dependencies only report warnings unless `RUST_LOG` says otherwise.
fn setup_logging(verbosity: Verbosity, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,dbschema_gen={}", verbosity.as_str())));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }
}
