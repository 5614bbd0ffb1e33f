//! ermine CLI - mapper generation and configuration inspection.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ermine_core::json::to_json_pretty;
use ermine_core::{Config, Database, ModelTraitGenerator, Router};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ermine")]
#[command(about = "Ermine micro-framework tooling")]
#[command(version)]
struct Cli {
    /// Configuration files (.ini or .json), merged in order
    #[arg(short, long = "config", global = true)]
    configs: Vec<PathBuf>,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info", global = true)]
    verbosity: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate `<table>_mapper_trait.rs` units from the database catalog
    Generate {
        /// Output directory
        #[arg(short, long)]
        destination: PathBuf,

        /// Schema to read instead of the configured one
        #[arg(long)]
        schema: Option<String>,

        /// Database URL instead of the configured one
        #[arg(long)]
        database_url: Option<String>,

        /// Module path the units are mounted at
        #[arg(long, default_value = "crate::models")]
        module_path: String,

        /// Path of the ermine-core crate in generated code
        #[arg(long, default_value = "ermine_core")]
        crate_path: String,

        /// Table to leave out (repeatable)
        #[arg(long = "skip-table")]
        skip_tables: Vec<String>,

        /// Column to leave out, `column` or `table.column` (repeatable)
        #[arg(long = "skip-column")]
        skip_columns: Vec<String>,
    },

    /// Print the merged configuration, or one dotted key of it
    Config {
        /// Dotted key, e.g. `MySql.host`
        key: Option<String>,
    },

    /// List the configured routes
    Routes,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.verbosity, cli.log_format);

    let config = load_config(&cli.configs).await?;

    match cli.command {
        Command::Generate {
            destination,
            schema,
            database_url,
            module_path,
            crate_path,
            skip_tables,
            skip_columns,
        } => {
            let schema = match schema {
                Some(schema) => schema,
                None => config.schema().context("no schema to generate")?,
            };
            let db = match database_url {
                Some(url) => Database::new(url, Some(1))?,
                None => Database::from_config(&config).context("no database configured")?,
            };

            let written = ModelTraitGenerator::new(schema, module_path, destination)
                .skip_tables(skip_tables)
                .skip_columns(skip_columns)
                .crate_path(crate_path)
                .generate(&db)
                .await?;

            for path in written {
                println!("{}", path.display());
            }
        }
        Command::Config { key } => {
            let value = match key.as_deref() {
                Some(key) => config
                    .get(key)
                    .with_context(|| format!("no configuration key {key}"))?,
                None => config.as_value(),
            };
            println!("{}", to_json_pretty(value)?);
        }
        Command::Routes => {
            let router = Router::from_config(&config.routes()?)?;
            for route in router.routes() {
                println!(
                    "{:<7} {:<32} {} ({})",
                    route.method.to_string(),
                    route.path_pattern,
                    route.controller,
                    route.view
                );
            }
        }
    }

    Ok(())
}

async fn load_config(paths: &[PathBuf]) -> Result<Config> {
    let mut config = Config::new();
    for path in paths {
        config
            .load_file(path)
            .await
            .with_context(|| format!("failed to load {}", path.display()))?;
    }
    info!(files = paths.len(), "Configuration loaded");
    Ok(config)
}

fn setup_logging(verbosity: &str, format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }
}
