//! Command-line interface for record-mapper
//!
//! # Usage Examples
//!
//! ## Schema check
//! ```bash
//! record-mapper check --schema users.yaml
//! ```
//!
//! ## Conversions
//! ```bash
//! # Records (storage shape) to entities
//! record-mapper load --schema users.yaml --input records.jsonl
//!
//! # Tolerate records that lack mapped fields
//! record-mapper load --schema users.yaml --missing-keys null < records.jsonl
//!
//! # Entities to records; unsaved entities get no identity key
//! record-mapper dump --schema users.yaml --input entities.jsonl
//! ```
//!
//! Set `RUST_LOG=debug` to log the compiled coercer.

use clap::{Parser, Subcommand};
use record_mapper::{InputOpts, MissingKeys, SchemaOpts};
use std::io;

#[derive(Parser)]
#[command(name = "record-mapper")]
#[command(about = "Convert records to entities and back through an attribute schema")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a schema and print its compiled field plan
    Check {
        #[command(flatten)]
        schema: SchemaOpts,
    },

    /// Convert JSON records into entities
    Load {
        #[command(flatten)]
        schema: SchemaOpts,

        #[command(flatten)]
        input: InputOpts,

        /// Handling of mapped fields absent from a record
        #[arg(long, value_enum, default_value_t = MissingKeys::Fail)]
        missing_keys: MissingKeys,
    },

    /// Convert JSON entities into records
    Dump {
        #[command(flatten)]
        schema: SchemaOpts,

        #[command(flatten)]
        input: InputOpts,
    },
}

fn main() -> anyhow::Result<()> {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { schema } => {
            let schema = schema.load()?;
            record_mapper::check(&schema, io::stdout().lock())?;
        }
        Commands::Load {
            schema,
            input,
            missing_keys,
        } => {
            let schema = schema.load()?;
            let coercer = record_mapper::build_coercer(&schema, missing_keys)?;
            record_mapper::load(&coercer, input.open()?, io::stdout().lock())?;
        }
        Commands::Dump { schema, input } => {
            let schema = schema.load()?;
            let coercer = record_mapper::build_coercer(&schema, MissingKeys::default())?;
            record_mapper::dump(&coercer, input.open()?, io::stdout().lock())?;
        }
    }

    Ok(())
}
