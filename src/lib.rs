//! Record Mapper Library
//!
//! Command-line front end for the attribute coercer: load an attribute
//! schema, then convert JSON lines between entity and record shape.
//!
//! # Workspace Crates
//!
//! - `mapping_core` - Values, value objects and attribute schemas
//! - `coercions` - The primitive coercion registry
//! - `coercer` - Schema-compiled entity <-> record conversions
//! - `json_types` - Value <-> JSON bridge
//!
//! # CLI Usage
//!
//! ```bash
//! # Validate a schema and print the compiled field plan
//! record-mapper check --schema users.yaml
//!
//! # Records to entities (one JSON object per line)
//! record-mapper load --schema users.yaml --input records.jsonl --missing-keys null
//!
//! # Entities to records
//! cat entities.jsonl | record-mapper dump --schema users.yaml
//! ```

use anyhow::Context;
use clap::{Parser, ValueEnum};
use coercer::{Coercer, CoercerConfig, DynamicEntity, MissingKeyPolicy};
use coercions::PrimitiveCoercionRegistry;
use mapping_core::AttributeSchema;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

pub use coercer;
pub use coercions;
pub use json_types;
pub use mapping_core;

#[derive(Parser, Clone, Debug)]
pub struct SchemaOpts {
    /// Attribute schema file (YAML)
    #[arg(long, env = "RECORD_MAPPER_SCHEMA")]
    pub schema: PathBuf,
}

impl SchemaOpts {
    /// Load and validate the schema file.
    pub fn load(&self) -> anyhow::Result<AttributeSchema> {
        AttributeSchema::from_file(&self.schema)
            .with_context(|| format!("Failed to load schema from {:?}", self.schema))
    }
}

#[derive(Parser, Clone, Debug, Default)]
pub struct InputOpts {
    /// JSON lines file to read (defaults to stdin)
    #[arg(long)]
    pub input: Option<PathBuf>,
}

impl InputOpts {
    /// Open the input for line-by-line reading.
    pub fn open(&self) -> anyhow::Result<Box<dyn BufRead>> {
        match &self.input {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Failed to open input file {path:?}"))?;
                Ok(Box::new(BufReader::new(file)))
            }
            None => Ok(Box::new(BufReader::new(io::stdin()))),
        }
    }
}

/// Handling of mapped record fields that are absent from an input record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum MissingKeys {
    /// Reject the record
    #[default]
    Fail,
    /// Read the field as null
    Null,
}

impl From<MissingKeys> for MissingKeyPolicy {
    fn from(value: MissingKeys) -> Self {
        match value {
            MissingKeys::Fail => MissingKeyPolicy::Fail,
            MissingKeys::Null => MissingKeyPolicy::Null,
        }
    }
}

/// Build a coercer over [`DynamicEntity`] with the standard registry.
pub fn build_coercer(
    schema: &AttributeSchema,
    missing_keys: MissingKeys,
) -> anyhow::Result<Coercer<DynamicEntity>> {
    let config = CoercerConfig::new().with_missing_keys(missing_keys.into());
    Coercer::with_config(schema, &PrimitiveCoercionRegistry::standard(), config)
        .with_context(|| format!("Failed to compile schema for collection '{}'", schema.collection))
}

/// Write the compiled field plan of `schema`.
pub fn check<W: Write>(schema: &AttributeSchema, mut out: W) -> anyhow::Result<()> {
    let coercer = build_coercer(schema, MissingKeys::default())?;

    writeln!(
        out,
        "collection {} (entity {}, identity {})",
        schema.collection, schema.entity, schema.identity
    )?;
    let identity = coercer.identity().entity_field();
    for field in coercer.fields() {
        let marker = if field.entity_field() == identity {
            ", identity"
        } else {
            ""
        };
        writeln!(
            out,
            "  {} -> {} : {} [{}{}]",
            field.entity_field(),
            field.record_field(),
            field.type_name(),
            field.kind(),
            marker
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Convert JSON records into entities, one per line.
///
/// Returns the number of converted lines. Blank lines are skipped.
pub fn load<R: BufRead, W: Write>(
    coercer: &Coercer<DynamicEntity>,
    input: R,
    mut out: W,
) -> anyhow::Result<usize> {
    let count = for_each_line(input, |line_no, line| {
        let record = json_types::parse_jsonl_line(line)
            .with_context(|| format!("line {line_no}: failed to parse record"))?;
        let entity = coercer
            .from_record(&record)
            .with_context(|| format!("line {line_no}: failed to convert record"))?;
        out.write_all(json_types::record_to_jsonl(entity.attributes())?.as_bytes())?;
        Ok(())
    })?;
    out.flush()?;

    tracing::info!(collection = %coercer.collection(), count, "Loaded records");
    Ok(count)
}

/// Convert JSON entities into records, one per line.
///
/// Returns the number of converted lines. Blank lines are skipped.
pub fn dump<R: BufRead, W: Write>(
    coercer: &Coercer<DynamicEntity>,
    input: R,
    mut out: W,
) -> anyhow::Result<usize> {
    let count = for_each_line(input, |line_no, line| {
        let attributes = json_types::parse_jsonl_line(line)
            .with_context(|| format!("line {line_no}: failed to parse entity"))?;
        let record = coercer
            .to_record(&DynamicEntity::from(attributes))
            .with_context(|| format!("line {line_no}: failed to convert entity"))?;
        out.write_all(json_types::record_to_jsonl(&record)?.as_bytes())?;
        Ok(())
    })?;
    out.flush()?;

    tracing::info!(collection = %coercer.collection(), count, "Dumped records");
    Ok(count)
}

fn for_each_line<R, F>(input: R, mut handle: F) -> anyhow::Result<usize>
where
    R: BufRead,
    F: FnMut(usize, &str) -> anyhow::Result<()>,
{
    let mut count = 0;
    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("line {line_no}: failed to read input"))?;
        if line.trim().is_empty() {
            continue;
        }
        handle(line_no, &line)?;
        count += 1;
    }
    Ok(count)
}
