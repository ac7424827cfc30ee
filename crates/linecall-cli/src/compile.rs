//! # Compile and Convert Subcommands
//!
//! - `linecall compile <schema-file> --direction in|out` prints the compiled
//!   JSON Schema, format path and default document as JSON.
//! - `linecall convert --expr <format-path> [FILE]` applies a format path to
//!   a JSON document (stdin when no file is given).

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use linecall_core::Direction;
use linecall_schema::{convert, LineSchemaCompiler, SchemaCompiler};
use serde_json::{json, Value};

/// Which side of a call the schema describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    /// Request document (outbound).
    In,
    /// Response document (inbound).
    Out,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::In => Direction::Outbound,
            DirectionArg::Out => Direction::Inbound,
        }
    }
}

/// Arguments for `linecall compile`.
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Line-schema file.
    pub file: PathBuf,

    /// Direction the schema is compiled for.
    #[arg(long, value_enum, default_value = "in")]
    pub direction: DirectionArg,
}

/// Arguments for `linecall convert`.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Format path expression, e.g. `id:int,items[].price:number`.
    #[arg(long)]
    pub expr: String,

    /// JSON document file. Reads stdin when omitted.
    pub file: Option<PathBuf>,
}

pub fn run_compile(args: &CompileArgs) -> Result<u8> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read schema: {}", args.file.display()))?;
    let report = compile_report(&text, args.direction.into())
        .with_context(|| format!("failed to compile {}", args.file.display()))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(0)
}

/// Compile `text` and collect the artifacts into one JSON document.
pub fn compile_report(text: &str, direction: Direction) -> Result<Value> {
    let compiled = LineSchemaCompiler.compile(text, direction)?;
    tracing::debug!(id = %compiled.id, %direction, "schema compiled");
    Ok(json!({
        "id": compiled.id,
        "direction": direction.as_schema_str(),
        "schema": compiled.json_schema,
        "format_path": compiled.format_path.to_string(),
        "defaults": compiled.defaults,
    }))
}

pub fn run_convert(args: &ConvertArgs) -> Result<u8> {
    let document = match &args.file {
        Some(path) => read_file(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    println!("{}", convert(&document, &args.expr)?);
    Ok(0)
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
