use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "form-lifecycle")]
#[command(about = "Drive a declarative form against a JSON resource file")]
#[command(long_about = "Loads a resource through the form lifecycle machine, applies edits, \
                       validates them against a TOML schema and saves or deletes the resource. \
                       Every command prints the resulting form state as JSON.")]
pub struct Cli {
    /// Settings file overriding form-lifecycle.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Schema and resource every command operates on
#[derive(clap::Args, Debug, Clone)]
pub struct FormTarget {
    /// TOML file describing the form fields
    #[arg(long)]
    pub schema: PathBuf,
    /// JSON file holding the resource values
    #[arg(long)]
    pub resource: PathBuf,
    /// Sub-types the resource may switch to (all schema variants when omitted)
    #[arg(long = "offer", value_name = "TYPE", value_delimiter = ',')]
    pub offered_types: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the resource and report validation errors without saving
    Check {
        #[command(flatten)]
        target: FormTarget,
    },
    /// Apply field edits and save the resource
    Edit {
        #[command(flatten)]
        target: FormTarget,
        /// Sub-type to select before applying edits
        #[arg(long = "type", value_name = "TYPE")]
        selected_type: Option<String>,
        /// Field assignment, e.g. --set port=8080 (values parse as JSON when possible)
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
        assignments: Vec<(String, serde_json::Value)>,
    },
    /// Delete the resource through the confirmation sub-flow
    Delete {
        #[command(flatten)]
        target: FormTarget,
        /// Confirm the deletion
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

/// Parses `field=value`, reading the value as JSON and falling back to a string
pub fn parse_assignment(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{raw}'"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((field.to_string(), value))
}
