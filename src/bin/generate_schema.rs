//! Generate JSON Schema for the .cssrem configuration format
//!
//! This binary generates a JSON Schema from the CssremConfig struct using
//! schemars, for editors that validate config files against a schema.
//!
//! Usage:
//!   cargo run --bin generate_schema > config-schema.json

use pxvw_lsp::config::CssremConfig;
use schemars::schema_for;

fn main() {
    let schema = schema_for!(CssremConfig);
    let output = serde_json::to_string_pretty(&schema).expect("Failed to serialize schema");
    println!("{}", output);
}
