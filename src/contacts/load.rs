use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use super::record::ContactRecord;

pub fn load_records(path: &Path) -> Result<Vec<ContactRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read contact records from {}", path.display()))?;
    parse_records(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Accepts either a bare array of records or an object with a `contacts` array.
pub fn parse_records(raw: &str) -> Result<Vec<ContactRecord>> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in contact records")?;
    let list = match parsed {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("contacts") {
            Some(Value::Array(items)) => items,
            _ => return Err(anyhow!("expected a `contacts` array in the records object")),
        },
        _ => return Err(anyhow!("unexpected JSON type for contact records")),
    };

    let mut records = Vec::with_capacity(list.len());
    for (index, value) in list.into_iter().enumerate() {
        let record: ContactRecord = serde_json::from_value(value)
            .with_context(|| format!("invalid contact record at index {index}"))?;
        records.push(record);
    }

    tracing::debug!(count = records.len(), "parsed contact records");
    Ok(records)
}
