//! Seed Loader
//!
//! Reads listing documents from a JSON file: either a single JSON array or
//! one document per line (the `mongoexport` default).

use crate::domain::entities::Listing;
use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;

/// Load listings from `path`, in file order.
pub fn load_seed_file(path: impl AsRef<Path>) -> Result<Vec<Listing>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading seed file {}", path.display()))?;
    let listings = parse_seed(&raw).with_context(|| format!("parsing seed file {}", path.display()))?;
    tracing::info!("loaded {} listings from {}", listings.len(), path.display());
    Ok(listings)
}

fn parse_seed(raw: &str) -> Result<Vec<Listing>> {
    let trimmed = raw.trim_start();

    let values: Vec<Value> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)?
    } else {
        trimmed
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str::<Value>(line).with_context(|| format!("line {}", n + 1))
            })
            .collect::<Result<Vec<Value>>>()?
    };

    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| match Listing::from_value(value) {
            Some(listing) if listing.id().is_some() => Ok(listing),
            Some(_) => bail!("document {} has no _id", i),
            None => bail!("document {} is not a JSON object", i),
        })
        .collect()
}
