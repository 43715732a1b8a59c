use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use super::model::{Dataset, Facility, VehicleMovement};

const EMBEDDED_DATASET: &str = include_str!("../../data/supply_chain.json");

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDataset {
    #[serde(default)]
    facilities: Vec<Facility>,
    #[serde(default)]
    vehicle_movements: Vec<VehicleMovement>,
}

pub fn parse_dataset(raw: &str) -> Result<Dataset> {
    let parsed: RawDataset =
        serde_json::from_str(raw).context("invalid supply chain dataset JSON")?;

    if parsed.facilities.is_empty() {
        return Err(anyhow!("dataset contains no facilities"));
    }

    Ok(Dataset::new(parsed.facilities, parsed.vehicle_movements))
}

/// Loads the dataset at `path`, or the bundled one when no path is given.
pub fn load_dataset(path: Option<&Path>) -> Result<Dataset> {
    let dataset = match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read dataset {}", path.display()))?;
            parse_dataset(&raw)
                .with_context(|| format!("failed to parse dataset {}", path.display()))?
        }
        None => parse_dataset(EMBEDDED_DATASET).context("bundled dataset is malformed")?,
    };

    tracing::info!(
        facilities = dataset.facility_count(),
        movements = dataset.movement_count(),
        "supply chain dataset loaded"
    );
    Ok(dataset)
}
