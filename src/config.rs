//! JSON runtime configuration.
//!
//! A config file carries the detector parameters plus optional I/O paths, so
//! batch tooling can run the detector without recompiling. Parameters are
//! validated as part of loading; a file that parses but describes an
//! inconsistent detector is rejected here.

use crate::detector::DetectorParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Detection result serialized as JSON, one file per run.
    pub json_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeConfig {
    /// Input cloud path; the format is up to the caller's loader.
    pub input_path: PathBuf,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub detector_params: DetectorParams,
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    parse_config(&contents).map_err(|e| format!("Invalid config {}: {e}", path.display()))
}

fn parse_config(contents: &str) -> Result<RuntimeConfig, String> {
    let config: RuntimeConfig =
        serde_json::from_str(contents).map_err(|e| format!("parse error: {e}"))?;
    config
        .detector_params
        .validate()
        .map_err(|e| e.to_string())?;
    Ok(config)
}
