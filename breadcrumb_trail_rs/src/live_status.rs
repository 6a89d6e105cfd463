use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::sources::SourceKind;
use crate::types::{CapabilityFlags, Vector3};

/// Point-in-time view of a trail session for the host's status display.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrailStatus {
    pub timestamp: String,
    pub uptime_seconds: f64,
    pub ticks: u64,
    // Source selection
    pub source: SourceKind,
    pub flags: CapabilityFlags,
    pub fallbacks: Vec<String>,
    // Trail
    pub marker_count: usize,
    pub path_length: f64,
    pub position: Vector3,
    // Dead reckoning only
    pub velocity: Option<Vector3>,
    pub accepted_samples: u64,
    pub rejected_samples: u64,
}

impl TrailStatus {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = self.to_json()?;
        fs::write(path, json)?;
        Ok(())
    }
}
