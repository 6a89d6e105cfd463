//! Typed trail configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.
//! The host-facing camelCase names (`minDistance`, `dragMoveSpeed`, ...)
//! are accepted as aliases.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TrailError, TrailResult};
use crate::platform::ReferenceSpaceKind;

/// How velocity damping relates to the sample cadence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DampingMode {
    /// Multiply by `damping` once per accepted sample. Drift depends on the
    /// sensor event rate.
    #[default]
    PerSample,
    /// Multiply by `damping^dt`, making `damping` a per-second decay.
    TimeScaled,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrailConfig {
    /// Minimum time between trail samples (milliseconds)
    #[serde(default = "defaults::interval_ms", alias = "interval")]
    pub interval_ms: f64,

    /// Distance that must be covered before a new marker is dropped
    #[serde(default = "defaults::min_distance", alias = "minDistance")]
    pub min_distance: f64,

    /// Marker radius
    #[serde(
        default = "defaults::marker_size",
        alias = "markerSize",
        alias = "breadcrumbSize"
    )]
    pub marker_size: f64,

    #[serde(default = "defaults::color", alias = "trailColor")]
    pub color: Rgb,

    #[serde(default = "defaults::segment_opacity", alias = "segmentOpacity")]
    pub segment_opacity: f64,

    #[serde(default = "defaults::emissive_intensity", alias = "emissiveIntensity")]
    pub emissive_intensity: f64,

    /// Scale applied to integrated acceleration
    #[serde(default = "defaults::sensitivity")]
    pub sensitivity: f64,

    /// Velocity decay factor, in (0, 1]
    #[serde(default = "defaults::damping")]
    pub damping: f64,

    #[serde(default, alias = "dampingMode")]
    pub damping_mode: DampingMode,

    /// Samples with |ax| and |az| at or below this are treated as noise
    #[serde(
        default = "defaults::acceleration_threshold",
        alias = "accelerationThreshold"
    )]
    pub acceleration_threshold: f64,

    /// World units per pixel of pointer drag
    #[serde(default = "defaults::drag_move_speed", alias = "dragMoveSpeed")]
    pub drag_move_speed: f64,

    /// Upper bound on each asynchronous negotiation step (milliseconds)
    #[serde(
        default = "defaults::permission_timeout_ms",
        alias = "permissionTimeoutMs"
    )]
    pub permission_timeout_ms: u64,

    /// Zero the velocity after this long without an accepted sample.
    /// `None` keeps coasting on the last velocity.
    #[serde(default, alias = "idleVelocityTimeoutMs")]
    pub idle_velocity_timeout_ms: Option<f64>,

    /// Reference spaces to request, most preferred first
    #[serde(default = "defaults::reference_spaces", alias = "referenceSpaces")]
    pub reference_spaces: Vec<ReferenceSpaceKind>,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            interval_ms: defaults::interval_ms(),
            min_distance: defaults::min_distance(),
            marker_size: defaults::marker_size(),
            color: defaults::color(),
            segment_opacity: defaults::segment_opacity(),
            emissive_intensity: defaults::emissive_intensity(),
            sensitivity: defaults::sensitivity(),
            damping: defaults::damping(),
            damping_mode: DampingMode::default(),
            acceleration_threshold: defaults::acceleration_threshold(),
            drag_move_speed: defaults::drag_move_speed(),
            permission_timeout_ms: defaults::permission_timeout_ms(),
            idle_velocity_timeout_ms: None,
            reference_spaces: defaults::reference_spaces(),
        }
    }
}

impl TrailConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> TrailResult<Self> {
        let config: TrailConfig = serde_json::from_str(json)
            .map_err(|e| TrailError::Configuration(format!("invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> TrailResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            TrailError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> TrailResult<()> {
        non_negative("interval_ms", self.interval_ms)?;
        non_negative("min_distance", self.min_distance)?;
        positive("marker_size", self.marker_size)?;
        non_negative("emissive_intensity", self.emissive_intensity)?;
        non_negative("acceleration_threshold", self.acceleration_threshold)?;
        positive("drag_move_speed", self.drag_move_speed)?;

        if !(0.0..=1.0).contains(&self.segment_opacity) {
            return Err(invalid("segment_opacity", "must be within [0, 1]"));
        }
        if !self.sensitivity.is_finite() {
            return Err(invalid("sensitivity", "must be finite"));
        }
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(invalid("damping", "must be within (0, 1]"));
        }
        if self.permission_timeout_ms == 0 {
            return Err(invalid("permission_timeout_ms", "must be positive"));
        }
        if let Some(timeout) = self.idle_velocity_timeout_ms {
            positive("idle_velocity_timeout_ms", timeout)?;
        }
        if self.reference_spaces.is_empty() {
            return Err(invalid("reference_spaces", "must list at least one kind"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> TrailError {
    TrailError::Configuration(format!("{field} {reason}"))
}

fn non_negative(field: &str, value: f64) -> TrailResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be a finite, non-negative number"))
    }
}

fn positive(field: &str, value: f64) -> TrailResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be a finite, positive number"))
    }
}

/// 24-bit colour, written as `#rrggbb` (or `#rgb`) in config files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Rgb {
    type Err = TrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || TrailError::Configuration(format!("invalid colour {s:?}"));
        let hex = s.trim().strip_prefix('#').ok_or_else(bad)?;
        if !hex.is_ascii() {
            return Err(bad());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| bad());
        match hex.len() {
            6 => Ok(Rgb::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            // #rgb shorthand: each digit is doubled
            3 => Ok(Rgb::new(
                channel(&hex[0..1])? * 17,
                channel(&hex[1..2])? * 17,
                channel(&hex[2..3])? * 17,
            )),
            _ => Err(bad()),
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = TrailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

mod defaults {
    use super::Rgb;
    use crate::platform::ReferenceSpaceKind;

    pub fn interval_ms() -> f64 {
        200.0
    }

    pub fn min_distance() -> f64 {
        0.1
    }

    pub fn marker_size() -> f64 {
        0.05
    }

    pub fn color() -> Rgb {
        Rgb::new(0xff, 0x6b, 0x6b)
    }

    pub fn segment_opacity() -> f64 {
        0.7
    }

    pub fn emissive_intensity() -> f64 {
        0.3
    }

    pub fn sensitivity() -> f64 {
        0.1
    }

    pub fn damping() -> f64 {
        0.95
    }

    pub fn acceleration_threshold() -> f64 {
        1.0
    }

    pub fn drag_move_speed() -> f64 {
        0.01
    }

    pub fn permission_timeout_ms() -> u64 {
        3000
    }

    pub fn reference_spaces() -> Vec<ReferenceSpaceKind> {
        vec![ReferenceSpaceKind::LocalFloor, ReferenceSpaceKind::Local]
    }
}
