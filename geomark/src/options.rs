//! User-tunable settings of the [`crate::Engine`].

use serde::{Deserialize, Serialize};

use crate::{Position, error::Error, lon_lat};

/// Settings of the engine. Every field is optional when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Two clicks closer in time than this are treated as a double click.
    pub double_click_threshold_ms: u64,

    /// Initial center of the view, as `[longitude, latitude]`.
    pub center: [f64; 2],

    /// Initial zoom level.
    pub zoom: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            double_click_threshold_ms: 500,
            center: [-74.5, 40.],
            zoom: 9.,
        }
    }
}

impl Options {
    /// Read options from a JSON object, such as `{"zoom": 12}`.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn center(&self) -> Position {
        lon_lat(self.center[0], self.center[1])
    }
}
