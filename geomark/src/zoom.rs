#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("invalid zoom level")]
pub struct InvalidZoom;

/// Maximum zoom offered by Mapbox styles.
const MAX_ZOOM: f64 = 22.;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Zoom(f64);

impl TryFrom<f64> for Zoom {
    type Error = InvalidZoom;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !(0. ..=MAX_ZOOM).contains(&value) {
            Err(InvalidZoom)
        } else {
            Ok(Self(value))
        }
    }
}

// The reverse is not implemented, TryFrom<f64> validates the range.
#[allow(clippy::from_over_into)]
impl Into<f64> for Zoom {
    fn into(self) -> f64 {
        self.0
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Self(9.)
    }
}

impl Zoom {
    /// Zoom using a relative value, saturating at the limits.
    pub fn zoom_by(&mut self, value: f64) {
        self.0 = (self.0 + value).clamp(0., MAX_ZOOM);
    }
}
