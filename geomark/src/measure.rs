//! Distances and areas derived from the drawn features, and the ruler of the measure mode.

use crate::{
    Position,
    feature::{Feature, Geometry, to_line_string},
    geometry::{GeodesicUtility, GeometryUtility, LengthUnit},
};

pub const KM_TO_MILES: f64 = 0.621371;
pub const KM2_TO_MILES2: f64 = 0.386102;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distance {
    pub km: f64,
    pub miles: f64,
}

impl Distance {
    fn from_km(km: f64) -> Self {
        Self {
            km,
            miles: km * KM_TO_MILES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Area {
    pub km2: f64,
    pub miles2: f64,
}

impl Area {
    fn from_square_meters(m2: f64) -> Self {
        let km2 = m2 / 1_000_000.;
        Self {
            km2,
            miles2: km2 * KM2_TO_MILES2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeasurementSnapshot {
    /// Length of the path through drawn points, in drawing order. Needs at least two points.
    pub distance: Option<Distance>,

    /// Area of the first drawn polygon. Other polygons are not taken into account.
    pub area: Option<Area>,
}

/// Ad-hoc measuring path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ruler {
    pub active: bool,
    pub points: Vec<Position>,
    pub distance: Option<Distance>,
}

#[derive(Debug, Default)]
pub struct MeasurementEngine<G = GeodesicUtility> {
    utility: G,
    snapshot: MeasurementSnapshot,
    ruler: Ruler,
}

impl<G: GeometryUtility> MeasurementEngine<G> {
    pub fn new(utility: G) -> Self {
        Self {
            utility,
            snapshot: MeasurementSnapshot::default(),
            ruler: Ruler::default(),
        }
    }

    pub fn utility(&self) -> &G {
        &self.utility
    }

    pub fn snapshot(&self) -> MeasurementSnapshot {
        self.snapshot
    }

    pub fn ruler(&self) -> &Ruler {
        &self.ruler
    }

    /// Recompute the snapshot from scratch.
    pub fn recompute(&mut self, features: &[Feature]) -> MeasurementSnapshot {
        let points: Vec<Position> = features
            .iter()
            .filter_map(|feature| match feature.geometry {
                Geometry::Point(position) => Some(position),
                _ => None,
            })
            .collect();

        let distance = (points.len() >= 2).then(|| {
            Distance::from_km(
                self.utility
                    .length(&to_line_string(&points), LengthUnit::Kilometers),
            )
        });

        let area = features
            .iter()
            .find_map(|feature| match &feature.geometry {
                Geometry::Polygon { exterior, holes } => Some(geo_types::Polygon::new(
                    to_line_string(exterior),
                    holes.iter().map(|hole| to_line_string(hole)).collect(),
                )),
                _ => None,
            })
            .map(|polygon| Area::from_square_meters(self.utility.area(&polygon)));

        self.snapshot = MeasurementSnapshot { distance, area };
        log::debug!("Measurements updated: {:?}", self.snapshot);
        self.snapshot
    }

    /// Toggle the measure mode, returning whether it is now on. The ruler is emptied either
    /// way.
    pub fn toggle_ruler(&mut self) -> bool {
        let active = !self.ruler.active;
        self.ruler = Ruler {
            active,
            ..Ruler::default()
        };
        active
    }

    /// Append a vertex to the ruler path.
    pub fn extend_ruler(&mut self, position: Position) -> Option<Distance> {
        self.ruler.points.push(position);
        if self.ruler.points.len() >= 2 {
            let km = self
                .utility
                .length(&to_line_string(&self.ruler.points), LengthUnit::Kilometers);
            self.ruler.distance = Some(Distance::from_km(km));
        }
        self.ruler.distance
    }

    /// Empty the ruler path, keeping the measure mode as it is.
    pub fn clear_ruler(&mut self) {
        self.ruler.points.clear();
        self.ruler.distance = None;
    }
}
