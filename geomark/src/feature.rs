//! Common feature model that both drawn and imported geometries are normalized into.

use std::fmt;

use geo::BoundingRect as _;

use crate::position::{Position, is_finite, same_coordinate};

/// JSON object holding feature attributes, such as GeoJSON `properties`.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Identifier of a [`Feature`], unique within its collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(String);

impl FeatureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Where the feature came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Drawn by the user with the drawing tool.
    Drawn,
    /// Read from a GeoJSON or KML file.
    Imported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GeometryType::Point => "Point",
            GeometryType::LineString => "LineString",
            GeometryType::Polygon => "Polygon",
        })
    }
}

/// Geometry breaking the invariants of [`Geometry`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InvalidGeometry {
    #[error("{kind} needs at least {min} positions, got {got}")]
    TooFewPositions {
        kind: GeometryType,
        min: usize,
        got: usize,
    },
    #[error("{kind} contains a non-finite coordinate")]
    NonFinite { kind: GeometryType },
}

/// Shape of a feature. Constructed through [`Geometry::point`], [`Geometry::line_string`] and
/// [`Geometry::polygon`], which uphold these invariants:
///
/// * a line string has at least two positions,
/// * every polygon ring is closed and has at least four positions (three distinct ones plus the
///   closing one),
/// * all coordinates are finite.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Position),
    LineString(Vec<Position>),
    Polygon {
        exterior: Vec<Position>,
        holes: Vec<Vec<Position>>,
    },
}

impl Geometry {
    pub fn point(position: Position) -> Result<Self, InvalidGeometry> {
        if !is_finite(position) {
            return Err(InvalidGeometry::NonFinite {
                kind: GeometryType::Point,
            });
        }
        Ok(Self::Point(position))
    }

    pub fn line_string(positions: Vec<Position>) -> Result<Self, InvalidGeometry> {
        check_positions(GeometryType::LineString, &positions, 2)?;
        Ok(Self::LineString(positions))
    }

    /// Construct a polygon, closing any ring which is given open.
    pub fn polygon(
        exterior: Vec<Position>,
        holes: Vec<Vec<Position>>,
    ) -> Result<Self, InvalidGeometry> {
        let exterior = closed_ring(exterior)?;
        let holes = holes
            .into_iter()
            .map(closed_ring)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::Polygon { exterior, holes })
    }

    /// Check the invariants again, closing open polygon rings. For geometries assembled from
    /// the variants directly.
    pub fn validated(self) -> Result<Self, InvalidGeometry> {
        match self {
            Geometry::Point(position) => Self::point(position),
            Geometry::LineString(positions) => Self::line_string(positions),
            Geometry::Polygon { exterior, holes } => Self::polygon(exterior, holes),
        }
    }

    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point(_) => GeometryType::Point,
            Geometry::LineString(_) => GeometryType::LineString,
            Geometry::Polygon { .. } => GeometryType::Polygon,
        }
    }

    /// Every position of the geometry, including polygon holes.
    pub fn positions(&self) -> Box<dyn Iterator<Item = Position> + '_> {
        match self {
            Geometry::Point(position) => Box::new(std::iter::once(*position)),
            Geometry::LineString(positions) => Box::new(positions.iter().copied()),
            Geometry::Polygon { exterior, holes } => Box::new(
                exterior
                    .iter()
                    .chain(holes.iter().flatten())
                    .copied(),
            ),
        }
    }

    /// Shift every position by the given number of degrees.
    pub fn translate(&mut self, d_lon: f64, d_lat: f64) {
        let shift = |p: &mut Position| *p = Position::new(p.x() + d_lon, p.y() + d_lat);
        match self {
            Geometry::Point(position) => shift(position),
            Geometry::LineString(positions) => positions.iter_mut().for_each(shift),
            Geometry::Polygon { exterior, holes } => {
                exterior.iter_mut().for_each(shift);
                holes.iter_mut().flatten().for_each(shift);
            }
        }
    }

    pub fn to_geo(&self) -> geo_types::Geometry {
        match self {
            Geometry::Point(position) => geo_types::Geometry::Point(*position),
            Geometry::LineString(positions) => {
                geo_types::Geometry::LineString(to_line_string(positions))
            }
            Geometry::Polygon { exterior, holes } => geo_types::Geometry::Polygon(
                geo_types::Polygon::new(
                    to_line_string(exterior),
                    holes.iter().map(|hole| to_line_string(hole)).collect(),
                ),
            ),
        }
    }
}

pub(crate) fn to_line_string(positions: &[Position]) -> geo_types::LineString {
    positions.iter().map(|p| p.0).collect()
}

fn check_positions(
    kind: GeometryType,
    positions: &[Position],
    min: usize,
) -> Result<(), InvalidGeometry> {
    if positions.len() < min {
        return Err(InvalidGeometry::TooFewPositions {
            kind,
            min,
            got: positions.len(),
        });
    }
    if !positions.iter().copied().all(is_finite) {
        return Err(InvalidGeometry::NonFinite { kind });
    }
    Ok(())
}

fn closed_ring(mut ring: Vec<Position>) -> Result<Vec<Position>, InvalidGeometry> {
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied())
        && !same_coordinate(first, last)
    {
        ring.push(first);
    }
    check_positions(GeometryType::Polygon, &ring, 4)?;
    Ok(ring)
}

/// A single geometric object with an id and origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Geometry,
    pub origin: Origin,
    pub properties: Properties,
}

impl Feature {
    pub fn new(id: impl Into<FeatureId>, geometry: Geometry, origin: Origin) -> Self {
        Self {
            id: id.into(),
            geometry,
            origin,
            properties: Properties::new(),
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// The same feature, with its geometry checked by [`Geometry::validated`].
    pub fn validated(mut self) -> Result<Self, InvalidGeometry> {
        self.geometry = self.geometry.validated()?;
        Ok(self)
    }

    /// Value of the `name` property, if it is a string.
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").and_then(|name| name.as_str())
    }
}

impl From<String> for FeatureId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Ordered set of features.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    /// Smallest rectangle containing every feature, `None` for an empty collection.
    pub fn bounds(&self) -> Option<geo_types::Rect> {
        let collection: geo_types::GeometryCollection = self
            .features
            .iter()
            .map(|feature| feature.geometry.to_geo())
            .collect();
        collection.bounding_rect()
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<T: IntoIterator<Item = Feature>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lon_lat;

    fn triangle() -> Vec<Position> {
        vec![lon_lat(0., 0.), lon_lat(1., 0.), lon_lat(0., 1.)]
    }

    #[test]
    fn hand_built_geometries_are_checked_again() {
        let stub = Geometry::LineString(vec![lon_lat(1., 1.)]);
        assert_eq!(
            Err(InvalidGeometry::TooFewPositions {
                kind: GeometryType::LineString,
                min: 2,
                got: 1,
            }),
            stub.validated()
        );

        let open = Geometry::Polygon {
            exterior: triangle(),
            holes: vec![],
        };
        assert_eq!(Geometry::polygon(triangle(), vec![]), open.validated());

        let sliver = Geometry::Polygon {
            exterior: vec![lon_lat(0., 0.), lon_lat(1., 1.)],
            holes: vec![],
        };
        assert!(sliver.validated().is_err());
    }

    #[test]
    fn open_rings_get_closed() {
        let Geometry::Polygon { exterior, holes } = Geometry::polygon(triangle(), vec![]).unwrap()
        else {
            panic!("expected a polygon");
        };
        assert_eq!(4, exterior.len());
        assert_eq!(exterior.first(), exterior.last());
        assert!(holes.is_empty());
    }

    #[test]
    fn closed_rings_are_kept_as_they_are() {
        let mut ring = triangle();
        ring.push(lon_lat(0., 0.));

        let polygon = Geometry::polygon(ring.clone(), vec![]).unwrap();
        assert_eq!(
            Geometry::Polygon {
                exterior: ring,
                holes: vec![]
            },
            polygon
        );
    }

    #[test]
    fn degenerate_geometries_are_rejected() {
        assert_eq!(
            Err(InvalidGeometry::TooFewPositions {
                kind: GeometryType::LineString,
                min: 2,
                got: 1
            }),
            Geometry::line_string(vec![lon_lat(0., 0.)])
        );

        assert_eq!(
            Err(InvalidGeometry::TooFewPositions {
                kind: GeometryType::Polygon,
                min: 4,
                got: 3
            }),
            Geometry::polygon(vec![lon_lat(0., 0.), lon_lat(1., 1.)], vec![])
        );

        assert_eq!(
            Err(InvalidGeometry::NonFinite {
                kind: GeometryType::Point
            }),
            Geometry::point(lon_lat(f64::INFINITY, 0.))
        );
    }

    #[test]
    fn holes_are_validated_too() {
        let result = Geometry::polygon(triangle(), vec![vec![lon_lat(0.1, 0.1)]]);
        assert!(matches!(
            result,
            Err(InvalidGeometry::TooFewPositions { .. })
        ));
    }

    #[test]
    fn collection_bounds() {
        let collection = FeatureCollection::new(vec![
            Feature::new(
                "a",
                Geometry::point(lon_lat(-3., 2.)).unwrap(),
                Origin::Imported,
            ),
            Feature::new(
                "b",
                Geometry::line_string(vec![lon_lat(1., 5.), lon_lat(4., -1.)]).unwrap(),
                Origin::Imported,
            ),
        ]);

        let bounds = collection.bounds().unwrap();
        assert_eq!(geo_types::coord! { x: -3., y: -1. }, bounds.min());
        assert_eq!(geo_types::coord! { x: 4., y: 5. }, bounds.max());
        assert_eq!(None, FeatureCollection::default().bounds());
    }

    #[test]
    fn translating_moves_every_position() {
        let mut geometry = Geometry::polygon(triangle(), vec![]).unwrap();
        geometry.translate(1., -1.);
        let positions: Vec<_> = geometry.positions().collect();
        assert_eq!(lon_lat(1., -1.), positions[0]);
        assert_eq!(lon_lat(2., -1.), positions[1]);
        assert_eq!(lon_lat(1., 0.), positions[2]);
    }

    #[test]
    fn name_comes_from_properties() {
        let mut properties = Properties::new();
        properties.insert("name".to_owned(), "Central Park".into());
        let feature = Feature::new(
            "park",
            Geometry::point(lon_lat(-73.97, 40.78)).unwrap(),
            Origin::Imported,
        )
        .with_properties(properties);

        assert_eq!(Some("Central Park"), feature.name());
    }
}
