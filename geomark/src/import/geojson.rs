//! GeoJSON ([RFC 7946](https://www.rfc-editor.org/rfc/rfc7946)) reader.
//!
//! The root object may be a `FeatureCollection`, a single `Feature` or a bare geometry. Multi
//! geometries and geometry collections are exploded into one feature per member, because the
//! feature model only knows single points, line strings and polygons.

use serde::Deserialize;
use serde_json::Value;

use super::{ImportError, SourceFormat};
use crate::feature::{Feature, FeatureCollection, FeatureId, Geometry, Origin, Properties};
use crate::position::{Position, lon_lat};

#[derive(Deserialize)]
struct RawCollection {
    features: Vec<RawFeature>,
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    id: Option<Value>,
    geometry: Option<RawGeometry>,
    #[serde(default)]
    properties: Option<Properties>,
}

/// Positions are kept as plain arrays, so that altitude (and anything after it) is accepted.
type RawPosition = Vec<f64>;

#[derive(Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Point {
        coordinates: RawPosition,
    },
    MultiPoint {
        coordinates: Vec<RawPosition>,
    },
    LineString {
        coordinates: Vec<RawPosition>,
    },
    MultiLineString {
        coordinates: Vec<Vec<RawPosition>>,
    },
    Polygon {
        coordinates: Vec<Vec<RawPosition>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<RawPosition>>>,
    },
    GeometryCollection {
        geometries: Vec<RawGeometry>,
    },
}

fn parse_error(message: impl ToString) -> ImportError {
    ImportError::Parse {
        format: SourceFormat::GeoJson,
        message: message.to_string(),
    }
}

/// Parse GeoJSON text into imported features.
pub fn parse(text: &str) -> Result<FeatureCollection, ImportError> {
    let root: Value = serde_json::from_str(text).map_err(parse_error)?;

    let kind = root
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| parse_error("root object has no \"type\" member"))?
        .to_owned();

    let raw_features = match kind.as_str() {
        "FeatureCollection" => {
            serde_json::from_value::<RawCollection>(root)
                .map_err(parse_error)?
                .features
        }
        "Feature" => vec![serde_json::from_value::<RawFeature>(root).map_err(parse_error)?],
        _ => vec![RawFeature {
            id: None,
            geometry: Some(serde_json::from_value(root).map_err(parse_error)?),
            properties: None,
        }],
    };

    let mut features = FeatureCollection::default();
    for (index, raw) in raw_features.into_iter().enumerate() {
        let id = feature_id(raw.id.as_ref(), index);
        let Some(geometry) = raw.geometry else {
            log::debug!("Skipping feature {id} without geometry.");
            continue;
        };

        let mut geometries = Vec::new();
        flatten(geometry, &mut geometries)?;

        let single = geometries.len() == 1;
        let properties = raw.properties.unwrap_or_default();
        for (part, geometry) in geometries.into_iter().enumerate() {
            let geometry = geometry.map_err(|source| ImportError::InvalidGeometry {
                format: SourceFormat::GeoJson,
                feature: id.clone(),
                source,
            })?;
            let part_id = if single {
                id.clone()
            } else {
                format!("{id}-{part}")
            };
            features.push(
                Feature::new(FeatureId::new(part_id), geometry, Origin::Imported)
                    .with_properties(properties.clone()),
            );
        }
    }

    Ok(features)
}

/// GeoJSON ids may be strings or numbers. Features without one get their index.
fn feature_id(id: Option<&Value>, index: usize) -> String {
    match id {
        Some(Value::String(id)) => id.to_owned(),
        Some(Value::Number(id)) => id.to_string(),
        _ => format!("feature-{index}"),
    }
}

type Part = Result<Geometry, crate::feature::InvalidGeometry>;

/// Explode `geometry` into single geometries. Malformed positions are reported right away, while
/// geometry invariant violations are returned per part, so the caller can name the feature.
fn flatten(geometry: RawGeometry, out: &mut Vec<Part>) -> Result<(), ImportError> {
    match geometry {
        RawGeometry::Point { coordinates } => out.push(Geometry::point(position(&coordinates)?)),
        RawGeometry::MultiPoint { coordinates } => {
            for coordinates in coordinates {
                out.push(Geometry::point(position(&coordinates)?));
            }
        }
        RawGeometry::LineString { coordinates } => {
            out.push(Geometry::line_string(positions(&coordinates)?));
        }
        RawGeometry::MultiLineString { coordinates } => {
            for coordinates in coordinates {
                out.push(Geometry::line_string(positions(&coordinates)?));
            }
        }
        RawGeometry::Polygon { coordinates } => out.push(polygon(&coordinates)?),
        RawGeometry::MultiPolygon { coordinates } => {
            for coordinates in coordinates {
                out.push(polygon(&coordinates)?);
            }
        }
        RawGeometry::GeometryCollection { geometries } => {
            for geometry in geometries {
                flatten(geometry, out)?;
            }
        }
    }
    Ok(())
}

fn polygon(rings: &[Vec<RawPosition>]) -> Result<Part, ImportError> {
    let Some((exterior, holes)) = rings.split_first() else {
        return Err(parse_error("polygon without rings"));
    };
    let holes = holes
        .iter()
        .map(|hole| positions(hole))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Geometry::polygon(positions(exterior)?, holes))
}

fn positions(coordinates: &[RawPosition]) -> Result<Vec<Position>, ImportError> {
    coordinates.iter().map(|c| position(c)).collect()
}

fn position(coordinates: &[f64]) -> Result<Position, ImportError> {
    match coordinates {
        [lon, lat, ..] => Ok(lon_lat(*lon, *lat)),
        _ => Err(parse_error(format!(
            "position needs at least two numbers, got {}",
            coordinates.len()
        ))),
    }
}
