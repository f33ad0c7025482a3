//! KML reader: the XML is parsed by the `kml` crate and the resulting element tree converted
//! into features, the same way `togeojson` would do it.

use kml::types::{Coord, Geometry as KmlGeometry, Placemark};
use kml::{Kml, KmlDocument};

use super::{ImportError, SourceFormat};
use crate::feature::{Feature, FeatureCollection, FeatureId, Geometry, Origin, Properties};
use crate::position::{Position, lon_lat};

fn parse_error(message: impl ToString) -> ImportError {
    ImportError::Parse {
        format: SourceFormat::Kml,
        message: message.to_string(),
    }
}

/// Parse KML text into imported features.
pub fn parse(text: &str) -> Result<FeatureCollection, ImportError> {
    if !text.trim_start().starts_with('<') {
        return Err(parse_error("not an XML document"));
    }
    let kml: Kml = text.parse().map_err(parse_error)?;
    convert(&kml)
}

/// Convert a parsed KML document into features. Placemarks are collected from documents and
/// folders recursively, in document order.
pub fn convert(kml: &Kml) -> Result<FeatureCollection, ImportError> {
    let mut converter = Converter::default();
    converter.element(kml)?;
    Ok(converter.features)
}

#[derive(Default)]
struct Converter {
    features: FeatureCollection,
    placemarks: usize,
}

impl Converter {
    fn element(&mut self, element: &Kml) -> Result<(), ImportError> {
        match element {
            Kml::KmlDocument(KmlDocument { elements, .. }) | Kml::Document { elements, .. } => {
                for child in elements {
                    self.element(child)?;
                }
            }
            Kml::Folder(folder) => {
                for child in &folder.elements {
                    self.element(child)?;
                }
            }
            Kml::Placemark(placemark) => self.placemark(placemark)?,
            _ => log::debug!("Skipping unsupported KML element: {element:?}"),
        }
        Ok(())
    }

    fn placemark(&mut self, placemark: &Placemark) -> Result<(), ImportError> {
        let index = self.placemarks;
        self.placemarks += 1;

        let id = placemark
            .attrs
            .get("id")
            .cloned()
            .unwrap_or_else(|| format!("placemark-{index}"));

        let Some(geometry) = &placemark.geometry else {
            log::debug!("Skipping placemark {id} without geometry.");
            return Ok(());
        };

        let mut properties = Properties::new();
        if let Some(name) = &placemark.name {
            properties.insert("name".to_owned(), name.clone().into());
        }
        if let Some(description) = &placemark.description {
            properties.insert("description".to_owned(), description.clone().into());
        }

        let mut geometries = Vec::new();
        flatten(geometry, &mut geometries);

        let single = geometries.len() == 1;
        for (part, geometry) in geometries.into_iter().enumerate() {
            let geometry = geometry.map_err(|source| ImportError::InvalidGeometry {
                format: SourceFormat::Kml,
                feature: id.clone(),
                source,
            })?;
            let part_id = if single {
                id.clone()
            } else {
                format!("{id}-{part}")
            };
            self.features.push(
                Feature::new(FeatureId::new(part_id), geometry, Origin::Imported)
                    .with_properties(properties.clone()),
            );
        }
        Ok(())
    }
}

type Part = Result<Geometry, crate::feature::InvalidGeometry>;

fn flatten(geometry: &KmlGeometry, out: &mut Vec<Part>) {
    match geometry {
        KmlGeometry::Point(point) => out.push(Geometry::point(position(&point.coord))),
        // `togeojson` reads rings outside of polygons as lines.
        KmlGeometry::LineString(line) => out.push(Geometry::line_string(positions(&line.coords))),
        KmlGeometry::LinearRing(ring) => out.push(Geometry::line_string(positions(&ring.coords))),
        KmlGeometry::Polygon(polygon) => out.push(Geometry::polygon(
            positions(&polygon.outer.coords),
            polygon
                .inner
                .iter()
                .map(|ring| positions(&ring.coords))
                .collect(),
        )),
        KmlGeometry::MultiGeometry(multi_geometry) => {
            for geometry in &multi_geometry.geometries {
                flatten(geometry, out);
            }
        }
        other => log::debug!("Skipping unsupported KML geometry: {other:?}"),
    }
}

fn positions(coords: &[Coord]) -> Vec<Position> {
    coords.iter().map(position).collect()
}

fn position(coord: &Coord) -> Position {
    lon_lat(coord.x, coord.y)
}
