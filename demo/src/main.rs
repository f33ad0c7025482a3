//! Imports GeoJSON and KML files given on the command line and prints what the engine made of
//! them.
//!
//! Options of the engine can be given as JSON in the `GEOMARK_OPTIONS` environment variable.

use std::fs::File;
use std::io::{self, Write as _};
use std::path::Path;

use futures::executor::block_on;
use futures::io::AllowStdIo;
use geomark::feature::Geometry;
use geomark::geometry::{GeodesicUtility, GeometryUtility as _, LengthUnit};
use geomark::{Engine, HoverInfo, LayerSummary, Options, SketchPad, Viewport};

fn options() -> Options {
    match std::env::var("GEOMARK_OPTIONS") {
        Ok(json) => Options::from_json(&json).unwrap_or_else(|err| {
            log::error!("Ignoring GEOMARK_OPTIONS: {err}");
            Options::default()
        }),
        Err(_) => Options::default(),
    }
}

/// Layers are named after the file, not the whole path.
fn layer_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map_or_else(|| path.to_owned(), |name| name.to_string_lossy().into_owned())
}

fn describe(geometry: &Geometry) -> String {
    let info = match geometry {
        Geometry::Point(position) => HoverInfo::Marker {
            position: *position,
        },
        Geometry::LineString(positions) => {
            let line: geo_types::LineString = positions.iter().map(|p| p.0).collect();
            HoverInfo::Line {
                length_km: GeodesicUtility.length(&line, LengthUnit::Kilometers),
            }
        }
        Geometry::Polygon { exterior, holes } => {
            let ring = |positions: &Vec<geomark::Position>| -> geo_types::LineString {
                positions.iter().map(|p| p.0).collect()
            };
            let polygon = geo_types::Polygon::new(ring(exterior), holes.iter().map(ring).collect());
            HoverInfo::Polygon {
                area_km2: GeodesicUtility.area(&polygon) / 1_000_000.,
            }
        }
    };
    info.to_string()
}

fn print_layer(
    out: &mut impl io::Write,
    summary: &LayerSummary,
    engine: &Inspector,
) -> io::Result<()> {
    writeln!(
        out,
        "{} ({}, {} features, id {})",
        summary.name, summary.format, summary.feature_count, summary.id
    )?;
    if let Some(layer) = engine.layer(summary.id) {
        for feature in &layer.features {
            writeln!(
                out,
                "  {} {}: {}",
                feature.geometry.geometry_type(),
                feature.name().unwrap_or(feature.id.as_str()),
                describe(&feature.geometry)
            )?;
        }
    }
    Ok(())
}

type Inspector = Engine<Viewport, SketchPad>;

fn main() -> io::Result<()> {
    env_logger::init();

    let mut engine = Inspector::new(options());
    let viewport = Viewport::new(egui::Rect::from_min_size(
        egui::Pos2::ZERO,
        egui::vec2(1280., 720.),
    ));
    if let Err(err) = engine.load(viewport, SketchPad::default()) {
        log::error!("Could not load the map: {err}");
        return Ok(());
    }

    let mut out = io::stdout().lock();
    for path in std::env::args().skip(1) {
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) => {
                log::error!("Could not open {path}: {err}");
                continue;
            }
        };

        match block_on(engine.import_from(&layer_name(&path), AllowStdIo::new(file))) {
            Ok(summary) => print_layer(&mut out, &summary, &engine)?,
            Err(err) => log::error!("Could not import {path}: {err}"),
        }
    }

    if let Some(viewport) = engine.session() {
        let center = viewport.center();
        writeln!(
            out,
            "View centered at {:.4}, {:.4}, zoom {:.1}",
            center.y(),
            center.x(),
            viewport.zoom()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layers_are_named_after_the_file() {
        assert_eq!("parks.geojson", layer_name("data/parks.geojson"));
        assert_eq!("trails.kml", layer_name("/home/user/trails.kml"));
        assert_eq!("poland.kml", layer_name("poland.kml"));
    }
}
