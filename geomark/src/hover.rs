//! What is under the pointer.

use std::fmt;

use egui::Pos2;
use geo::Contains as _;

use crate::{
    Position,
    feature::{Feature, Geometry, to_line_string},
    geometry::{GeometryUtility, LengthUnit},
    session::MapSession,
    store::Marker,
};

/// Pointer distance, in pixels, at which markers, points and lines count as hovered.
const HOVER_DISTANCE: f32 = 8.;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoverInfo {
    Marker { position: Position },
    Polygon { area_km2: f64 },
    Line { length_km: f64 },
}

impl fmt::Display for HoverInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HoverInfo::Marker { position } => {
                write!(f, "Marker at {:.4}, {:.4}", position.y(), position.x())
            }
            HoverInfo::Polygon { area_km2 } => write!(f, "Polygon Area: {area_km2:.2} km²"),
            HoverInfo::Line { length_km } => write!(f, "Line Length: {length_km:.2} km"),
        }
    }
}

/// Find what lies under `screen`. Markers come first, then features from the most recently
/// drawn one.
pub fn hit_test(
    session: &dyn MapSession,
    utility: &impl GeometryUtility,
    markers: &[Marker],
    features: &[Feature],
    screen: Pos2,
) -> Option<HoverInfo> {
    if let Some(marker) = markers
        .iter()
        .rev()
        .find(|marker| session.project(marker.position).distance(screen) <= HOVER_DISTANCE)
    {
        return Some(HoverInfo::Marker {
            position: marker.position,
        });
    }

    features.iter().rev().find_map(|feature| match &feature.geometry {
        Geometry::Point(position) => (session.project(*position).distance(screen)
            <= HOVER_DISTANCE)
            .then_some(HoverInfo::Marker {
                position: *position,
            }),
        Geometry::LineString(positions) => near_path(session, positions, screen).then(|| {
            HoverInfo::Line {
                length_km: utility.length(&to_line_string(positions), LengthUnit::Kilometers),
            }
        }),
        Geometry::Polygon { exterior, holes } => {
            let polygon = geo_types::Polygon::new(
                to_line_string(exterior),
                holes.iter().map(|hole| to_line_string(hole)).collect(),
            );
            polygon
                .contains(&session.unproject(screen))
                .then(|| HoverInfo::Polygon {
                    area_km2: utility.area(&polygon) / 1_000_000.,
                })
        }
    })
}

fn near_path(session: &dyn MapSession, positions: &[Position], screen: Pos2) -> bool {
    let points: Vec<Pos2> = positions.iter().map(|p| session.project(*p)).collect();
    points
        .windows(2)
        .any(|segment| distance_to_segment(screen, segment[0], segment[1]) <= HOVER_DISTANCE)
}

fn distance_to_segment(point: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let length_sq = ab.length_sq();
    if length_sq == 0. {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / length_sq).clamp(0., 1.);
    point.distance(a + ab * t)
}
