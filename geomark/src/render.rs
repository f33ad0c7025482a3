//! Painting features and marker nodes with egui.

use egui::{Color32, Mesh, Painter, Pos2, Shape, Stroke};
use lyon_path::Path;
use lyon_tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, TessellationError,
    VertexBuffers, math::point,
};

use crate::{
    feature::{Feature, Geometry},
    overlay::OverlayNode,
    position::{Position, same_coordinate},
    session::MapSession,
};

/// Visual style of features and markers.
#[derive(Debug, Clone)]
pub struct Style {
    pub point_radius: f32,
    pub point_color: Color32,
    pub line_stroke: Stroke,
    pub polygon_fill: Color32,
    pub polygon_stroke: Stroke,
    pub marker_radius: f32,
    pub marker_fill: Color32,
    pub marker_stroke: Stroke,
    pub active_marker_stroke: Stroke,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            point_radius: 5.,
            point_color: Color32::from_rgb(0xF9, 0x73, 0x16),
            line_stroke: Stroke::new(2., Color32::from_rgb(0xF9, 0x73, 0x16)),
            polygon_fill: Color32::from_rgb(0xF9, 0x73, 0x16).gamma_multiply(0.1),
            polygon_stroke: Stroke::new(2., Color32::from_rgb(0xF9, 0x73, 0x16)),
            marker_radius: 8.,
            marker_fill: Color32::from_rgb(0x3B, 0x82, 0xF6),
            marker_stroke: Stroke::new(2., Color32::WHITE),
            active_marker_stroke: Stroke::new(3., Color32::BLACK),
        }
    }
}

/// Paint features projected through the session.
pub fn paint_features(
    painter: &Painter,
    session: &dyn MapSession,
    features: &[Feature],
    style: &Style,
) {
    for feature in features {
        match &feature.geometry {
            Geometry::Point(position) => {
                painter.circle_filled(
                    session.project(*position),
                    style.point_radius,
                    style.point_color,
                );
            }
            Geometry::LineString(positions) => {
                let points = positions.iter().map(|p| session.project(*p)).collect();
                painter.add(Shape::line(points, style.line_stroke));
            }
            Geometry::Polygon { exterior, holes } => {
                let exterior = ring_to_screen_points(exterior, session);
                let holes: Vec<Vec<Pos2>> = holes
                    .iter()
                    .map(|hole| ring_to_screen_points(hole, session))
                    .collect();
                if exterior.len() >= 3 {
                    match tessellate_polygon(&exterior, &holes, style.polygon_fill) {
                        Ok(mesh) => {
                            painter.add(Shape::mesh(mesh));
                        }
                        Err(err) => log::warn!("Cannot fill polygon {}: {err:?}", feature.id),
                    }
                    painter.add(Shape::closed_line(exterior, style.polygon_stroke));
                }
                for hole in holes {
                    painter.add(Shape::closed_line(hole, style.polygon_stroke));
                }
            }
        }
    }
}

/// Paint overlay nodes, back to front.
pub fn paint_markers(painter: &Painter, nodes: &[OverlayNode], style: &Style) {
    for node in nodes {
        let stroke = if node.active {
            style.active_marker_stroke
        } else {
            style.marker_stroke
        };
        painter.circle(node.screen, style.marker_radius, style.marker_fill, stroke);
    }
}

/// Triangulate a polygon given in screen points. Holes are cut out.
pub fn tessellate_polygon(
    exterior: &[Pos2],
    holes: &[Vec<Pos2>],
    color: Color32,
) -> Result<Mesh, TessellationError> {
    let mut builder = Path::builder();
    for ring in std::iter::once(exterior).chain(holes.iter().map(Vec::as_slice)) {
        let Some((first, rest)) = ring.split_first() else {
            continue;
        };
        builder.begin(point(first.x, first.y));
        for p in rest {
            builder.line_to(point(p.x, p.y));
        }
        builder.close();
    }
    let path = builder.build();

    let mut buffers: VertexBuffers<Pos2, u32> = VertexBuffers::new();
    FillTessellator::new().tessellate_path(
        &path,
        &FillOptions::default().with_fill_rule(FillRule::EvenOdd),
        &mut BuffersBuilder::new(&mut buffers, |vertex: FillVertex<'_>| {
            let position = vertex.position();
            Pos2::new(position.x, position.y)
        }),
    )?;

    let mut mesh = Mesh::default();
    for position in buffers.vertices {
        mesh.colored_vertex(position, color);
    }
    mesh.indices = buffers.indices;
    Ok(mesh)
}

fn ring_to_screen_points(ring: &[Position], session: &dyn MapSession) -> Vec<Pos2> {
    let mut points: Vec<Pos2> = ring.iter().map(|p| session.project(*p)).collect();
    // Skip duplicate closing vertex.
    if let (Some(first), Some(last)) = (ring.first(), ring.last())
        && ring.len() > 1
        && same_coordinate(*first, *last)
    {
        points.pop();
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        feature::{FeatureCollection, Origin},
        lon_lat,
        session::Viewport,
        store::MarkerId,
    };
    use egui::{Rect, Vec2};

    fn shapes_painted(paint: impl Fn(&Painter)) -> usize {
        let ctx = egui::Context::default();
        let output = ctx.run(egui::RawInput::default(), |ctx| {
            paint(&ctx.layer_painter(egui::LayerId::background()));
        });
        output.shapes.len()
    }

    fn viewport() -> Viewport {
        let mut viewport = Viewport::new(Rect::from_min_size(Pos2::ZERO, Vec2::new(400., 400.)));
        viewport.set_view(lon_lat(0., 0.), 10.).unwrap();
        viewport
    }

    fn mesh_area(mesh: &Mesh) -> f32 {
        mesh.indices
            .chunks(3)
            .map(|triangle| {
                let [a, b, c] = [triangle[0], triangle[1], triangle[2]]
                    .map(|index| mesh.vertices[index as usize].pos);
                ((b - a).x * (c - a).y - (b - a).y * (c - a).x).abs() / 2.
            })
            .sum()
    }

    #[test]
    fn concave_polygons_are_filled_exactly() {
        // L-shaped, the notch at (100..200, 100..200) stays empty.
        let exterior = [
            Pos2::new(0., 0.),
            Pos2::new(200., 0.),
            Pos2::new(200., 100.),
            Pos2::new(100., 100.),
            Pos2::new(100., 200.),
            Pos2::new(0., 200.),
        ];
        let mesh = tessellate_polygon(&exterior, &[], Color32::RED).unwrap();

        approx::assert_relative_eq!(30_000., mesh_area(&mesh), epsilon = 1.);
        assert!(mesh.vertices.iter().all(|vertex| vertex.color == Color32::RED));
    }

    #[test]
    fn holes_are_cut_out_of_the_fill() {
        let exterior = [
            Pos2::new(0., 0.),
            Pos2::new(400., 0.),
            Pos2::new(400., 400.),
            Pos2::new(0., 400.),
        ];
        let hole = vec![
            Pos2::new(100., 100.),
            Pos2::new(100., 300.),
            Pos2::new(300., 300.),
            Pos2::new(300., 100.),
        ];
        let mesh = tessellate_polygon(&exterior, &[hole], Color32::RED).unwrap();

        approx::assert_relative_eq!(120_000., mesh_area(&mesh), epsilon = 1.);
    }

    #[test]
    fn closing_vertex_is_dropped() {
        let ring = vec![
            lon_lat(0., 0.),
            lon_lat(0.01, 0.),
            lon_lat(0.01, 0.01),
            lon_lat(0., 0.),
        ];
        assert_eq!(3, ring_to_screen_points(&ring, &viewport()).len());
    }

    #[test]
    fn every_geometry_gets_painted() {
        let features = FeatureCollection::new(vec![
            Feature::new("p", Geometry::Point(lon_lat(0., 0.)), Origin::Drawn),
            Feature::new(
                "l",
                Geometry::line_string(vec![lon_lat(0., 0.), lon_lat(0.01, 0.01)]).unwrap(),
                Origin::Drawn,
            ),
            Feature::new(
                "a",
                Geometry::polygon(
                    vec![lon_lat(0., 0.), lon_lat(0.01, 0.), lon_lat(0.01, 0.01)],
                    vec![],
                )
                .unwrap(),
                Origin::Drawn,
            ),
        ]);
        let viewport = viewport();

        // Point, line, polygon fill and polygon outline.
        let painted = shapes_painted(|painter| {
            paint_features(painter, &viewport, features.features(), &Style::default());
        });
        assert_eq!(4, painted);
    }

    #[test]
    fn markers_get_painted() {
        let nodes = vec![
            OverlayNode {
                marker: MarkerId::from_millis(1),
                screen: Pos2::new(10., 10.),
                active: false,
            },
            OverlayNode {
                marker: MarkerId::from_millis(2),
                screen: Pos2::new(20., 20.),
                active: true,
            },
        ];
        let painted = shapes_painted(|painter| paint_markers(painter, &nodes, &Style::default()));
        assert_eq!(2, painted);
    }
}
