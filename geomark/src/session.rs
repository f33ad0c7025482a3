//! Map session: the viewport, projection and base rendering the engine draws on.

use std::collections::BTreeMap;

use egui::{Pos2, Rect, Vec2};

use crate::{
    Position,
    feature::FeatureCollection,
    layers::LayerId,
    mercator::{project, unproject},
    position::{Pixels, PixelsExt as _},
    render::{self, Style},
    zoom::{InvalidZoom, Zoom},
};

/// Zoom used when fitting the view to bounds which have no extent, such as a single point.
const POINT_ZOOM: f64 = 16.;

/// Fraction of the viewport the fitted bounds may take.
const FIT_PADDING: f64 = 0.9;

/// Capabilities the underlying map-rendering engine has to provide.
pub trait MapSession {
    /// Center the view at `center` with the given zoom.
    fn set_view(&mut self, center: Position, zoom: f64) -> Result<(), InvalidZoom>;

    /// Render the features, replacing whatever was rendered under `id` before.
    fn add_layer(&mut self, id: LayerId, features: &FeatureCollection);

    /// Stop rendering features added under `id`.
    fn remove_layer(&mut self, id: LayerId);

    /// Project geographical position into a point on the screen.
    fn project(&self, position: Position) -> Pos2;

    /// Get the geographical position under a point on the screen.
    fn unproject(&self, point: Pos2) -> Position;

    /// Center the view on `bounds`, zooming so that they fit. The provided implementation only
    /// approximates the zoom from the span in degrees.
    fn fit_bounds(&mut self, bounds: geo_types::Rect) {
        let center = bounds.center();
        let span = bounds.width().max(bounds.height());
        if let Err(err) = self.set_view(Position::from(center), approximate_zoom(span)) {
            log::warn!("Could not fit the view to {bounds:?}: {err}");
        }
    }
}

/// Rough zoom level at which `span` degrees fill a typical screen.
fn approximate_zoom(span: f64) -> f64 {
    match span {
        s if s > 60.0 => 2.0,
        s if s > 30.0 => 3.0,
        s if s > 10.0 => 5.0,
        s if s > 5.0 => 7.0,
        s if s > 2.0 => 9.0,
        s if s > 1.0 => 11.0,
        s if s > 0.5 => 12.0,
        s if s > 0.2 => 13.0,
        s if s > 0.05 => 14.0,
        _ => 15.0,
    }
}

/// Events emitted by the map, to be fed into [`crate::Engine::handle_map_event`].
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Map was clicked at a geographical position.
    Click { position: Position, at_ms: u64 },

    /// View was panned or zoomed.
    Move,

    /// Pointer moved over the map.
    MouseMove { screen: Pos2 },
}

/// [`MapSession`] using the Web Mercator projection, which keeps track of rendered layers.
#[derive(Debug, Clone)]
pub struct Viewport {
    rect: Rect,
    center: Position,
    zoom: Zoom,
    rendered: BTreeMap<LayerId, FeatureCollection>,
}

impl Viewport {
    /// Viewport covering `rect` on the screen.
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            center: Position::new(0., 0.),
            zoom: Zoom::default(),
            rendered: BTreeMap::new(),
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn center(&self) -> Position {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom.into()
    }

    /// Drag the map by `delta` pixels, so that its content follows the pointer.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.center = self.unproject(self.rect.center() - delta);
    }

    /// Zoom by a relative value, saturating at the limits.
    pub fn zoom_by(&mut self, delta: f64) {
        self.zoom.zoom_by(delta);
    }

    /// Features rendered under `id`, if any.
    pub fn rendered(&self, id: LayerId) -> Option<&FeatureCollection> {
        self.rendered.get(&id)
    }

    pub fn rendered_layers(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.rendered.keys().copied()
    }

    /// Total number of rendered features across all layers.
    pub fn rendered_feature_count(&self) -> usize {
        self.rendered.values().map(FeatureCollection::len).sum()
    }

    /// Paint every rendered layer.
    pub fn paint(&self, painter: &egui::Painter, style: &Style) {
        for features in self.rendered.values() {
            render::paint_features(painter, self, features.features(), style);
        }
    }

    fn world_center(&self) -> Pixels {
        project(self.center, self.zoom())
    }
}

impl MapSession for Viewport {
    fn set_view(&mut self, center: Position, zoom: f64) -> Result<(), InvalidZoom> {
        self.zoom = Zoom::try_from(zoom)?;
        self.center = center;
        Ok(())
    }

    fn add_layer(&mut self, id: LayerId, features: &FeatureCollection) {
        self.rendered.insert(id, features.clone());
    }

    fn remove_layer(&mut self, id: LayerId) {
        self.rendered.remove(&id);
    }

    fn project(&self, position: Position) -> Pos2 {
        let projected_position = project(position, self.zoom());
        self.rect.center() + (projected_position - self.world_center()).to_vec2()
    }

    fn unproject(&self, point: Pos2) -> Position {
        // World pixel values get large at high zoom levels, so the arithmetic has to be done
        // in f64.
        let world_center = self.world_center();
        let screen_center = self.rect.center();
        let x = world_center.x() + (point.x as f64) - (screen_center.x as f64);
        let y = world_center.y() + (point.y as f64) - (screen_center.y as f64);
        unproject(Pixels::new(x, y), self.zoom())
    }

    fn fit_bounds(&mut self, bounds: geo_types::Rect) {
        let min = project(Position::from(bounds.min()), 0.);
        let max = project(Position::from(bounds.max()), 0.);
        let world_width = (max.x() - min.x()).abs();
        let world_height = (max.y() - min.y()).abs();

        let zoom = if world_width < 1e-9 && world_height < 1e-9 {
            POINT_ZOOM
        } else {
            let scale_x = self.rect.width() as f64 / world_width;
            let scale_y = self.rect.height() as f64 / world_height;
            (scale_x.min(scale_y) * FIT_PADDING).log2().clamp(0., 22.)
        };

        let middle = Pixels::new((min.x() + max.x()) / 2., (min.y() + max.y()) / 2.);
        let center = unproject(middle, 0.);
        if let Err(err) = self.set_view(center, zoom) {
            log::warn!("Could not fit the view to {bounds:?}: {err}");
        }
    }
}
