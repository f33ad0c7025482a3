//! The facade the hosting UI talks to.

use egui::{Painter, Pos2, Shape};
use futures::{AsyncRead, AsyncReadExt as _};

use crate::{
    Position,
    clock::{Clock, IdGenerator, SystemClock},
    draw::{DrawEvent, DrawingPlugin, DrawingTool, Tool},
    error::Error,
    feature::{Feature, FeatureId},
    hover::{self, HoverInfo},
    layers::{Layer, LayerId, LayerRegistry, LayerSummary},
    measure::{Distance, MeasurementEngine, MeasurementSnapshot, Ruler},
    options::Options,
    overlay::{MarkerOverlay, OverlayNode},
    render::{self, Style},
    session::{MapEvent, MapSession},
    store::{AnnotationStore, Change, Marker, MarkerId},
};

/// Proof that [`Engine::begin_import`] succeeded. Hand it back to [`Engine::finish_import`]
/// once the file is read.
#[derive(Debug)]
pub struct ImportTicket {
    filename: String,
}

impl ImportTicket {
    pub fn filename(&self) -> &str {
        &self.filename
    }
}

struct Attached<S, D> {
    session: S,
    drawing: D,
}

/// Keeps the drawn features, markers, imported layers and measurements consistent with each
/// other and with the map.
///
/// Nothing can be done until the map is loaded with [`Engine::load`]. Before that, every
/// action fails with [`Error::UninitializedSession`].
pub struct Engine<S, D, C = SystemClock> {
    options: Options,
    clock: C,
    style: Style,
    attached: Option<Attached<S, D>>,
    store: AnnotationStore,
    tool: DrawingTool,
    layers: LayerRegistry,
    layer_ids: IdGenerator,
    overlay: MarkerOverlay,
    measurement: MeasurementEngine,
    hover: Option<HoverInfo>,
    changes: Vec<Change>,
    pending_import: Option<String>,
}

impl<S: MapSession, D: DrawingPlugin> Engine<S, D> {
    pub fn new(options: Options) -> Self {
        Self::with_clock(options, SystemClock)
    }
}

impl<S: MapSession, D: DrawingPlugin, C: Clock> Engine<S, D, C> {
    /// Engine taking layer identifiers from the given clock.
    pub fn with_clock(options: Options, clock: C) -> Self {
        Self {
            overlay: MarkerOverlay::new(options.double_click_threshold_ms),
            options,
            clock,
            style: Style::default(),
            attached: None,
            store: AnnotationStore::default(),
            tool: DrawingTool::default(),
            layers: LayerRegistry::default(),
            layer_ids: IdGenerator::default(),
            measurement: MeasurementEngine::default(),
            hover: None,
            changes: Vec::new(),
            pending_import: None,
        }
    }

    /// Map finished loading. Sets the initial view, puts the drawing plugin into the select
    /// mode and takes over whatever features it already holds.
    pub fn load(&mut self, mut session: S, mut drawing: D) -> Result<(), Error> {
        session.set_view(self.options.center(), self.options.zoom)?;
        self.tool.select(Tool::Select, &mut drawing);

        let existing = drawing.get_all();
        self.attached = Some(Attached { session, drawing });
        log::info!("Map loaded with {} drawn features.", existing.len());

        for feature in existing {
            // Degenerate features are left out, the rest still loads.
            let Ok(feature) = validated(feature) else {
                continue;
            };
            let change = self.store.upsert_drawn(feature);
            self.propagate(change);
        }
        self.reproject();
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.attached.is_some()
    }

    pub fn select_tool(&mut self, tool: Tool) -> Result<(), Error> {
        let attached = require(&mut self.attached, "select_tool")?;
        self.tool.select(tool, &mut attached.drawing);
        Ok(())
    }

    /// Import `text` as a new layer, the format being picked by the extension of `filename`.
    pub fn import_file(&mut self, filename: &str, text: &str) -> Result<LayerSummary, Error> {
        let attached = require(&mut self.attached, "import_file")?;
        let id = LayerId::new(self.layer_ids.next(self.clock.now_ms()));
        let summary = self
            .layers
            .import(&mut attached.session, id, filename, text)?;
        // Fitting the view moved the map.
        self.reproject();
        Ok(summary)
    }

    /// Read the whole `reader` and import it.
    pub async fn import_from<R>(
        &mut self,
        filename: &str,
        mut reader: R,
    ) -> Result<LayerSummary, Error>
    where
        R: AsyncRead + Unpin,
    {
        require(&mut self.attached, "import_from")?;

        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .await
            .map_err(|source| Error::Read {
                filename: filename.to_owned(),
                source,
            })?;
        self.import_file(filename, &text)
    }

    /// Start importing a file read by the host. Only one such import may be in progress.
    pub fn begin_import(&mut self, filename: &str) -> Result<ImportTicket, Error> {
        require(&mut self.attached, "begin_import")?;
        if let Some(pending) = &self.pending_import {
            log::warn!("Not importing {filename}, {pending} is still being read.");
            return Err(Error::ImportInProgress(pending.clone()));
        }
        self.pending_import = Some(filename.to_owned());
        Ok(ImportTicket {
            filename: filename.to_owned(),
        })
    }

    /// Import the file started with [`Engine::begin_import`], given the outcome of reading it.
    pub fn finish_import(
        &mut self,
        ticket: ImportTicket,
        read: std::io::Result<String>,
    ) -> Result<LayerSummary, Error> {
        self.pending_import = None;
        let text = read.map_err(|source| Error::Read {
            filename: ticket.filename.clone(),
            source,
        })?;
        self.import_file(&ticket.filename, &text)
    }

    /// Show or hide a layer, returning whether it is visible now.
    pub fn toggle_layer_visibility(&mut self, id: LayerId) -> Result<bool, Error> {
        let attached = require(&mut self.attached, "toggle_layer_visibility")?;
        self.layers.toggle_visibility(&mut attached.session, id)
    }

    pub fn remove_layer(&mut self, id: LayerId) -> Result<Layer, Error> {
        let attached = require(&mut self.attached, "remove_layer")?;
        self.layers.remove(&mut attached.session, id)
    }

    /// Add a drawn feature on behalf of the host, e.g. when restoring a sketch.
    pub fn add_drawn(&mut self, feature: Feature) -> Result<(), Error> {
        let attached = require(&mut self.attached, "add_drawn")?;
        let feature = validated(feature)?;
        attached.drawing.add(feature.clone());
        let change = self.store.upsert_drawn(feature);
        self.propagate(change);
        Ok(())
    }

    /// Delete a drawn feature on behalf of the host. Returns whether it existed.
    pub fn delete_drawn(&mut self, id: &FeatureId) -> Result<bool, Error> {
        let attached = require(&mut self.attached, "delete_drawn")?;
        attached.drawing.delete(id);
        match self.store.delete_drawn(id) {
            Some(change) => {
                self.propagate(change);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove every drawn feature and every marker.
    pub fn clear_all_drawn(&mut self) -> Result<(), Error> {
        let attached = require(&mut self.attached, "clear_all_drawn")?;
        attached.drawing.delete_all();

        let changes = [self.store.clear_drawn(), self.store.clear_markers()];
        for change in changes.into_iter().flatten() {
            self.propagate(change);
        }
        Ok(())
    }

    /// Switch the measure mode, returning whether it is on now.
    pub fn toggle_measure_mode(&mut self) -> Result<bool, Error> {
        require(&mut self.attached, "toggle_measure_mode")?;
        let active = self.measurement.toggle_ruler();
        log::debug!("Measure mode {}.", if active { "on" } else { "off" });
        Ok(active)
    }

    pub fn clear_measurements(&mut self) -> Result<(), Error> {
        require(&mut self.attached, "clear_measurements")?;
        self.measurement.clear_ruler();
        Ok(())
    }

    pub fn handle_map_event(&mut self, event: MapEvent) -> Result<(), Error> {
        let attached = require(&mut self.attached, "handle_map_event")?;
        log::debug!("Map event: {event:?}");

        match event {
            MapEvent::Click { position, at_ms } => {
                if self.measurement.ruler().active {
                    self.measurement.extend_ruler(position);
                } else if let Some(change) = self.overlay.click(&mut self.store, position, at_ms) {
                    self.propagate(change);
                }
            }
            MapEvent::Move => self.overlay.sync(&self.store, &attached.session),
            MapEvent::MouseMove { screen } => {
                if self.overlay.dragged().is_some() {
                    self.overlay.drag(&attached.session, screen);
                } else {
                    self.hover = hover::hit_test(
                        &attached.session,
                        self.measurement.utility(),
                        self.store.markers(),
                        self.store.drawn(),
                        screen,
                    );
                }
            }
        }
        Ok(())
    }

    /// Observe features created, updated or deleted with the drawing plugin.
    ///
    /// An event carrying a degenerate feature is rejected as a whole.
    pub fn handle_draw_event(&mut self, event: DrawEvent) -> Result<(), Error> {
        let attached = require(&mut self.attached, "handle_draw_event")?;
        let event = match event {
            DrawEvent::Create(features) => DrawEvent::Create(validated_all(features)?),
            DrawEvent::Update(features) => DrawEvent::Update(validated_all(features)?),
            DrawEvent::Delete(ids) => DrawEvent::Delete(ids),
        };
        self.tool.observe(&event, &mut attached.drawing);

        let changes: Vec<Change> = match event {
            DrawEvent::Create(features) | DrawEvent::Update(features) => features
                .into_iter()
                .map(|feature| self.store.upsert_drawn(feature))
                .collect(),
            DrawEvent::Delete(ids) => ids
                .iter()
                .filter_map(|id| self.store.delete_drawn(id))
                .collect(),
        };
        for change in changes {
            self.propagate(change);
        }
        Ok(())
    }

    /// Marker node was double clicked.
    pub fn marker_double_click(&mut self, id: &MarkerId) -> Result<(), Error> {
        require(&mut self.attached, "marker_double_click")?;
        let change = self.overlay.double_click(&mut self.store, id)?;
        self.propagate(change);
        Ok(())
    }

    pub fn marker_drag_start(&mut self, id: &MarkerId) -> Result<(), Error> {
        require(&mut self.attached, "marker_drag_start")?;
        self.overlay.drag_start(&self.store, id)
    }

    /// Pointer moved while dragging a marker node. Returns where the marker would be dropped.
    pub fn marker_drag(&mut self, screen: Pos2) -> Result<Option<Position>, Error> {
        let attached = require(&mut self.attached, "marker_drag")?;
        Ok(self.overlay.drag(&attached.session, screen))
    }

    pub fn marker_drag_end(&mut self) -> Result<(), Error> {
        require(&mut self.attached, "marker_drag_end")?;
        if let Some(change) = self.overlay.drag_end(&mut self.store) {
            self.propagate(change);
        }
        Ok(())
    }

    /// Paint drawn features, the ruler and the marker nodes on top of the map.
    pub fn paint_overlay(&self, painter: &Painter) -> Result<(), Error> {
        let Some(attached) = &self.attached else {
            log::warn!("Ignoring paint_overlay, the map is not loaded yet.");
            return Err(Error::UninitializedSession);
        };
        render::paint_features(painter, &attached.session, self.store.drawn(), &self.style);

        let ruler = self.measurement.ruler();
        if ruler.points.len() >= 2 {
            let points: Vec<Pos2> = ruler
                .points
                .iter()
                .map(|p| attached.session.project(*p))
                .collect();
            painter.extend(Shape::dashed_line(&points, self.style.line_stroke, 6., 4.));
        }

        render::paint_markers(painter, self.overlay.nodes(), &self.style);
        Ok(())
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn set_style(&mut self, style: Style) {
        self.style = style;
    }

    pub fn layers(&self) -> Vec<LayerSummary> {
        self.layers.summaries()
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id)
    }

    pub fn markers(&self) -> &[Marker] {
        self.store.markers()
    }

    pub fn drawn(&self) -> &[Feature] {
        self.store.drawn()
    }

    pub fn measurement(&self) -> MeasurementSnapshot {
        self.measurement.snapshot()
    }

    pub fn ruler(&self) -> &Ruler {
        self.measurement.ruler()
    }

    pub fn ruler_distance(&self) -> Option<Distance> {
        self.measurement.ruler().distance
    }

    /// What was under the pointer on the last [`MapEvent::MouseMove`].
    pub fn hover(&self) -> Option<HoverInfo> {
        self.hover
    }

    pub fn overlay_nodes(&self) -> &[OverlayNode] {
        self.overlay.nodes()
    }

    /// Topmost marker node under a point on the screen.
    pub fn node_at(&self, screen: Pos2) -> Option<&OverlayNode> {
        self.overlay.node_at(screen, self.style.marker_radius)
    }

    /// Changes of the drawn features and markers since the last call.
    pub fn drain_changes(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.changes)
    }

    pub fn tool(&self) -> Tool {
        self.tool.tool()
    }

    pub fn session(&self) -> Option<&S> {
        self.attached.as_ref().map(|attached| &attached.session)
    }

    /// Mutable access to the session, e.g. for panning. Follow up with [`MapEvent::Move`].
    pub fn session_mut(&mut self) -> Option<&mut S> {
        self.attached.as_mut().map(|attached| &mut attached.session)
    }

    pub fn drawing(&self) -> Option<&D> {
        self.attached.as_ref().map(|attached| &attached.drawing)
    }

    /// Mutable access to the drawing plugin, to feed it user input. Events it raises go to
    /// [`Engine::handle_draw_event`].
    pub fn drawing_mut(&mut self) -> Option<&mut D> {
        self.attached.as_mut().map(|attached| &mut attached.drawing)
    }

    fn reproject(&mut self) {
        if let Some(attached) = &self.attached {
            self.overlay.sync(&self.store, &attached.session);
        }
    }

    /// Bring measurements and the overlay up to date with a change of the store.
    fn propagate(&mut self, change: Change) {
        if change.touches_features() {
            self.measurement.recompute(self.store.drawn());
        }
        if change.touches_markers() {
            self.reproject();
        }
        self.changes.push(change);
    }
}

fn validated(feature: Feature) -> Result<Feature, Error> {
    let id = feature.id.clone();
    feature.validated().map_err(|source| {
        log::warn!("Rejecting feature {id}: {source}");
        Error::InvalidFeature { id, source }
    })
}

fn validated_all(features: Vec<Feature>) -> Result<Vec<Feature>, Error> {
    features.into_iter().map(validated).collect()
}

fn require<'a, S, D>(
    attached: &'a mut Option<Attached<S, D>>,
    action: &str,
) -> Result<&'a mut Attached<S, D>, Error> {
    match attached {
        Some(attached) => Ok(attached),
        None => {
            log::warn!("Ignoring {action}, the map is not loaded yet.");
            Err(Error::UninitializedSession)
        }
    }
}
