//! Marker overlay: screen-space nodes of the markers, kept in sync with the viewport.
//!
//! Markers are created and removed through two channels. A click on the map creates a marker,
//! unless it comes within the double click threshold after the previous click, in which case
//! it removes the latest marker placed exactly where that previous click landed. Double
//! clicking a node removes its marker directly.

use egui::Pos2;

use crate::{
    Position,
    clock::IdGenerator,
    error::Error,
    session::MapSession,
    store::{AnnotationStore, Change, Marker, MarkerId},
};

/// Rendered marker.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayNode {
    pub marker: MarkerId,
    pub screen: Pos2,
    /// Being dragged.
    pub active: bool,
}

#[derive(Debug, Clone, Copy)]
struct LastClick {
    at_ms: u64,
    position: Position,
}

#[derive(Debug, Clone)]
struct Drag {
    marker: MarkerId,
    position: Position,
}

#[derive(Debug)]
pub struct MarkerOverlay {
    threshold_ms: u64,
    last_click: Option<LastClick>,
    /// Back to front.
    nodes: Vec<OverlayNode>,
    drag: Option<Drag>,
    ids: IdGenerator,
}

impl MarkerOverlay {
    pub fn new(threshold_ms: u64) -> Self {
        Self {
            threshold_ms,
            last_click: None,
            nodes: Vec::new(),
            drag: None,
            ids: IdGenerator::default(),
        }
    }

    pub fn nodes(&self) -> &[OverlayNode] {
        &self.nodes
    }

    /// Marker being dragged, if any.
    pub fn dragged(&self) -> Option<&MarkerId> {
        self.drag.as_ref().map(|drag| &drag.marker)
    }

    /// Topmost node within `radius` pixels of `screen`.
    pub fn node_at(&self, screen: Pos2, radius: f32) -> Option<&OverlayNode> {
        self.nodes
            .iter()
            .rev()
            .find(|node| node.screen.distance(screen) <= radius)
    }

    /// Handle a click on the map.
    pub fn click(
        &mut self,
        store: &mut AnnotationStore,
        position: Position,
        at_ms: u64,
    ) -> Option<Change> {
        let previous = self.last_click.replace(LastClick { at_ms, position });

        match previous {
            Some(previous) if at_ms.saturating_sub(previous.at_ms) < self.threshold_ms => {
                let Some(marker) = store.marker_at(previous.position) else {
                    log::debug!("Double click, but no marker at {:?}.", previous.position);
                    return None;
                };
                let id = marker.id.clone();
                log::debug!("Double click removes {id}.");
                store.remove_marker(&id)
            }
            _ => {
                let id = MarkerId::from_millis(self.ids.next(at_ms));
                log::debug!("Click creates {id} at {position:?}.");
                Some(store.add_marker(Marker {
                    id,
                    position,
                    created_at_ms: at_ms,
                }))
            }
        }
    }

    /// Remove the marker whose node was double clicked.
    pub fn double_click(
        &mut self,
        store: &mut AnnotationStore,
        id: &MarkerId,
    ) -> Result<Change, Error> {
        store
            .remove_marker(id)
            .ok_or_else(|| Error::UnknownMarker(id.clone()))
    }

    /// Raise the node to the front and start dragging it.
    pub fn drag_start(&mut self, store: &AnnotationStore, id: &MarkerId) -> Result<(), Error> {
        let marker = store
            .marker(id)
            .ok_or_else(|| Error::UnknownMarker(id.clone()))?;

        if let Some(index) = self.nodes.iter().position(|node| &node.marker == id) {
            let mut node = self.nodes.remove(index);
            node.active = true;
            self.nodes.push(node);
        }
        self.drag = Some(Drag {
            marker: id.clone(),
            position: marker.position,
        });
        Ok(())
    }

    /// Move the dragged node under the pointer. Returns the new position, or `None` when
    /// nothing is being dragged.
    pub fn drag(&mut self, session: &dyn MapSession, screen: Pos2) -> Option<Position> {
        let drag = self.drag.as_mut()?;
        drag.position = session.unproject(screen);
        if let Some(node) = self.nodes.iter_mut().find(|node| node.marker == drag.marker) {
            node.screen = screen;
        }
        Some(drag.position)
    }

    /// Finish dragging, storing the position the marker was dropped at.
    pub fn drag_end(&mut self, store: &mut AnnotationStore) -> Option<Change> {
        let drag = self.drag.take()?;
        if let Some(node) = self.nodes.iter_mut().find(|node| node.marker == drag.marker) {
            node.active = false;
        }
        store.move_marker(&drag.marker, drag.position)
    }

    /// Join nodes with the store's markers by id, projecting each one through the session.
    /// Surviving nodes keep their stacking order, new ones go on top.
    pub fn sync(&mut self, store: &AnnotationStore, session: &dyn MapSession) {
        if let Some(drag) = &self.drag
            && store.marker(&drag.marker).is_none()
        {
            self.drag = None;
        }

        self.nodes.retain(|node| store.marker(&node.marker).is_some());
        for marker in store.markers() {
            if !self.nodes.iter().any(|node| node.marker == marker.id) {
                self.nodes.push(OverlayNode {
                    marker: marker.id.clone(),
                    screen: Pos2::ZERO,
                    active: false,
                });
            }
        }

        for node in &mut self.nodes {
            let position = match &self.drag {
                Some(drag) if drag.marker == node.marker => drag.position,
                _ => match store.marker(&node.marker) {
                    Some(marker) => marker.position,
                    None => continue,
                },
            };
            node.screen = session.project(position);
        }
        log::trace!("Reprojected {} markers.", self.nodes.len());
    }
}
