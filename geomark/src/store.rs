//! Single authoritative container for everything the user placed on the map: features drawn
//! with the drawing tool and markers of the overlay. The drawing plugin, the overlay nodes and
//! the measurements are projections of this store, kept up to date through [`Change`]s.

use std::fmt;

use crate::feature::{Feature, FeatureId, Origin};
use crate::position::{Position, same_coordinate};

/// Identifier of a [`Marker`], derived from the time it was created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(String);

impl MarkerId {
    pub(crate) fn from_millis(millis: u64) -> Self {
        Self(format!("marker-{millis}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// User-placed point living outside of the drawing tool's feature set.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    pub position: Position,
    pub created_at_ms: u64,
}

/// Mutation of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    FeatureCreated(FeatureId),
    FeatureUpdated(FeatureId),
    FeatureDeleted(FeatureId),
    DrawnCleared,
    MarkerAdded(MarkerId),
    MarkerMoved(MarkerId),
    MarkerRemoved(MarkerId),
    MarkersCleared,
}

impl Change {
    /// Whether the change affects the drawn feature set (and therefore measurements).
    pub fn touches_features(&self) -> bool {
        matches!(
            self,
            Change::FeatureCreated(_)
                | Change::FeatureUpdated(_)
                | Change::FeatureDeleted(_)
                | Change::DrawnCleared
        )
    }

    /// Whether the change affects markers (and therefore the overlay).
    pub fn touches_markers(&self) -> bool {
        matches!(
            self,
            Change::MarkerAdded(_)
                | Change::MarkerMoved(_)
                | Change::MarkerRemoved(_)
                | Change::MarkersCleared
        )
    }
}

#[derive(Debug, Default)]
pub struct AnnotationStore {
    drawn: Vec<Feature>,
    markers: Vec<Marker>,
}

impl AnnotationStore {
    /// Drawn features, in creation order.
    pub fn drawn(&self) -> &[Feature] {
        &self.drawn
    }

    pub fn drawn_feature(&self, id: &FeatureId) -> Option<&Feature> {
        self.drawn.iter().find(|feature| &feature.id == id)
    }

    /// Insert a drawn feature, or replace the one with the same id keeping its place in the
    /// order.
    pub fn upsert_drawn(&mut self, mut feature: Feature) -> Change {
        feature.origin = Origin::Drawn;
        let id = feature.id.clone();
        if let Some(existing) = self.drawn.iter_mut().find(|f| f.id == id) {
            *existing = feature;
            Change::FeatureUpdated(id)
        } else {
            self.drawn.push(feature);
            Change::FeatureCreated(id)
        }
    }

    pub fn delete_drawn(&mut self, id: &FeatureId) -> Option<Change> {
        let index = self.drawn.iter().position(|f| &f.id == id)?;
        self.drawn.remove(index);
        Some(Change::FeatureDeleted(id.clone()))
    }

    pub fn clear_drawn(&mut self) -> Option<Change> {
        if self.drawn.is_empty() {
            return None;
        }
        self.drawn.clear();
        Some(Change::DrawnCleared)
    }

    /// Markers, in creation order.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn marker(&self, id: &MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|marker| &marker.id == id)
    }

    /// Most recently created marker located exactly at `position`.
    pub fn marker_at(&self, position: Position) -> Option<&Marker> {
        self.markers
            .iter()
            .rev()
            .find(|marker| same_coordinate(marker.position, position))
    }

    pub(crate) fn add_marker(&mut self, marker: Marker) -> Change {
        let id = marker.id.clone();
        self.markers.push(marker);
        Change::MarkerAdded(id)
    }

    pub(crate) fn move_marker(&mut self, id: &MarkerId, position: Position) -> Option<Change> {
        let marker = self.markers.iter_mut().find(|marker| &marker.id == id)?;
        marker.position = position;
        Some(Change::MarkerMoved(id.clone()))
    }

    pub(crate) fn remove_marker(&mut self, id: &MarkerId) -> Option<Change> {
        let index = self.markers.iter().position(|marker| &marker.id == id)?;
        self.markers.remove(index);
        Some(Change::MarkerRemoved(id.clone()))
    }

    pub(crate) fn clear_markers(&mut self) -> Option<Change> {
        if self.markers.is_empty() {
            return None;
        }
        self.markers.clear();
        Some(Change::MarkersCleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Geometry;
    use crate::lon_lat;

    fn point(id: &str, lon: f64, lat: f64) -> Feature {
        Feature::new(id, Geometry::Point(lon_lat(lon, lat)), Origin::Imported)
    }

    fn marker(millis: u64, lon: f64, lat: f64) -> Marker {
        Marker {
            id: MarkerId::from_millis(millis),
            position: lon_lat(lon, lat),
            created_at_ms: millis,
        }
    }

    #[test]
    fn upsert_keeps_order_and_marks_origin() {
        let mut store = AnnotationStore::default();
        assert_eq!(
            Change::FeatureCreated("a".into()),
            store.upsert_drawn(point("a", 0., 0.))
        );
        store.upsert_drawn(point("b", 1., 1.));
        assert_eq!(
            Change::FeatureUpdated("a".into()),
            store.upsert_drawn(point("a", 5., 5.))
        );

        let ids: Vec<_> = store.drawn().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(vec!["a", "b"], ids);
        assert!(store.drawn().iter().all(|f| f.origin == Origin::Drawn));
        assert_eq!(
            Geometry::Point(lon_lat(5., 5.)),
            store.drawn_feature(&"a".into()).unwrap().geometry
        );
    }

    #[test]
    fn deleting_and_clearing() {
        let mut store = AnnotationStore::default();
        store.upsert_drawn(point("a", 0., 0.));
        assert_eq!(None, store.delete_drawn(&"missing".into()));
        assert_eq!(
            Some(Change::FeatureDeleted("a".into())),
            store.delete_drawn(&"a".into())
        );
        assert_eq!(None, store.clear_drawn());
    }

    #[test]
    fn marker_at_prefers_the_latest() {
        let mut store = AnnotationStore::default();
        store.add_marker(marker(1, 10., 20.));
        store.add_marker(marker(2, 10., 20.));
        store.add_marker(marker(3, 11., 20.));

        assert_eq!(
            "marker-2",
            store.marker_at(lon_lat(10., 20.)).unwrap().id.as_str()
        );
        assert!(store.marker_at(lon_lat(10., 20.000_001)).is_none());
    }

    #[test]
    fn moving_and_removing_markers() {
        let mut store = AnnotationStore::default();
        store.add_marker(marker(1, 10., 20.));
        let id = MarkerId::from_millis(1);

        assert_eq!(
            Some(Change::MarkerMoved(id.clone())),
            store.move_marker(&id, lon_lat(0., 0.))
        );
        assert_eq!(lon_lat(0., 0.), store.marker(&id).unwrap().position);
        assert_eq!(Some(Change::MarkerRemoved(id.clone())), store.remove_marker(&id));
        assert_eq!(None, store.remove_marker(&id));
        assert_eq!(None, store.clear_markers());
    }

    #[test]
    fn change_classification() {
        assert!(Change::DrawnCleared.touches_features());
        assert!(!Change::DrawnCleared.touches_markers());
        assert!(Change::MarkersCleared.touches_markers());
        assert!(!Change::MarkerAdded(MarkerId::from_millis(0)).touches_features());
    }
}
