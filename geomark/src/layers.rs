//! Imported layers and their visibility.

use std::fmt;

use crate::{
    error::Error,
    feature::FeatureCollection,
    import::{self, SourceFormat},
    session::MapSession,
};

/// Identifier of an imported [`Layer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u64);

impl LayerId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer-{}", self.0)
    }
}

/// Features imported from a single file.
#[derive(Debug, Clone)]
pub struct Layer {
    pub id: LayerId,
    /// Name of the file the layer was imported from.
    pub name: String,
    pub format: SourceFormat,
    pub visible: bool,
    pub features: FeatureCollection,
}

/// What the layer list shows about a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSummary {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub format: SourceFormat,
    pub feature_count: usize,
}

impl From<&Layer> for LayerSummary {
    fn from(layer: &Layer) -> Self {
        Self {
            id: layer.id,
            name: layer.name.clone(),
            visible: layer.visible,
            format: layer.format,
            feature_count: layer.features.len(),
        }
    }
}

/// Ordered list of imported layers, mirrored into the session's rendering.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    layers: Vec<Layer>,
}

impl LayerRegistry {
    /// Normalize `text` and add it as a new, visible layer rendered by the session. The view is
    /// then fitted to the layer's features, unless there are none.
    ///
    /// Nothing changes if the text cannot be normalized.
    pub fn import(
        &mut self,
        session: &mut dyn MapSession,
        id: LayerId,
        filename: &str,
        text: &str,
    ) -> Result<LayerSummary, Error> {
        let (format, features) = import::normalize(text, filename)?;

        session.add_layer(id, &features);
        if let Some(bounds) = features.bounds() {
            session.fit_bounds(bounds);
        }

        let layer = Layer {
            id,
            name: filename.to_owned(),
            format,
            visible: true,
            features,
        };
        let summary = LayerSummary::from(&layer);
        log::info!(
            "Imported {} {format} features from {filename} as {id}.",
            summary.feature_count
        );
        self.layers.push(layer);
        Ok(summary)
    }

    /// Flip the layer's visibility, returning the new one.
    pub fn toggle_visibility(
        &mut self,
        session: &mut dyn MapSession,
        id: LayerId,
    ) -> Result<bool, Error> {
        let layer = self
            .layers
            .iter_mut()
            .find(|layer| layer.id == id)
            .ok_or(Error::UnknownLayer(id))?;

        layer.visible = !layer.visible;
        if layer.visible {
            session.add_layer(id, &layer.features);
        } else {
            session.remove_layer(id);
        }
        log::debug!("{id} is now {}.", if layer.visible { "visible" } else { "hidden" });
        Ok(layer.visible)
    }

    /// Remove the layer from both the list and the session.
    pub fn remove(&mut self, session: &mut dyn MapSession, id: LayerId) -> Result<Layer, Error> {
        let index = self
            .layers
            .iter()
            .position(|layer| layer.id == id)
            .ok_or(Error::UnknownLayer(id))?;

        session.remove_layer(id);
        let layer = self.layers.remove(index);
        log::info!("Removed {id} ({}).", layer.name);
        Ok(layer)
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn summaries(&self) -> Vec<LayerSummary> {
        self.layers.iter().map(LayerSummary::from).collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::ImportError;
    use crate::session::Viewport;
    use egui::{Pos2, Rect, Vec2};

    const TWO_POINTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [19.9, 50.0]}, "properties": {}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [21.0, 52.2]}, "properties": {}}
        ]
    }"#;

    fn viewport() -> Viewport {
        Viewport::new(Rect::from_min_size(Pos2::ZERO, Vec2::new(800., 600.)))
    }

    #[test]
    fn import_renders_and_fits_the_view() {
        let mut viewport = viewport();
        let mut layers = LayerRegistry::default();

        let summary = layers
            .import(&mut viewport, LayerId::new(1), "cities.geojson", TWO_POINTS)
            .unwrap();

        assert_eq!(
            LayerSummary {
                id: LayerId::new(1),
                name: "cities.geojson".to_owned(),
                visible: true,
                format: SourceFormat::GeoJson,
                feature_count: 2,
            },
            summary
        );
        assert_eq!(2, viewport.rendered_feature_count());
        approx::assert_relative_eq!(viewport.center().x(), 20.45, epsilon = 1e-6);
    }

    #[test]
    fn empty_import_does_not_move_the_view() {
        let mut viewport = viewport();
        let center = viewport.center();
        let mut layers = LayerRegistry::default();

        layers
            .import(
                &mut viewport,
                LayerId::new(1),
                "empty.geojson",
                r#"{"type": "FeatureCollection", "features": []}"#,
            )
            .unwrap();

        assert_eq!(center, viewport.center());
        assert_eq!(1, layers.len());
    }

    #[test]
    fn failed_import_changes_nothing() {
        let mut viewport = viewport();
        let mut layers = LayerRegistry::default();

        let result = layers.import(&mut viewport, LayerId::new(1), "ortho.tiff", TWO_POINTS);

        assert!(matches!(
            result,
            Err(Error::Import(ImportError::UnsupportedFormat(_)))
        ));
        assert!(layers.is_empty());
        assert_eq!(0, viewport.rendered_layers().count());
    }

    #[test]
    fn toggling_twice_restores_the_layer() {
        let mut viewport = viewport();
        let mut layers = LayerRegistry::default();
        let id = LayerId::new(7);
        layers.import(&mut viewport, id, "cities.geojson", TWO_POINTS).unwrap();

        assert!(!layers.toggle_visibility(&mut viewport, id).unwrap());
        assert_eq!(None, viewport.rendered(id));

        assert!(layers.toggle_visibility(&mut viewport, id).unwrap());
        assert_eq!(Some(&layers.get(id).unwrap().features), viewport.rendered(id));
    }

    #[test]
    fn removing_unknown_layer_fails_without_side_effects() {
        let mut viewport = viewport();
        let mut layers = LayerRegistry::default();
        layers
            .import(&mut viewport, LayerId::new(1), "cities.geojson", TWO_POINTS)
            .unwrap();

        assert!(matches!(
            layers.remove(&mut viewport, LayerId::new(2)),
            Err(Error::UnknownLayer(id)) if id == LayerId::new(2)
        ));
        assert_eq!(1, layers.len());
        assert_eq!(1, viewport.rendered_layers().count());

        layers.remove(&mut viewport, LayerId::new(1)).unwrap();
        assert!(layers.is_empty());
        assert_eq!(0, viewport.rendered_layers().count());
    }
}
