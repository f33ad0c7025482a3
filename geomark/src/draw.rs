//! Drawing tool state machine, the drawing plugin interface and an in-memory plugin.

use crate::{
    Position,
    feature::{Feature, FeatureCollection, FeatureId, Geometry, InvalidGeometry, Origin},
};

/// Tool selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Pick and move existing features. Nothing gets created.
    #[default]
    Select,
    Point,
    Polygon,
    Line,
}

impl Tool {
    pub fn mode(self) -> DrawMode {
        match self {
            Tool::Select => DrawMode::SimpleSelect,
            Tool::Point => DrawMode::DrawPoint,
            Tool::Polygon => DrawMode::DrawPolygon,
            Tool::Line => DrawMode::DrawLineString,
        }
    }
}

/// Mode of the drawing plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    #[default]
    SimpleSelect,
    DrawPoint,
    DrawPolygon,
    DrawLineString,
}

impl DrawMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DrawMode::SimpleSelect => "simple_select",
            DrawMode::DrawPoint => "draw_point",
            DrawMode::DrawPolygon => "draw_polygon",
            DrawMode::DrawLineString => "draw_line_string",
        }
    }
}

/// Feature mutations raised by a [`DrawingPlugin`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawEvent {
    Create(Vec<Feature>),
    Update(Vec<Feature>),
    Delete(Vec<FeatureId>),
}

/// Drawing primitive which lets the user sketch features on the map. User edits are reported
/// back as [`DrawEvent`]s, while the methods below are only called by the engine and must not
/// raise events.
pub trait DrawingPlugin {
    fn change_mode(&mut self, mode: DrawMode);

    /// Every feature the plugin currently holds.
    fn get_all(&self) -> FeatureCollection;

    fn add(&mut self, feature: Feature);

    fn delete(&mut self, id: &FeatureId);

    fn delete_all(&mut self);
}

/// Keeps track of the selected [`Tool`].
#[derive(Debug, Default)]
pub struct DrawingTool {
    tool: Tool,
}

impl DrawingTool {
    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn select(&mut self, tool: Tool, plugin: &mut dyn DrawingPlugin) {
        log::debug!("Switching to {tool:?} ({}).", tool.mode().as_str());
        self.tool = tool;
        plugin.change_mode(tool.mode());
    }

    /// Go back to [`Tool::Select`] once something got created.
    pub fn observe(&mut self, event: &DrawEvent, plugin: &mut dyn DrawingPlugin) {
        if matches!(event, DrawEvent::Create(_)) && self.tool != Tool::Select {
            self.select(Tool::Select, plugin);
        }
    }
}

/// [`DrawingPlugin`] holding features in memory, driven by clicks delivered by the host.
#[derive(Debug, Default)]
pub struct SketchPad {
    mode: DrawMode,
    features: Vec<Feature>,
    vertices: Vec<Position>,
    created: u64,
}

impl SketchPad {
    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Vertices clicked so far for the line or polygon being drawn.
    pub fn vertices(&self) -> &[Position] {
        &self.vertices
    }

    /// Handle a click on the map. A point is created right away, line and polygon vertices
    /// accumulate until [`SketchPad::finish`].
    pub fn click(&mut self, position: Position) -> Option<DrawEvent> {
        match self.mode {
            DrawMode::SimpleSelect => None,
            DrawMode::DrawPoint => Some(self.create(Geometry::Point(position))),
            DrawMode::DrawPolygon | DrawMode::DrawLineString => {
                self.vertices.push(position);
                None
            }
        }
    }

    /// Create the line or polygon from the clicked vertices.
    ///
    /// The vertices are discarded even if they do not make a valid geometry.
    pub fn finish(&mut self) -> Result<Option<DrawEvent>, InvalidGeometry> {
        let vertices = std::mem::take(&mut self.vertices);
        let geometry = match self.mode {
            DrawMode::DrawLineString => Geometry::line_string(vertices)?,
            DrawMode::DrawPolygon => Geometry::polygon(vertices, Vec::new())?,
            DrawMode::SimpleSelect | DrawMode::DrawPoint => return Ok(None),
        };
        Ok(Some(self.create(geometry)))
    }

    /// Drag a feature by the given number of degrees. Only possible in the select mode.
    pub fn move_feature(&mut self, id: &FeatureId, d_lon: f64, d_lat: f64) -> Option<DrawEvent> {
        if self.mode != DrawMode::SimpleSelect {
            return None;
        }
        let feature = self.features.iter_mut().find(|f| &f.id == id)?;
        feature.geometry.translate(d_lon, d_lat);
        Some(DrawEvent::Update(vec![feature.clone()]))
    }

    /// Delete a feature on behalf of the user.
    pub fn trash(&mut self, id: &FeatureId) -> Option<DrawEvent> {
        let index = self.features.iter().position(|f| &f.id == id)?;
        self.features.remove(index);
        Some(DrawEvent::Delete(vec![id.clone()]))
    }

    fn create(&mut self, geometry: Geometry) -> DrawEvent {
        self.created += 1;
        let feature = Feature::new(
            FeatureId::new(format!("sketch-{}", self.created)),
            geometry,
            Origin::Drawn,
        );
        self.features.push(feature.clone());
        DrawEvent::Create(vec![feature])
    }
}

impl DrawingPlugin for SketchPad {
    fn change_mode(&mut self, mode: DrawMode) {
        self.mode = mode;
        self.vertices.clear();
    }

    fn get_all(&self) -> FeatureCollection {
        self.features.iter().cloned().collect()
    }

    fn add(&mut self, feature: Feature) {
        match self.features.iter_mut().find(|f| f.id == feature.id) {
            Some(existing) => *existing = feature,
            None => self.features.push(feature),
        }
    }

    fn delete(&mut self, id: &FeatureId) {
        self.features.retain(|f| &f.id != id);
    }

    fn delete_all(&mut self) {
        self.features.clear();
        self.vertices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{feature::GeometryType, lon_lat};

    #[test]
    fn tools_map_to_plugin_modes() {
        let mut tool = DrawingTool::default();
        let mut pad = SketchPad::default();
        assert_eq!(Tool::Select, tool.tool());

        for (selected, mode) in [
            (Tool::Point, "draw_point"),
            (Tool::Polygon, "draw_polygon"),
            (Tool::Line, "draw_line_string"),
            (Tool::Select, "simple_select"),
        ] {
            tool.select(selected, &mut pad);
            assert_eq!(selected, tool.tool());
            assert_eq!(mode, pad.mode().as_str());
        }
    }

    #[test]
    fn creation_returns_to_select() {
        let mut tool = DrawingTool::default();
        let mut pad = SketchPad::default();

        tool.select(Tool::Point, &mut pad);
        let event = pad.click(lon_lat(1., 2.)).unwrap();
        tool.observe(&event, &mut pad);

        assert_eq!(Tool::Select, tool.tool());
        assert_eq!(DrawMode::SimpleSelect, pad.mode());
    }

    #[test]
    fn updates_do_not_change_the_tool() {
        let mut tool = DrawingTool::default();
        let mut pad = SketchPad::default();
        tool.select(Tool::Line, &mut pad);

        tool.observe(&DrawEvent::Delete(vec!["x".into()]), &mut pad);
        assert_eq!(Tool::Line, tool.tool());
    }

    #[test]
    fn select_mode_creates_nothing() {
        let mut pad = SketchPad::default();
        assert_eq!(None, pad.click(lon_lat(1., 2.)));
        assert!(pad.get_all().is_empty());
    }

    #[test]
    fn polygon_is_closed_on_finish() {
        let mut pad = SketchPad::default();
        pad.change_mode(DrawMode::DrawPolygon);
        for position in [lon_lat(0., 0.), lon_lat(1., 0.), lon_lat(1., 1.)] {
            assert_eq!(None, pad.click(position));
        }
        assert_eq!(3, pad.vertices().len());

        let Some(DrawEvent::Create(created)) = pad.finish().unwrap() else {
            panic!("expected a created polygon");
        };
        assert_eq!(GeometryType::Polygon, created[0].geometry.geometry_type());
        assert_eq!(4, created[0].geometry.positions().count());
        assert!(pad.vertices().is_empty());
    }

    #[test]
    fn degenerate_line_is_discarded() {
        let mut pad = SketchPad::default();
        pad.change_mode(DrawMode::DrawLineString);
        pad.click(lon_lat(0., 0.));

        assert!(pad.finish().is_err());
        assert!(pad.vertices().is_empty());
        assert!(pad.features().is_empty());
    }

    #[test]
    fn moving_and_trashing() {
        let mut pad = SketchPad::default();
        pad.change_mode(DrawMode::DrawPoint);
        pad.click(lon_lat(0., 0.));
        let id = FeatureId::new("sketch-1");

        // Not in the select mode yet.
        assert_eq!(None, pad.move_feature(&id, 1., 1.));

        pad.change_mode(DrawMode::SimpleSelect);
        let Some(DrawEvent::Update(updated)) = pad.move_feature(&id, 1., 1.) else {
            panic!("expected an update");
        };
        assert_eq!(Geometry::Point(lon_lat(1., 1.)), updated[0].geometry);

        assert_eq!(Some(DrawEvent::Delete(vec![id.clone()])), pad.trash(&id));
        assert_eq!(None, pad.trash(&id));
    }
}
