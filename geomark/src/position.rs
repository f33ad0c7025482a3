//! Types and functions for working with positions.

/// Geographical position with longitude (`x`) and latitude (`y`), in degrees.
pub type Position = geo_types::Point;

/// Construct `Position` from latitude and longitude.
pub fn lat_lon(lat: f64, lon: f64) -> Position {
    Position::new(lon, lat)
}

/// Construct `Position` from longitude and latitude. This is the order used by GeoJSON and KML,
/// while people usually write the latitude first (e.g. `40.7128, -74.0060` is New York).
pub fn lon_lat(lon: f64, lat: f64) -> Position {
    Position::new(lon, lat)
}

/// Whether two positions denote exactly the same coordinate.
///
/// Plain `f64` equality of both components, so `0.0` equals `-0.0` and `NaN` equals nothing.
pub fn same_coordinate(a: Position, b: Position) -> bool {
    a.x() == b.x() && a.y() == b.y()
}

/// Whether both components are finite numbers.
pub(crate) fn is_finite(position: Position) -> bool {
    position.x().is_finite() && position.y().is_finite()
}

/// Location projected on the "world bitmap" of a given zoom level.
pub type Pixels = geo_types::Point;

pub trait PixelsExt {
    fn to_vec2(&self) -> egui::Vec2;
}

impl PixelsExt for Pixels {
    fn to_vec2(&self) -> egui::Vec2 {
        egui::Vec2::new(self.x() as f32, self.y() as f32)
    }
}
