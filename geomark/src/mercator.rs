//! Project the lat/lon coordinates into a 2D x/y using the Web Mercator.
//! <https://en.wikipedia.org/wiki/Web_Mercator_projection>
//! <https://wiki.openstreetmap.org/wiki/Slippy_map_tilenames>

use crate::position::{Pixels, Position, lon_lat};
use std::f64::consts::PI;

/// Size of a single tile in pixels. Both Mapbox and OSM raster styles use 256px tiles.
const TILE_SIZE: f64 = 256.;

/// Latitude beyond which Web Mercator is undefined (it goes to infinity at the poles).
pub(crate) const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Zoom specifies how many pixels are in the whole map. Zoom 0 means that the whole world is
/// just one 256x256 tile, zoom 1 means that it is 2x2 tiles, and so on.
pub(crate) fn total_pixels(zoom: f64) -> f64 {
    2f64.powf(zoom) * TILE_SIZE
}

/// Project the position into the Mercator projection and normalize it to 0-1 range.
fn mercator_normalized(position: Position) -> (f64, f64) {
    let x = position.x().to_radians();
    let y = position
        .y()
        .clamp(-MAX_LATITUDE, MAX_LATITUDE)
        .to_radians()
        .tan()
        .asinh();

    let x = (1. + (x / PI)) / 2.;
    let y = (1. - (y / PI)) / 2.;

    (x, y)
}

/// Project geographical position onto the world bitmap for given zoom.
pub(crate) fn project(position: Position, zoom: f64) -> Pixels {
    let total_pixels = total_pixels(zoom);
    let (x, y) = mercator_normalized(position);
    Pixels::new(x * total_pixels, y * total_pixels)
}

/// Transforms world bitmap pixels back into a geographical position.
pub(crate) fn unproject(pixels: Pixels, zoom: f64) -> Position {
    let total_pixels = total_pixels(zoom);

    let lon = pixels.x() / total_pixels;
    let lon = ((lon * 2. - 1.) * PI).to_degrees();

    let lat = pixels.y() / total_pixels;
    let lat = ((-lat * 2. + 1.) * PI).sinh().atan().to_degrees();

    lon_lat(lon, lat)
}
