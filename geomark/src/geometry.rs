//! Geodesic length, area and buffering.

use geo::orient::Direction;
use geo::{Destination as _, Distance as _, Geodesic, GeodesicArea as _, Orient as _};
use geo_types::{LineString, Point, Polygon};

/// Number of vertices used to approximate circles produced by [`GeometryUtility::buffer`].
const BUFFER_STEPS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    Meters,
    Kilometers,
    Miles,
}

impl LengthUnit {
    fn meters(self) -> f64 {
        match self {
            LengthUnit::Meters => 1.,
            LengthUnit::Kilometers => 1_000.,
            LengthUnit::Miles => 1_609.344,
        }
    }

    /// Convert a distance in meters to this unit.
    pub fn from_meters(self, meters: f64) -> f64 {
        meters / self.meters()
    }

    /// Convert a distance in this unit to meters.
    pub fn to_meters(self, value: f64) -> f64 {
        value * self.meters()
    }
}

/// Computations over the Earth's surface. Coordinates are `x = longitude`, `y = latitude`.
pub trait GeometryUtility {
    /// Length of the line string, in the given unit.
    fn length(&self, line: &LineString, unit: LengthUnit) -> f64;

    /// Area of the polygon (with holes subtracted), in square meters.
    fn area(&self, polygon: &Polygon) -> f64;

    /// Circle-like polygon of the given radius around the point.
    fn buffer(&self, point: Point, radius: f64, unit: LengthUnit) -> Polygon;
}

/// [`GeometryUtility`] computing on the WGS84 ellipsoid, using Karney's algorithms from `geo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeodesicUtility;

impl GeometryUtility for GeodesicUtility {
    fn length(&self, line: &LineString, unit: LengthUnit) -> f64 {
        let meters: f64 = line
            .lines()
            .map(|segment| Geodesic.distance(segment.start_point(), segment.end_point()))
            .sum();
        unit.from_meters(meters)
    }

    fn area(&self, polygon: &Polygon) -> f64 {
        // A clockwise exterior would be measured as the rest of the globe.
        polygon.orient(Direction::Default).geodesic_area_unsigned()
    }

    fn buffer(&self, point: Point, radius: f64, unit: LengthUnit) -> Polygon {
        let meters = unit.to_meters(radius);
        let mut ring: Vec<Point> = (0..BUFFER_STEPS)
            .map(|step| {
                let bearing = 360. * step as f64 / BUFFER_STEPS as f64;
                Geodesic.destination(point, bearing, meters)
            })
            .collect();
        if let Some(first) = ring.first().copied() {
            ring.push(first);
        }
        Polygon::new(ring.into_iter().collect(), vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::{line_string, polygon};

    #[test]
    fn one_degree_of_latitude() {
        let line = line_string![(x: 0., y: 0.), (x: 0., y: 1.)];
        assert_relative_eq!(
            GeodesicUtility.length(&line, LengthUnit::Kilometers),
            110.574,
            epsilon = 0.01
        );
        assert_relative_eq!(
            GeodesicUtility.length(&line, LengthUnit::Miles),
            68.708,
            epsilon = 0.01
        );
    }

    #[test]
    fn length_of_a_single_point_line_is_zero() {
        let line = line_string![(x: 10., y: 10.)];
        assert_relative_eq!(0., GeodesicUtility.length(&line, LengthUnit::Meters));
    }

    #[test]
    fn area_ignores_winding() {
        let clockwise = polygon![(x: 0., y: 0.), (x: 0., y: 1.), (x: 1., y: 1.), (x: 1., y: 0.)];
        let counter_clockwise =
            polygon![(x: 0., y: 0.), (x: 1., y: 0.), (x: 1., y: 1.), (x: 0., y: 1.)];

        let area = GeodesicUtility.area(&clockwise);
        assert_relative_eq!(area, GeodesicUtility.area(&counter_clockwise), max_relative = 1e-9);
        // One square degree at the equator is roughly 12 308 km².
        assert_relative_eq!(area / 1e6, 12_308., max_relative = 0.01);
    }

    #[test]
    fn holes_are_subtracted_whatever_their_winding() {
        let exterior = line_string![
            (x: 0., y: 0.), (x: 0., y: 1.), (x: 1., y: 1.), (x: 1., y: 0.), (x: 0., y: 0.)
        ];
        let clockwise_hole = line_string![
            (x: 0.25, y: 0.25), (x: 0.25, y: 0.75), (x: 0.75, y: 0.75), (x: 0.75, y: 0.25),
            (x: 0.25, y: 0.25)
        ];
        let mut counter_clockwise_hole = clockwise_hole.clone();
        counter_clockwise_hole.0.reverse();

        let square = GeodesicUtility.area(&Polygon::new(exterior.clone(), vec![]));
        for hole in [clockwise_hole, counter_clockwise_hole] {
            let area = GeodesicUtility.area(&Polygon::new(exterior.clone(), vec![hole]));
            assert_relative_eq!(area / square, 0.75, epsilon = 0.01);
        }
    }

    #[test]
    fn buffer_is_a_closed_ring_at_the_radius() {
        let center = Point::new(-74.5, 40.);
        let buffer = GeodesicUtility.buffer(center, 2., LengthUnit::Kilometers);
        let ring = buffer.exterior();

        assert_eq!(BUFFER_STEPS + 1, ring.0.len());
        assert_eq!(ring.0.first(), ring.0.last());
        for vertex in ring.points() {
            assert_relative_eq!(Geodesic.distance(center, vertex), 2_000., epsilon = 1e-3);
        }
    }
}
