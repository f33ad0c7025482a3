//! Interactive geospatial annotation engine.
//!
//! Lets the user sketch points, lines and polygons, place draggable markers and import GeoJSON
//! or KML layers on top of a map, while keeping the measured lengths and areas up to date.
//!
//! The map itself is whatever implements [`MapSession`], with [`Viewport`] being a Web
//! Mercator one painting with `egui`. Sketching is delegated to a [`DrawingPlugin`], such as
//! [`SketchPad`].
//!
//! ```
//! use geomark::{Engine, MapEvent, Options, SketchPad, Viewport, lon_lat};
//!
//! let viewport = Viewport::new(egui::Rect::from_min_size(
//!     egui::Pos2::ZERO,
//!     egui::vec2(800., 600.),
//! ));
//! let mut engine = Engine::new(Options::default());
//! engine.load(viewport, SketchPad::default()).unwrap();
//!
//! engine
//!     .handle_map_event(MapEvent::Click {
//!         position: lon_lat(-74.5, 40.),
//!         at_ms: 0,
//!     })
//!     .unwrap();
//! assert_eq!(1, engine.markers().len());
//! ```

#![deny(clippy::unwrap_used, rustdoc::broken_intra_doc_links)]

mod clock;
pub mod draw;
mod engine;
mod error;
pub mod feature;
pub mod geometry;
pub mod hover;
pub mod import;
pub mod layers;
pub mod measure;
mod mercator;
mod options;
pub mod overlay;
mod position;
pub mod render;
mod session;
pub mod store;
mod zoom;

pub use clock::{Clock, ManualClock, SystemClock};
pub use draw::{DrawEvent, DrawMode, DrawingPlugin, SketchPad, Tool};
pub use engine::{Engine, ImportTicket};
pub use error::Error;
pub use feature::{Feature, FeatureCollection, FeatureId, Geometry, GeometryType, Origin};
pub use hover::HoverInfo;
pub use layers::{LayerId, LayerSummary};
pub use measure::{Area, Distance, MeasurementSnapshot};
pub use options::Options;
pub use position::{Position, lat_lon, lon_lat, same_coordinate};
pub use session::{MapEvent, MapSession, Viewport};
pub use store::{Change, Marker, MarkerId};
pub use zoom::InvalidZoom;
