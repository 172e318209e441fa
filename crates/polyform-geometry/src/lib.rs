//! Polyform Geometry - 2D path, spline and mesh geometry
//!
//! This crate turns abstract curve and path descriptions into renderable
//! triangle meshes:
//! - [`Path`], [`Polygon`] and [`Spline`] entities with analysis and editing
//!   operations
//! - [`PathFactory`] and [`PolyFactory`] for canonical shapes (lines,
//!   polygons, ellipses, arcs, rounded rects, capsules)
//! - [`PathSmoother`] for polyline simplification (Douglas–Peucker)
//! - [`SplineFlattener`] for curve-to-polyline approximation (de Casteljau)
//! - [`PathExtruder`] for stroke generation with joints and end caps
//!
//! Everything is a synchronous, single-threaded data transform over owned
//! buffers. The factories follow a set / calculate / materialize protocol,
//! so a long calculation can be moved onto a worker thread as long as the
//! instance is not touched while it runs.
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use polyform_geometry::{EndCap, Joint, PathExtruder, PathFactory};
//!
//! // A wireframe circle, extruded into a drawable 2-unit stroke.
//! let circle = PathFactory::new().make_circle(Vec2::ZERO, 10.0);
//! let mut extruder = PathExtruder::from_path(&circle)
//!     .with_joint(Joint::Round)
//!     .with_end_cap(EndCap::Butt);
//! extruder.calculate(2.0);
//! let mesh = extruder.polygon();
//! assert!(!mesh.is_empty());
//! ```

// Entities
mod path;
mod polygon;
mod spline;

// Configuration
mod error;
mod stroke;

// Factories
mod extruder;
mod flattener;
mod path_factory;
mod poly_factory;
mod smoother;

// GPU handoff
mod vertex;

// Re-exports
pub use path::*;
pub use polygon::*;
pub use spline::*;

pub use error::*;
pub use stroke::*;

pub use extruder::*;
pub use flattener::*;
pub use path_factory::*;
pub use poly_factory::*;
pub use smoother::*;

pub use vertex::*;
