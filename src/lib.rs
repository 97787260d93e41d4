//! Places wall-penetration placeholders where duct and pipe centerlines
//! cross walls.
//!
//! For every straight duct and pipe of a mechanical model, a ray is cast
//! along its centerline against the walls of the target model and its
//! links. Hits beyond the element's length are dropped, repeated hits on
//! the same wall collapse to the nearest one, and each remaining crossing
//! becomes a placeholder sized to the element's diameter on the wall's
//! level. All placeholders are created in one transaction.
//!
//! The modeling application is reached only through the traits in
//! [`host`]; [`host::memory::MemoryHost`] implements them in memory.

pub mod config;
pub mod error;
pub mod geometry;
pub mod host;
pub mod math;
pub mod model;
pub mod operations;

pub use config::{BarrierFilter, PlacementConfig};
pub use error::{PerforaError, Result};
pub use operations::{BatchReport, BatchState, PlaceHoles};
