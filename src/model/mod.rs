//! Value types flowing through the placement pipeline.

mod element;
mod hit;
mod ids;
mod placement;

pub use element::{ElementKind, LinearElement};
pub use hit::{DedupedHit, RawHit};
pub use ids::{BarrierId, DocumentTag, ElementId, LevelId};
pub use placement::{Barrier, PlacementBatch, PlacementRequest};
