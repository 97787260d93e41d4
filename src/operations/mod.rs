mod dedupe_hits;
mod find_intersections;
mod place_holes;
mod resolve_placement;

pub use dedupe_hits::DedupeHits;
pub use find_intersections::FindIntersections;
pub use place_holes::{
    BatchContext, BatchReport, BatchState, Collected, Diagnostic, PlaceHoles, TransactionScope,
};
pub use resolve_placement::ResolvePlacement;
