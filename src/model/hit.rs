use super::BarrierId;

/// One ray-intersection record reported by the geometry source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawHit {
    pub barrier: BarrierId,
    /// Distance from the ray origin along its unit direction.
    pub distance: f64,
}

impl RawHit {
    #[must_use]
    pub fn new(barrier: BarrierId, distance: f64) -> Self {
        Self { barrier, distance }
    }
}

/// A hit known to be the only one for its barrier within one element's query.
///
/// Only [`DedupeHits`](crate::operations::DedupeHits) constructs these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DedupedHit(RawHit);

impl DedupedHit {
    pub(crate) fn new(hit: RawHit) -> Self {
        Self(hit)
    }

    #[must_use]
    pub fn barrier(&self) -> BarrierId {
        self.0.barrier
    }

    #[must_use]
    pub fn distance(&self) -> f64 {
        self.0.distance
    }
}

impl From<DedupedHit> for RawHit {
    fn from(hit: DedupedHit) -> Self {
        hit.0
    }
}
