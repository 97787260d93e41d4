use rustc_hash::FxHashMap;

use crate::model::{BarrierId, DedupedHit, RawHit};

/// Collapses the raw hits of one centerline to one hit per wall.
///
/// A single crossing produces several records for the same wall (one per
/// face or layer, or a linked copy reported through its link). The hit with
/// the smallest distance survives, the first one seen on a tie. The output
/// is ordered by distance along the ray.
pub struct DedupeHits {
    hits: Vec<RawHit>,
}

impl DedupeHits {
    /// Creates a new deduplication over `hits`.
    #[must_use]
    pub fn new(hits: impl IntoIterator<Item = RawHit>) -> Self {
        Self {
            hits: hits.into_iter().collect(),
        }
    }

    /// Executes the deduplication.
    #[must_use]
    pub fn execute(self) -> Vec<DedupedHit> {
        let mut slots: FxHashMap<BarrierId, usize> = FxHashMap::default();
        let mut kept: Vec<RawHit> = Vec::with_capacity(self.hits.len());

        for hit in self.hits {
            match slots.get(&hit.barrier) {
                Some(&i) => {
                    if hit.distance < kept[i].distance {
                        kept[i] = hit;
                    }
                }
                None => {
                    slots.insert(hit.barrier, kept.len());
                    kept.push(hit);
                }
            }
        }

        kept.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        kept.into_iter().map(DedupedHit::new).collect()
    }
}
