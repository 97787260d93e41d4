use crate::error::{PlacementError, Result};
use crate::host::{GeometrySource, ModelHandle};
use crate::model::{Barrier, DedupedHit, LinearElement, PlacementRequest};

/// Turns one deduplicated hit into a placement request.
///
/// The insertion point is `start + distance * direction`. The placeholder
/// takes the crossed wall's level and a square section whose side is the
/// element's diameter.
pub struct ResolvePlacement<'a> {
    hit: &'a DedupedHit,
    element: &'a LinearElement,
}

impl<'a> ResolvePlacement<'a> {
    /// Creates a new resolution for `hit` on `element`.
    #[must_use]
    pub fn new(hit: &'a DedupedHit, element: &'a LinearElement) -> Self {
        Self { hit, element }
    }

    /// Executes the resolution.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::MissingLevel`] if the wall has no level in
    /// the target model, or a geometry error for a degenerate centerline.
    pub fn execute<G>(&self, source: &G, model: &ModelHandle) -> Result<PlacementRequest>
    where
        G: GeometrySource + ?Sized,
    {
        let ray = self.element.ray()?;
        let identity = self.hit.barrier();
        let level = source
            .level_of(model, &identity)
            .ok_or(PlacementError::MissingLevel { barrier: identity })?;

        Ok(PlacementRequest {
            element: self.element.id,
            insertion_point: ray.point_at(self.hit.distance()),
            barrier: Barrier {
                identity,
                vertical_reference: level,
            },
            level,
            width: self.element.diameter,
            height: self.element.diameter,
        })
    }
}
