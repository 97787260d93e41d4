use tracing::trace;

use crate::config::BarrierFilter;
use crate::error::Result;
use crate::host::{GeometrySource, ModelHandle, ViewContext};
use crate::model::{LinearElement, RawHit};

/// Finds every wall record a duct or pipe centerline crosses.
///
/// Casts an unbounded ray from the element's start along its direction and
/// keeps only the records that lie on the element itself
/// (`0 <= distance <= length`).
pub struct FindIntersections<'a> {
    element: &'a LinearElement,
    filter: &'a BarrierFilter,
    view: &'a ViewContext,
}

impl<'a> FindIntersections<'a> {
    /// Creates a new intersection query.
    #[must_use]
    pub fn new(
        element: &'a LinearElement,
        filter: &'a BarrierFilter,
        view: &'a ViewContext,
    ) -> Self {
        Self {
            element,
            filter,
            view,
        }
    }

    /// Executes the query against `source`.
    ///
    /// # Errors
    ///
    /// Returns a geometry error if the centerline is degenerate or the ray
    /// query cannot be evaluated.
    pub fn execute<G>(&self, source: &G, model: &ModelHandle) -> Result<Vec<RawHit>>
    where
        G: GeometrySource + ?Sized,
    {
        let ray = self.element.ray()?;
        let mut hits =
            source.ray_cast(model, ray.origin(), ray.direction(), self.filter, self.view)?;

        let reported = hits.len();
        let length = self.element.length;
        hits.retain(|hit| (0.0..=length).contains(&hit.distance));

        trace!(
            element = %self.element.id,
            reported,
            kept = hits.len(),
            "centerline intersections"
        );
        Ok(hits)
    }
}
