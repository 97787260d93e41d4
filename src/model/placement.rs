use crate::math::Point3;

use super::{BarrierId, ElementId, LevelId};

/// A wall crossed by a centerline, with the level its placeholder inherits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Barrier {
    pub identity: BarrierId,
    pub vertical_reference: LevelId,
}

/// Everything the placement sink needs to create one placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementRequest {
    /// The duct or pipe that crosses the wall.
    pub element: ElementId,
    pub insertion_point: Point3,
    pub barrier: Barrier,
    /// Always `barrier.vertical_reference`.
    pub level: LevelId,
    pub width: f64,
    pub height: f64,
}

/// Ordered placement requests accumulated across all elements of a batch.
#[derive(Debug, Clone, Default)]
pub struct PlacementBatch {
    requests: Vec<PlacementRequest>,
}

impl PlacementBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: PlacementRequest) {
        self.requests.push(request);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlacementRequest> {
        self.requests.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[PlacementRequest] {
        &self.requests
    }
}

impl Extend<PlacementRequest> for PlacementBatch {
    fn extend<I: IntoIterator<Item = PlacementRequest>>(&mut self, iter: I) {
        self.requests.extend(iter);
    }
}

impl IntoIterator for PlacementBatch {
    type Item = PlacementRequest;
    type IntoIter = std::vec::IntoIter<PlacementRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.requests.into_iter()
    }
}

impl<'a> IntoIterator for &'a PlacementBatch {
    type Item = &'a PlacementRequest;
    type IntoIter = std::slice::Iter<'a, PlacementRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.requests.iter()
    }
}
