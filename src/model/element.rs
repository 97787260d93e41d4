use std::fmt;

use crate::error::{GeometryError, Result};
use crate::geometry::Ray;
use crate::math::{Point3, Vector3, TOLERANCE};

use super::ElementId;

/// Category of a linear mechanical element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Duct,
    Pipe,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duct => f.write_str("duct"),
            Self::Pipe => f.write_str("pipe"),
        }
    }
}

/// Snapshot of a straight duct or pipe segment, read from the mechanical
/// model at batch start.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearElement {
    pub id: ElementId,
    pub kind: ElementKind,
    /// First endpoint of the centerline.
    pub start: Point3,
    /// Unit direction from the first towards the second endpoint.
    pub direction: Vector3,
    pub length: f64,
    pub diameter: f64,
}

impl LinearElement {
    /// Creates an element from an already-resolved centerline.
    #[must_use]
    pub fn new(
        id: ElementId,
        kind: ElementKind,
        start: Point3,
        direction: Vector3,
        length: f64,
        diameter: f64,
    ) -> Self {
        Self {
            id,
            kind,
            start,
            direction,
            length,
            diameter,
        }
    }

    /// Creates an element from its two centerline endpoints.
    ///
    /// A coincident pair of endpoints yields a zero direction and zero
    /// length, which [`ray`](Self::ray) later reports as degenerate.
    #[must_use]
    pub fn from_endpoints(
        id: ElementId,
        kind: ElementKind,
        start: Point3,
        end: Point3,
        diameter: f64,
    ) -> Self {
        let run = end - start;
        let length = run.norm();
        let direction = if length < TOLERANCE {
            Vector3::zeros()
        } else {
            run / length
        };
        Self::new(id, kind, start, direction, length, diameter)
    }

    /// Returns the second endpoint of the centerline.
    #[must_use]
    pub fn end(&self) -> Point3 {
        self.start + self.direction * self.length
    }

    /// Returns the centerline as a ray from `start`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if the length or diameter is
    /// not a positive finite number, and [`GeometryError::ZeroVector`] if
    /// the direction cannot be normalized.
    pub fn ray(&self) -> Result<Ray> {
        if !self.length.is_finite() || self.length < TOLERANCE {
            return Err(GeometryError::Degenerate(format!(
                "{} {} has centerline length {}",
                self.kind, self.id, self.length
            ))
            .into());
        }
        if !self.diameter.is_finite() || self.diameter <= TOLERANCE {
            return Err(GeometryError::Degenerate(format!(
                "{} {} has diameter {}",
                self.kind, self.id, self.diameter
            ))
            .into());
        }
        Ray::new(self.start, self.direction)
    }
}
