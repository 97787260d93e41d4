use std::fmt;

use crate::error::PerforaError;
use crate::host::PlaceholderHandle;
use crate::model::{ElementId, ElementKind};

/// Lifecycle of a placement batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// Walking the elements and building placement requests.
    Collecting,
    /// Creating placeholders inside the write transaction.
    Committing,
    Succeeded,
    /// The transaction was rolled back; the model is unchanged.
    Failed,
}

/// A per-element failure recorded while collecting; the batch went on.
#[derive(Debug)]
pub struct Diagnostic {
    pub element: ElementId,
    pub kind: ElementKind,
    pub error: PerforaError,
}

/// Outcome of a placement batch that got past its preconditions.
#[derive(Debug)]
pub struct BatchReport {
    pub state: BatchState,
    /// Ducts and pipes examined.
    pub elements: usize,
    /// Placement requests collected.
    pub requests: usize,
    /// Placeholders that exist in the model after the batch.
    pub placed: Vec<PlaceholderHandle>,
    pub diagnostics: Vec<Diagnostic>,
    /// The error that rolled the batch back.
    pub failure: Option<PerforaError>,
}

impl BatchReport {
    pub(super) fn new() -> Self {
        Self {
            state: BatchState::Collecting,
            elements: 0,
            requests: 0,
            placed: Vec::new(),
            diagnostics: Vec::new(),
            failure: None,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.state == BatchState::Succeeded
    }

    /// Elements skipped entirely because their centerline was unusable.
    #[must_use]
    pub fn skipped_elements(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d.error, PerforaError::Geometry(_)))
            .count()
    }

    /// Wall crossings skipped because no placement could be resolved.
    #[must_use]
    pub fn skipped_hits(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d.error, PerforaError::Placement(_)))
            .count()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.state, &self.failure) {
            (BatchState::Failed, Some(failure)) => {
                write!(f, "rolled back, no holes placed: {failure}")?;
            }
            _ => write!(
                f,
                "placed {} of {} across {}",
                self.placed.len(),
                count(self.requests, "hole"),
                count(self.elements, "element")
            )?,
        }
        if !self.diagnostics.is_empty() {
            write!(
                f,
                "; skipped {} and {}",
                count(self.skipped_elements(), "element"),
                count(self.skipped_hits(), "wall crossing")
            )?;
        }
        Ok(())
    }
}

fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}
