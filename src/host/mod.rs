//! Capability interfaces into the host modeling environment.
//!
//! The placement core never touches a model directly: every lookup, ray
//! query and mutation goes through these traits, with the model passed as
//! an explicit [`ModelHandle`].

pub mod memory;

use crate::config::BarrierFilter;
use crate::error::{GeometryError, SinkError};
use crate::math::{Point3, Vector3};
use crate::model::{Barrier, BarrierId, ElementId, LevelId, LinearElement, RawHit};

/// Opaque reference to an open model document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelHandle {
    key: u64,
    title: String,
}

impl ModelHandle {
    #[must_use]
    pub fn new(key: u64, title: impl Into<String>) -> Self {
        Self {
            key,
            title: title.into(),
        }
    }

    /// Host-specific key of the document.
    #[must_use]
    pub fn key(&self) -> u64 {
        self.key
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

/// A placeholder family type resolved in the target model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderType {
    pub id: ElementId,
    pub family: String,
    /// Whether the type was already active when it was resolved.
    pub is_active: bool,
}

/// A 3D view whose visibility settings scope ray queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewContext {
    pub id: ElementId,
}

/// Host-specific handle to a created placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaceholderHandle(pub u64);

/// Finds open model documents.
pub trait ModelLocator {
    /// The model the user is working in; placeholders are created here.
    fn active_model(&self) -> Option<ModelHandle>;

    /// The first open model whose title contains `needle`.
    fn find_model_by_title_substring(&self, needle: &str) -> Option<ModelHandle>;
}

/// Resolves and activates placeholder family types.
pub trait TypeResolver {
    fn find_placeholder_type(&self, model: &ModelHandle, family: &str) -> Option<PlaceholderType>;

    /// Activates `placeholder` so instances of it can be created.
    ///
    /// # Errors
    ///
    /// Returns an error if the type cannot be activated.
    fn activate(
        &mut self,
        model: &ModelHandle,
        placeholder: &PlaceholderType,
    ) -> Result<(), SinkError>;
}

/// Enumerates mechanical elements and views.
pub trait ElementEnumerator {
    fn all_ducts(&self, model: &ModelHandle) -> Vec<LinearElement>;

    fn all_pipes(&self, model: &ModelHandle) -> Vec<LinearElement>;

    fn first_non_template_3d_view(&self, model: &ModelHandle) -> Option<ViewContext>;
}

/// Answers geometric queries against the target model.
pub trait GeometrySource {
    /// Casts an unbounded ray and reports every barrier record it crosses.
    ///
    /// Results are in no particular order and may contain several records
    /// for the same barrier.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be evaluated, e.g. for a zero
    /// direction or an unknown view.
    fn ray_cast(
        &self,
        model: &ModelHandle,
        origin: &Point3,
        direction: &Vector3,
        filter: &BarrierFilter,
        view: &ViewContext,
    ) -> Result<Vec<RawHit>, GeometryError>;

    /// The level of `barrier` expressed in the target model, if any.
    fn level_of(&self, model: &ModelHandle, barrier: &BarrierId) -> Option<LevelId>;
}

/// Creates placeholders and sets their parameters.
pub trait PlacementSink {
    /// Creates a placeholder instance hosted on `barrier`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host rejects the creation.
    fn create_placeholder(
        &mut self,
        model: &ModelHandle,
        point: &Point3,
        placeholder: &PlaceholderType,
        barrier: &Barrier,
        level: LevelId,
    ) -> Result<PlaceholderHandle, SinkError>;

    /// Sets a numeric parameter on a created placeholder.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter does not exist or rejects the value.
    fn set_parameter(
        &mut self,
        model: &ModelHandle,
        handle: PlaceholderHandle,
        name: &str,
        value: f64,
    ) -> Result<(), SinkError>;
}

/// Scopes write access to a model.
///
/// # Errors
///
/// Every method returns an error if the host refuses the transition.
pub trait TransactionHost {
    #[allow(clippy::missing_errors_doc)]
    fn begin(&mut self, model: &ModelHandle, label: &str) -> Result<(), SinkError>;

    #[allow(clippy::missing_errors_doc)]
    fn commit(&mut self, model: &ModelHandle) -> Result<(), SinkError>;

    #[allow(clippy::missing_errors_doc)]
    fn rollback(&mut self, model: &ModelHandle) -> Result<(), SinkError>;
}

/// Everything a placement batch needs from the host.
pub trait HostEnvironment:
    ModelLocator
    + TypeResolver
    + ElementEnumerator
    + GeometrySource
    + PlacementSink
    + TransactionHost
{
}

impl<T> HostEnvironment for T where
    T: ModelLocator
        + TypeResolver
        + ElementEnumerator
        + GeometrySource
        + PlacementSink
        + TransactionHost
        + ?Sized
{
}
