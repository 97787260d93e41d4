//! In-process host holding whole model documents in memory.
//!
//! Implements every capability trait, so a placement batch can run end to
//! end without an external modeling application. Ray queries report one
//! record per crossed wall face, like a face-level reference intersector.

mod document;

pub use document::{
    Document, DocumentId, LevelData, LinkData, PlaceholderData, PlaceholderKey, SymbolData,
    ViewData, WallData,
};

use rustc_hash::FxHashMap;
use slotmap::{Key, KeyData, SlotMap};
use tracing::{debug, trace, warn};

use super::{
    ElementEnumerator, GeometrySource, ModelHandle, ModelLocator, PlaceholderHandle,
    PlaceholderType, PlacementSink, TransactionHost, TypeResolver, ViewContext,
};
use crate::config::BarrierFilter;
use crate::error::{GeometryError, SinkError};
use crate::geometry::Ray;
use crate::math::{Point3, Vector3};
use crate::model::{Barrier, BarrierId, DocumentTag, ElementId, LevelId, LinearElement, RawHit};

/// Maximum elevation difference for a linked level to match a host level.
const LEVEL_TOLERANCE: f64 = 1e-6;

#[derive(Debug)]
struct OpenTransaction {
    document: DocumentId,
    label: String,
    snapshot: Document,
}

/// A modeling host backed by in-memory documents.
#[derive(Debug, Default)]
pub struct MemoryHost {
    documents: SlotMap<DocumentId, Document>,
    active: Option<DocumentId>,
    transaction: Option<OpenTransaction>,
    fail_creation_at: Option<usize>,
    creations: usize,
}

impl MemoryHost {
    /// Creates a host with no documents.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new empty document and returns its ID.
    pub fn add_document(&mut self, title: impl Into<String>) -> DocumentId {
        self.documents.insert(Document::new(title))
    }

    /// Makes `id` the active (target) document.
    pub fn set_active(&mut self, id: DocumentId) {
        self.active = Some(id);
    }

    /// Makes the `n`-th placeholder creation (1-based, counted over the
    /// host's lifetime) fail.
    pub fn fail_creation_at(&mut self, n: usize) {
        self.fail_creation_at = Some(n);
    }

    #[must_use]
    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn document_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.documents.get_mut(id)
    }

    /// Returns the handle callers pass back into the capability traits.
    #[must_use]
    pub fn handle(&self, id: DocumentId) -> Option<ModelHandle> {
        self.documents
            .get(id)
            .map(|doc| ModelHandle::new(id.data().as_ffi(), doc.title()))
    }

    /// Label of the open transaction, if any.
    #[must_use]
    pub fn open_transaction(&self) -> Option<&str> {
        self.transaction.as_ref().map(|t| t.label.as_str())
    }

    fn resolve(&self, model: &ModelHandle) -> Option<(DocumentId, &Document)> {
        let id = DocumentId::from(KeyData::from_ffi(model.key()));
        self.documents.get(id).map(|doc| (id, doc))
    }

    /// Returns the document behind `model` if a transaction is open on it.
    fn writable(&mut self, model: &ModelHandle) -> Result<&mut Document, SinkError> {
        let id = DocumentId::from(KeyData::from_ffi(model.key()));
        match &self.transaction {
            Some(open) if open.document == id => {}
            _ => {
                return Err(SinkError::Transaction(format!(
                    "no open transaction on {:?}",
                    model.title()
                )))
            }
        }
        self.documents
            .get_mut(id)
            .ok_or_else(|| SinkError::Transaction(format!("unknown model {:?}", model.title())))
    }

    fn linked_level(
        &self,
        doc: &Document,
        link_id: ElementId,
        barrier: &BarrierId,
    ) -> Option<LevelId> {
        let link = doc.link(link_id)?;
        let linked = self.documents.get(link.document)?;
        let level = linked.level(linked.wall(barrier.element)?.level?)?;
        let elevation = link
            .transform
            .transform_point(&Point3::new(0.0, 0.0, level.elevation))
            .z;
        doc.levels
            .iter()
            .find(|l| (l.elevation - elevation).abs() < LEVEL_TOLERANCE)
            .map(|l| l.id)
    }
}

impl ModelLocator for MemoryHost {
    fn active_model(&self) -> Option<ModelHandle> {
        self.active.and_then(|id| self.handle(id))
    }

    fn find_model_by_title_substring(&self, needle: &str) -> Option<ModelHandle> {
        self.documents
            .iter()
            .find(|(_, doc)| doc.title().contains(needle))
            .and_then(|(id, _)| self.handle(id))
    }
}

impl TypeResolver for MemoryHost {
    fn find_placeholder_type(&self, model: &ModelHandle, family: &str) -> Option<PlaceholderType> {
        let (_, doc) = self.resolve(model)?;
        doc.symbols
            .iter()
            .find(|s| s.family == family)
            .map(|s| PlaceholderType {
                id: s.id,
                family: s.family.clone(),
                is_active: s.active,
            })
    }

    fn activate(
        &mut self,
        model: &ModelHandle,
        placeholder: &PlaceholderType,
    ) -> Result<(), SinkError> {
        let doc = self.writable(model)?;
        let symbol = doc
            .symbols
            .iter_mut()
            .find(|s| s.id == placeholder.id)
            .ok_or_else(|| SinkError::CreationFailed(format!("unknown type {}", placeholder.id)))?;
        symbol.active = true;
        Ok(())
    }
}

impl ElementEnumerator for MemoryHost {
    fn all_ducts(&self, model: &ModelHandle) -> Vec<LinearElement> {
        self.resolve(model)
            .map(|(_, doc)| doc.ducts.clone())
            .unwrap_or_default()
    }

    fn all_pipes(&self, model: &ModelHandle) -> Vec<LinearElement> {
        self.resolve(model)
            .map(|(_, doc)| doc.pipes.clone())
            .unwrap_or_default()
    }

    fn first_non_template_3d_view(&self, model: &ModelHandle) -> Option<ViewContext> {
        let (_, doc) = self.resolve(model)?;
        doc.views
            .iter()
            .find(|v| !v.is_template)
            .map(|v| ViewContext { id: v.id })
    }
}

impl GeometrySource for MemoryHost {
    fn ray_cast(
        &self,
        model: &ModelHandle,
        origin: &Point3,
        direction: &Vector3,
        filter: &BarrierFilter,
        view: &ViewContext,
    ) -> Result<Vec<RawHit>, GeometryError> {
        let (_, doc) = self
            .resolve(model)
            .ok_or_else(|| GeometryError::RayQuery(format!("unknown model {:?}", model.title())))?;
        if !doc.views.iter().any(|v| v.id == view.id && !v.is_template) {
            return Err(GeometryError::RayQuery(format!(
                "view {} is not a 3D view of {:?}",
                view.id,
                doc.title()
            )));
        }
        let ray = Ray::new(*origin, *direction).map_err(|_| GeometryError::ZeroVector)?;

        let mut hits = Vec::new();
        for wall in &doc.walls {
            let barrier = BarrierId::host(wall.id);
            hits.extend(
                wall.prism
                    .face_crossings(&ray)
                    .into_iter()
                    .map(|t| RawHit::new(barrier, t)),
            );
        }

        if filter.include_linked {
            for link in &doc.links {
                let Some(linked) = self.documents.get(link.document) else {
                    warn!(link = %link.id, "linked document is not loaded");
                    continue;
                };
                for wall in &linked.walls {
                    let barrier = BarrierId::linked(link.id, wall.id);
                    let prism = wall.prism.transformed(&link.transform);
                    hits.extend(
                        prism
                            .face_crossings(&ray)
                            .into_iter()
                            .map(|t| RawHit::new(barrier, t)),
                    );
                }
            }
        }

        trace!(count = hits.len(), "ray cast");
        Ok(hits)
    }

    fn level_of(&self, model: &ModelHandle, barrier: &BarrierId) -> Option<LevelId> {
        let (_, doc) = self.resolve(model)?;
        match barrier.document {
            DocumentTag::Host => {
                let level = doc.wall(barrier.element)?.level?;
                doc.level(level).map(|l| l.id)
            }
            DocumentTag::Link(link) => self.linked_level(doc, link, barrier),
        }
    }
}

impl PlacementSink for MemoryHost {
    fn create_placeholder(
        &mut self,
        model: &ModelHandle,
        point: &Point3,
        placeholder: &PlaceholderType,
        barrier: &Barrier,
        level: LevelId,
    ) -> Result<PlaceholderHandle, SinkError> {
        self.creations += 1;
        if self.fail_creation_at == Some(self.creations) {
            return Err(SinkError::CreationFailed(format!(
                "host rejected placeholder #{}",
                self.creations
            )));
        }

        let doc = self.writable(model)?;
        let symbol = doc
            .symbol(placeholder.id)
            .ok_or_else(|| SinkError::CreationFailed(format!("unknown type {}", placeholder.id)))?;
        if !symbol.active {
            return Err(SinkError::TypeInactive {
                family: symbol.family.clone(),
            });
        }
        let parameters: FxHashMap<String, f64> =
            symbol.parameters.iter().map(|p| (p.clone(), 0.0)).collect();
        if doc.level(level).is_none() {
            return Err(SinkError::CreationFailed(format!("{level} is not in the model")));
        }
        let host_exists = match barrier.identity.document {
            DocumentTag::Host => doc.wall(barrier.identity.element).is_some(),
            DocumentTag::Link(link) => doc.link(link).is_some(),
        };
        if !host_exists {
            return Err(SinkError::CreationFailed(format!(
                "{} is not in the model",
                barrier.identity
            )));
        }

        let key = doc.placeholders.insert(PlaceholderData {
            point: *point,
            symbol: placeholder.id,
            barrier: barrier.identity,
            level,
            parameters,
        });
        debug!(barrier = %barrier.identity, "placeholder created");
        Ok(PlaceholderHandle(key.data().as_ffi()))
    }

    fn set_parameter(
        &mut self,
        model: &ModelHandle,
        handle: PlaceholderHandle,
        name: &str,
        value: f64,
    ) -> Result<(), SinkError> {
        let doc = self.writable(model)?;
        let key = PlaceholderKey::from(KeyData::from_ffi(handle.0));
        let placeholder = doc
            .placeholders
            .get_mut(key)
            .ok_or_else(|| SinkError::CreationFailed("unknown placeholder".to_owned()))?;
        let slot = placeholder
            .parameters
            .get_mut(name)
            .ok_or_else(|| SinkError::ParameterMissing {
                name: name.to_owned(),
            })?;
        if !value.is_finite() {
            return Err(SinkError::CreationFailed(format!(
                "parameter {name:?} rejects {value}"
            )));
        }
        *slot = value;
        Ok(())
    }
}

impl TransactionHost for MemoryHost {
    fn begin(&mut self, model: &ModelHandle, label: &str) -> Result<(), SinkError> {
        if let Some(open) = &self.transaction {
            return Err(SinkError::Transaction(format!(
                "transaction {:?} is already open",
                open.label
            )));
        }
        let (document, doc) = self
            .resolve(model)
            .ok_or_else(|| SinkError::Transaction(format!("unknown model {:?}", model.title())))?;
        let snapshot = doc.clone();
        self.transaction = Some(OpenTransaction {
            document,
            label: label.to_owned(),
            snapshot,
        });
        Ok(())
    }

    fn commit(&mut self, model: &ModelHandle) -> Result<(), SinkError> {
        self.close(model).map(|_| ())
    }

    fn rollback(&mut self, model: &ModelHandle) -> Result<(), SinkError> {
        let open = self.close(model)?;
        if let Some(doc) = self.documents.get_mut(open.document) {
            *doc = open.snapshot;
        }
        Ok(())
    }
}

impl MemoryHost {
    fn close(&mut self, model: &ModelHandle) -> Result<OpenTransaction, SinkError> {
        let id = DocumentId::from(KeyData::from_ffi(model.key()));
        match self.transaction.take() {
            Some(open) if open.document == id => Ok(open),
            other => {
                self.transaction = other;
                Err(SinkError::Transaction(format!(
                    "no open transaction on {:?}",
                    model.title()
                )))
            }
        }
    }
}
