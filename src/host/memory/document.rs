use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::error::Result;
use crate::geometry::Prism;
use crate::math::{Isometry3, Point3};
use crate::model::{BarrierId, ElementId, ElementKind, LevelId, LinearElement};

slotmap::new_key_type! {
    /// Unique identifier for a document held by a [`MemoryHost`](super::MemoryHost).
    pub struct DocumentId;
}

slotmap::new_key_type! {
    /// Unique identifier for a placeholder inside a document.
    pub struct PlaceholderKey;
}

/// A level (elevation datum).
#[derive(Debug, Clone)]
pub struct LevelData {
    pub id: LevelId,
    pub name: String,
    pub elevation: f64,
}

/// A straight wall.
#[derive(Debug, Clone)]
pub struct WallData {
    pub id: ElementId,
    pub level: Option<LevelId>,
    pub prism: Prism,
}

/// A 3D view.
#[derive(Debug, Clone)]
pub struct ViewData {
    pub id: ElementId,
    pub is_template: bool,
}

/// A loadable placeholder family type.
#[derive(Debug, Clone)]
pub struct SymbolData {
    pub id: ElementId,
    pub family: String,
    /// Numeric instance parameters every placeholder of this type exposes.
    pub parameters: Vec<String>,
    pub active: bool,
}

/// An instance of another document placed into this one.
#[derive(Debug, Clone)]
pub struct LinkData {
    pub id: ElementId,
    pub document: DocumentId,
    pub transform: Isometry3,
}

/// A created placeholder.
#[derive(Debug, Clone)]
pub struct PlaceholderData {
    pub point: Point3,
    pub symbol: ElementId,
    pub barrier: BarrierId,
    pub level: LevelId,
    pub parameters: FxHashMap<String, f64>,
}

/// One model document: its elements and the placeholders created in it.
#[derive(Debug, Clone)]
pub struct Document {
    title: String,
    next_id: i64,
    pub(super) levels: Vec<LevelData>,
    pub(super) walls: Vec<WallData>,
    pub(super) ducts: Vec<LinearElement>,
    pub(super) pipes: Vec<LinearElement>,
    pub(super) views: Vec<ViewData>,
    pub(super) symbols: Vec<SymbolData>,
    pub(super) links: Vec<LinkData>,
    pub(super) placeholders: SlotMap<PlaceholderKey, PlaceholderData>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            next_id: 1,
            levels: Vec::new(),
            walls: Vec::new(),
            ducts: Vec::new(),
            pipes: Vec::new(),
            views: Vec::new(),
            symbols: Vec::new(),
            links: Vec::new(),
            placeholders: SlotMap::with_key(),
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    fn allocate(&mut self) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn add_level(&mut self, name: impl Into<String>, elevation: f64) -> LevelId {
        let id = LevelId(self.allocate().0);
        self.levels.push(LevelData {
            id,
            name: name.into(),
            elevation,
        });
        id
    }

    /// Adds a wall swept up from the baseline running from `start` to `end`.
    ///
    /// # Errors
    ///
    /// Returns an error if the wall solid is degenerate.
    pub fn add_wall(
        &mut self,
        start: Point3,
        end: Point3,
        thickness: f64,
        height: f64,
        level: Option<LevelId>,
    ) -> Result<ElementId> {
        let prism = Prism::from_baseline(start, end, thickness, height)?;
        let id = self.allocate();
        self.walls.push(WallData { id, level, prism });
        Ok(id)
    }

    pub fn add_duct(&mut self, start: Point3, end: Point3, diameter: f64) -> ElementId {
        let id = self.allocate();
        self.ducts.push(LinearElement::from_endpoints(
            id,
            ElementKind::Duct,
            start,
            end,
            diameter,
        ));
        id
    }

    pub fn add_pipe(&mut self, start: Point3, end: Point3, diameter: f64) -> ElementId {
        let id = self.allocate();
        self.pipes.push(LinearElement::from_endpoints(
            id,
            ElementKind::Pipe,
            start,
            end,
            diameter,
        ));
        id
    }

    pub fn add_view_3d(&mut self, is_template: bool) -> ElementId {
        let id = self.allocate();
        self.views.push(ViewData { id, is_template });
        id
    }

    pub fn add_placeholder_family(
        &mut self,
        family: impl Into<String>,
        parameters: &[&str],
        active: bool,
    ) -> ElementId {
        let id = self.allocate();
        self.symbols.push(SymbolData {
            id,
            family: family.into(),
            parameters: parameters.iter().map(|p| (*p).to_owned()).collect(),
            active,
        });
        id
    }

    /// Places `document` into this one at `transform`.
    pub fn add_link(&mut self, document: DocumentId, transform: Isometry3) -> ElementId {
        let id = self.allocate();
        self.links.push(LinkData {
            id,
            document,
            transform,
        });
        id
    }

    pub fn level(&self, id: LevelId) -> Option<&LevelData> {
        self.levels.iter().find(|l| l.id == id)
    }

    pub fn wall(&self, id: ElementId) -> Option<&WallData> {
        self.walls.iter().find(|w| w.id == id)
    }

    pub fn symbol(&self, id: ElementId) -> Option<&SymbolData> {
        self.symbols.iter().find(|s| s.id == id)
    }

    pub fn link(&self, id: ElementId) -> Option<&LinkData> {
        self.links.iter().find(|l| l.id == id)
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &PlaceholderData> {
        self.placeholders.values()
    }

    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.placeholders.len()
    }
}
