use std::fmt;

/// Element id local to one model document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub i64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Id of a level (elevation datum) in the target model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LevelId(pub i64);

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level #{}", self.0)
    }
}

/// Which document a barrier lives in, as seen from the target model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentTag {
    /// The target model itself.
    Host,
    /// A linked model, identified by its link instance in the target model.
    Link(ElementId),
}

/// Identity of a physical wall across the target model and its links.
///
/// Two hits refer to the same wall iff both the document tag and the
/// element id match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BarrierId {
    pub document: DocumentTag,
    pub element: ElementId,
}

impl BarrierId {
    /// A wall owned by the target model.
    #[must_use]
    pub fn host(element: ElementId) -> Self {
        Self {
            document: DocumentTag::Host,
            element,
        }
    }

    /// A wall inside the model behind link instance `link`.
    #[must_use]
    pub fn linked(link: ElementId, element: ElementId) -> Self {
        Self {
            document: DocumentTag::Link(link),
            element,
        }
    }
}

impl fmt::Display for BarrierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.document {
            DocumentTag::Host => write!(f, "wall {}", self.element),
            DocumentTag::Link(link) => write!(f, "wall {} via link {link}", self.element),
        }
    }
}
