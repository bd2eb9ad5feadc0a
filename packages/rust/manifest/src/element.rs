//! The three element kinds collected from manifest fragments.

use std::fmt;

/// A mergeable element kind and its template container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Layout,
    Portlet,
    Role,
}

impl ElementKind {
    /// All kinds, in the order fragments are drained.
    pub const ALL: [ElementKind; 3] = [ElementKind::Layout, ElementKind::Portlet, ElementKind::Role];

    /// Tag name of the element inside a fragment.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Layout => "layout",
            Self::Portlet => "portlet",
            Self::Role => "role",
        }
    }

    /// Tag name of the template container receiving this kind.
    pub fn container_tag(self) -> &'static str {
        match self {
            Self::Layout => "layouts",
            Self::Portlet => "portlets",
            Self::Role => "roles",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Layout => 0,
            Self::Portlet => 1,
            Self::Role => 2,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// An element taken out of a fragment, carrying its exact source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovedElement {
    pub kind: ElementKind,
    pub xml: String,
}
