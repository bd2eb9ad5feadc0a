//! Manifest fragments: per-directory `manifest.xml` documents.

use std::path::{Path, PathBuf};

use tracing::debug;

use pubtools_shared::{PubtoolsError, Result};

use crate::element::{ElementKind, MovedElement};
use crate::scan::{ElementSpan, scan_elements};

/// A parsed manifest fragment.
#[derive(Debug, Clone)]
pub struct Fragment {
    path: PathBuf,
    source: String,
    spans: Vec<ElementSpan>,
}

impl Fragment {
    /// Read and parse the fragment at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| PubtoolsError::io(path, e))?;
        let source = String::from_utf8(bytes)
            .map_err(|e| PubtoolsError::malformed_xml(path, format!("not valid UTF-8: {e}")))?;
        Self::parse(path, source)
    }

    /// Parse fragment text; `path` is only used for error reporting.
    pub fn parse(path: impl Into<PathBuf>, source: String) -> Result<Self> {
        let path = path.into();
        let spans = scan_elements(&source).map_err(|msg| PubtoolsError::malformed_xml(&path, msg))?;
        Ok(Self {
            path,
            source,
            spans,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drain every `layout`, then `portlet`, then `role` element, wherever
    /// they sit in the tree.
    ///
    /// Each element is moved, never copied. Within one kind every match is
    /// taken in document order, an outer element before the ones nested in
    /// it. Once a kind is drained, its elements are gone from the fragment:
    /// later kinds only match what is left. A taken element's text omits
    /// every taken element nested inside it.
    pub fn into_elements(self) -> Vec<MovedElement> {
        let mut taken: Vec<(ElementKind, &ElementSpan)> = Vec::new();

        for kind in ElementKind::ALL {
            let detached = taken.len();
            for span in self.spans.iter().filter(|s| s.name == kind.tag()) {
                if taken[..detached].iter().any(|(_, t)| t.contains(span)) {
                    continue;
                }
                taken.push((kind, span));
            }
        }

        let moved: Vec<MovedElement> = taken
            .iter()
            .map(|(kind, span)| MovedElement {
                kind: *kind,
                xml: self.detached_text(span, &taken),
            })
            .collect();

        debug!(path = %self.path.display(), elements = moved.len(), "drained fragment");
        moved
    }

    /// Source text of `span` with every taken descendant cut out.
    fn detached_text(&self, span: &ElementSpan, taken: &[(ElementKind, &ElementSpan)]) -> String {
        let mut inner: Vec<&ElementSpan> = taken
            .iter()
            .map(|(_, s)| *s)
            .filter(|s| span.contains(s))
            .collect();
        inner.sort_by_key(|s| s.start);

        let mut out = String::with_capacity(span.end - span.start);
        let mut cursor = span.start;
        for s in inner {
            // already inside a removed range
            if s.start < cursor {
                continue;
            }
            out.push_str(&self.source[cursor..s.start]);
            cursor = s.end;
        }
        out.push_str(&self.source[cursor..span.end]);
        out
    }
}
