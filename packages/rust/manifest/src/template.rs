//! The template document that receives merged elements.
//!
//! Rendering splices appended elements into the template's original text:
//! everything inside `<root>` that was not touched stays byte-for-byte as
//! written.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use pubtools_shared::{PubtoolsError, Result};

use crate::element::{ElementKind, MovedElement};
use crate::fragment::Fragment;
use crate::scan::{ElementSpan, scan_elements};

/// Name of the element whose subtree becomes the output document.
pub const ROOT_TAG: &str = "root";

/// Declaration written before the merged root.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// One of the three containers, with the elements queued for it.
#[derive(Debug, Clone)]
struct Container {
    span: ElementSpan,
    appended: Vec<String>,
}

/// A loaded template with its root and containers located.
#[derive(Debug, Clone)]
pub struct Template {
    path: PathBuf,
    source: String,
    root: ElementSpan,
    containers: [Container; 3],
}

impl Template {
    /// Read the template at `path` and locate `root` and its containers.
    ///
    /// A path that is not an existing regular file yields
    /// [`PubtoolsError::MissingTemplateFile`].
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PubtoolsError::MissingTemplateFile {
                path: path.to_path_buf(),
            });
        }

        let bytes = std::fs::read(path).map_err(|e| PubtoolsError::io(path, e))?;
        let source = String::from_utf8(bytes)
            .map_err(|e| PubtoolsError::malformed_xml(path, format!("not valid UTF-8: {e}")))?;

        let template = Self::parse(path, source)?;
        info!("found template");
        Ok(template)
    }

    /// Parse template text; `path` is only used for error reporting.
    pub fn parse(path: impl Into<PathBuf>, source: String) -> Result<Self> {
        let path = path.into();
        let spans = scan_elements(&source).map_err(|msg| PubtoolsError::malformed_xml(&path, msg))?;

        let root = spans
            .iter()
            .find(|s| s.name == ROOT_TAG)
            .cloned()
            .ok_or_else(|| PubtoolsError::MissingElement {
                path: path.clone(),
                element: ROOT_TAG.into(),
            })?;

        let find_container = |kind: ElementKind| -> Result<Container> {
            spans
                .iter()
                .find(|s| s.name == kind.container_tag() && root.contains(s))
                .map(|span| Container {
                    span: span.clone(),
                    appended: Vec::new(),
                })
                .ok_or_else(|| PubtoolsError::MissingElement {
                    path: path.clone(),
                    element: kind.container_tag().into(),
                })
        };

        let containers = [
            find_container(ElementKind::Layout)?,
            find_container(ElementKind::Portlet)?,
            find_container(ElementKind::Role)?,
        ];

        Ok(Self {
            path,
            source,
            root,
            containers,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Queue one element for its container.
    pub fn append(&mut self, element: MovedElement) {
        self.containers[element.kind.index()].appended.push(element.xml);
    }

    /// Move every mergeable element of `fragment` into this template.
    /// Returns the number of elements appended.
    pub fn merge_fragment(&mut self, fragment: Fragment) -> usize {
        let elements = fragment.into_elements();
        let count = elements.len();
        for element in elements {
            self.append(element);
        }
        count
    }

    /// Number of elements appended so far to the container for `kind`.
    pub fn appended_count(&self, kind: ElementKind) -> usize {
        self.containers[kind.index()].appended.len()
    }

    /// Serialize the merged root, preceded by the XML declaration.
    pub fn render(&self) -> String {
        let mut edits: Vec<(usize, usize, String)> = self
            .containers
            .iter()
            .filter(|c| !c.appended.is_empty())
            .map(|c| container_edit(&self.source, c))
            .collect();
        edits.sort_by_key(|(start, _, _)| *start);

        let mut out = String::with_capacity(
            XML_DECLARATION.len()
                + (self.root.end - self.root.start)
                + edits.iter().map(|(_, _, s)| s.len()).sum::<usize>(),
        );
        out.push_str(XML_DECLARATION);

        let mut cursor = self.root.start;
        for (start, end, replacement) in &edits {
            out.push_str(&self.source[cursor..*start]);
            out.push_str(replacement);
            cursor = *end;
        }
        out.push_str(&self.source[cursor..self.root.end]);
        out
    }

    /// Render and write to `target`, replacing any existing file.
    ///
    /// Writes to a hidden temp file beside `target`, then renames it, so a
    /// failed run never leaves a partial output.
    #[instrument(skip_all, fields(target = %target.display()))]
    pub fn write_atomic(&self, target: &Path) -> Result<()> {
        let rendered = self.render();

        let file_name = target
            .file_name()
            .ok_or_else(|| {
                PubtoolsError::validation(format!("output path has no file name: {}", target.display()))
            })?
            .to_string_lossy();
        let temp = target.with_file_name(format!(".{file_name}.tmp"));

        std::fs::write(&temp, rendered.as_bytes()).map_err(|e| PubtoolsError::io(&temp, e))?;
        if let Err(e) = std::fs::rename(&temp, target) {
            let _ = std::fs::remove_file(&temp);
            return Err(PubtoolsError::io(target, e));
        }

        debug!(bytes = rendered.len(), "wrote merged manifest");
        Ok(())
    }
}

/// Byte range to replace and its replacement for a container with
/// appended children.
fn container_edit(source: &str, container: &Container) -> (usize, usize, String) {
    let span = &container.span;
    let children: String = container.appended.concat();

    match span.content_end {
        Some(at) => (at, at, children),
        None => {
            // <tag .../> becomes <tag ...>children</tag>
            let tag = &source[span.start..span.end];
            let open = tag.strip_suffix("/>").unwrap_or(tag);
            (
                span.start,
                span.end,
                format!("{open}>{children}</{}>", span.name),
            )
        }
    }
}
