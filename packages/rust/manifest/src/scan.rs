//! Element span scanner.
//!
//! Walks an XML document with `quick-xml` and records, for every element,
//! the byte offsets of its start tag, its end tag, and its nesting depth.
//! The merge works on these spans so that moved subtrees keep their exact
//! source bytes.

use quick_xml::Reader;
use quick_xml::events::Event;

/// Byte layout of one element within its source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ElementSpan {
    /// Qualified tag name as written (`ns:tag` stays `ns:tag`).
    pub name: String,
    /// Offset of the opening `<`.
    pub start: usize,
    /// Offset of the closing `</`, or `None` for a self-closing element.
    pub content_end: Option<usize>,
    /// Offset just past the final `>`.
    pub end: usize,
    /// Nesting depth; the document element is 0.
    pub depth: usize,
}

impl ElementSpan {
    /// Whether `other` lies entirely inside this element.
    pub fn contains(&self, other: &ElementSpan) -> bool {
        other.start > self.start && other.end <= self.end
    }
}

/// Scan `src` and return every element span in document order.
///
/// Fails on any well-formedness error `quick-xml` reports, on unclosed
/// elements, on a document without elements, and on more than one
/// top-level element.
pub(crate) fn scan_elements(src: &str) -> Result<Vec<ElementSpan>, String> {
    let mut reader = Reader::from_str(src);
    reader.config_mut().trim_text(false);

    let mut spans: Vec<ElementSpan> = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut top_level = 0usize;

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| format!("at byte {before}: {e}"))?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => {
                check_attributes(&e, before)?;
                if open.is_empty() {
                    top_level += 1;
                }
                open.push(spans.len());
                spans.push(ElementSpan {
                    name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    start: before,
                    content_end: None,
                    end: after,
                    depth: open.len() - 1,
                });
            }
            Event::Empty(e) => {
                check_attributes(&e, before)?;
                if open.is_empty() {
                    top_level += 1;
                }
                spans.push(ElementSpan {
                    name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    start: before,
                    content_end: None,
                    end: after,
                    depth: open.len(),
                });
            }
            Event::End(e) => {
                let idx = open.pop().ok_or_else(|| {
                    format!(
                        "at byte {before}: unexpected end tag </{}>",
                        String::from_utf8_lossy(e.name().as_ref())
                    )
                })?;
                let span = &mut spans[idx];
                span.content_end = Some(before);
                span.end = after;
            }
            Event::Eof => break,
            _ => {}
        }

        if top_level > 1 {
            return Err(format!("at byte {before}: content after the document element"));
        }
    }

    if let Some(&idx) = open.last() {
        return Err(format!("unclosed element <{}>", spans[idx].name));
    }
    if spans.is_empty() {
        return Err("document has no root element".into());
    }

    Ok(spans)
}

fn check_attributes(e: &quick_xml::events::BytesStart<'_>, at: usize) -> Result<(), String> {
    for attr in e.attributes() {
        attr.map_err(|err| format!("at byte {at}: {err}"))?;
    }
    Ok(())
}
