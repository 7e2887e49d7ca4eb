//! Per-element rewriting.
//!
//! An element is serialized, its inner markup (between the first `>` and the
//! last `<`) is run through the matcher, and the reassembled markup is parsed
//! again. The children of the reparsed element then replace the children of
//! the live element, which keeps its position and its opening tag. The opening
//! tag is never scanned, so attributes of the element itself are never
//! annotated.

use ego_tree::NodeId;
use scraper::Html;

use crate::document::Document;
use crate::error::RewriteError;
use crate::matcher::Parsed;

/// Elements that a body-context fragment parse drops, so their reassembled
/// markup cannot round-trip on its own.
const CONTEXT_SENSITIVE_TAGS: &[&str] = &[
    "caption", "col", "colgroup", "tbody", "td", "tfoot", "th", "thead", "tr",
];

/// Split serialized element markup into opening tag, inner markup and
/// closing tag.
///
/// Returns `None` when there is no inner region, as for void elements.
pub fn split_markup(outer: &str) -> Option<(&str, &str, &str)> {
    let start = outer.find('>')? + 1;
    let end = outer.rfind('<')?;
    if end < start {
        return None;
    }
    Some((&outer[..start], &outer[start..end], &outer[end..]))
}

/// Rewrite the inner content of one element.
///
/// `parse_inner` maps the inner markup to its annotated form. Returns the
/// number of replacements made; the tree is only touched when that number is
/// non-zero.
///
/// # Errors
///
/// Returns an error, leaving the element untouched, when the element has no
/// inner content or the annotated markup does not reparse into the same
/// element.
pub fn rewrite_element<F>(
    doc: &mut Document,
    id: NodeId,
    parse_inner: F,
) -> Result<usize, RewriteError>
where
    F: FnOnce(&str) -> Parsed,
{
    let tag = doc.element_name(id).unwrap_or_default().to_owned();
    let outer = doc
        .outer_html(id)
        .ok_or_else(|| RewriteError::NotAnElement { tag: tag.clone() })?;
    let (open, inner, close) =
        split_markup(&outer).ok_or_else(|| RewriteError::NoInnerContent { tag: tag.clone() })?;

    let parsed = parse_inner(inner);
    if parsed.replacements == 0 {
        return Ok(0);
    }

    let reassembled = format!("{open}{}{close}", parsed.text);
    let (fragment, source_parent) = reparse(&reassembled, &parsed.text, &tag)?;
    doc.replace_children(id, &fragment, source_parent);

    Ok(parsed.replacements)
}

/// Parse reassembled element markup and locate the node whose children should
/// replace the live element's children.
fn reparse(reassembled: &str, inner: &str, tag: &str) -> Result<(Html, NodeId), RewriteError> {
    let fragment = Html::parse_fragment(reassembled);
    let reparsed = {
        let mut children = fragment.root_element().children();
        match (children.next(), children.next()) {
            (Some(only), None)
                if only
                    .value()
                    .as_element()
                    .is_some_and(|element| element.name().eq_ignore_ascii_case(tag)) =>
            {
                Some(only.id())
            }
            _ => None,
        }
    };
    if let Some(id) = reparsed {
        return Ok((fragment, id));
    }

    if CONTEXT_SENSITIVE_TAGS.contains(&tag) {
        let fragment = Html::parse_fragment(inner);
        let root = fragment.root_element().id();
        return Ok((fragment, root));
    }

    Err(RewriteError::Reassembly {
        tag: tag.to_owned(),
    })
}
