//! Target element traversal.

use std::collections::BTreeSet;

use ego_tree::NodeId;

use crate::document::Document;
use crate::error::RewriteError;

/// Counters for one traversal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// Target elements handed to the visitor.
    pub visited: usize,
    /// Elements whose content changed.
    pub rewritten: usize,
    /// Elements skipped because of their parent tag.
    pub skipped_forbidden: usize,
    /// Elements the visitor failed to rewrite.
    pub failed: usize,
    /// Total term replacements.
    pub replacements: usize,
}

/// Visit every element named in `target_tags` below `container`.
///
/// Tags are processed in the given order, each tag's elements in document
/// order. The element list is taken again after every rewrite, so target
/// elements nested inside a rewritten element are visited through their
/// reparsed copies. A visited element keeps its position, which makes the
/// next index in the fresh list the element following it. Elements whose
/// immediate parent tag is in `forbidden` are skipped. A failing visit leaves
/// its element unchanged and the walk continues.
pub fn walk<F>(
    doc: &mut Document,
    container: NodeId,
    target_tags: &[String],
    forbidden: &BTreeSet<String>,
    mut visit: F,
) -> RewriteStats
where
    F: FnMut(&mut Document, NodeId) -> Result<usize, RewriteError>,
{
    let mut stats = RewriteStats::default();

    for tag in target_tags {
        let mut elements = doc.elements_by_tag(container, tag);
        let mut index = 0;

        while let Some(&id) = elements.get(index) {
            index += 1;

            let parent = doc.ancestor_path(id).pop();
            if parent.is_some_and(|parent| forbidden.contains(&parent)) {
                stats.skipped_forbidden += 1;
                continue;
            }

            stats.visited += 1;
            match visit(doc, id) {
                Ok(0) => {}
                Ok(count) => {
                    stats.rewritten += 1;
                    stats.replacements += count;
                    elements = doc.elements_by_tag(container, tag);
                }
                Err(e) => {
                    tracing::debug!(tag = %tag, error = %e, "Leaving element unchanged");
                    stats.failed += 1;
                }
            }
        }
    }

    stats
}
