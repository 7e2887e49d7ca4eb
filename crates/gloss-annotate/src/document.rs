//! Parsed HTML document with in-place subtree replacement.
//!
//! Wraps [`scraper::Html`], whose tree is a mutable [`ego_tree::Tree`]. Inputs
//! that open with a doctype or an `<html>`, `<head>` or `<body>` tag (after
//! leading whitespace and comments) are parsed as full documents; anything
//! else is parsed as a body fragment and serialized back without the
//! synthesized document wrapper.

use std::sync::LazyLock;

use ego_tree::{NodeId, NodeRef, Tree};
use regex::Regex;
use scraper::{ElementRef, Html, Node};

/// Detects markup that is a full document rather than a fragment.
static DOCUMENT_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^(?:\s|<!--.*?-->)*<(?:!doctype|html|head|body)[\s>]").unwrap()
});

/// How the source markup was parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    /// Complete page with `<html>`/`<body>`.
    Full,
    /// Body fragment without document wrapper.
    Fragment,
}

/// In-memory HTML tree for a single annotation run.
#[derive(Debug)]
pub struct Document {
    html: Html,
    kind: DocumentKind,
}

impl Document {
    /// Parse markup tolerantly. Parse errors are recorded by the parser and
    /// otherwise ignored.
    pub fn parse(markup: &str) -> Self {
        if DOCUMENT_TAG_RE.is_match(markup) {
            Self {
                html: Html::parse_document(markup),
                kind: DocumentKind::Full,
            }
        } else {
            Self {
                html: Html::parse_fragment(markup),
                kind: DocumentKind::Fragment,
            }
        }
    }

    /// How the markup was parsed.
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Number of errors the tolerant parser recovered from.
    pub fn parse_errors(&self) -> usize {
        self.html.errors.len()
    }

    /// Container whose descendants are candidates for annotation.
    ///
    /// The `<body>` element of a full document, or the fragment root. Returns
    /// `None` for documents without a body (framesets).
    pub fn body(&self) -> Option<NodeId> {
        match self.kind {
            DocumentKind::Full => self
                .html
                .tree
                .root()
                .descendants()
                .find(|node| element_name(*node) == Some("body"))
                .map(|node| node.id()),
            DocumentKind::Fragment => Some(self.html.root_element().id()),
        }
    }

    /// Elements named `tag` below `container`, in document order.
    ///
    /// The container itself is not included.
    pub fn elements_by_tag(&self, container: NodeId, tag: &str) -> Vec<NodeId> {
        let Some(container) = self.html.tree.get(container) else {
            return Vec::new();
        };
        container
            .descendants()
            .skip(1)
            .filter(|node| element_name(*node).is_some_and(|name| name.eq_ignore_ascii_case(tag)))
            .map(|node| node.id())
            .collect()
    }

    /// Tag name of an element node.
    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        self.html.tree.get(id).and_then(element_name)
    }

    /// Tag names from the outermost ancestor down to the immediate parent.
    ///
    /// Non-element ancestors and the synthesized root of a fragment are not
    /// part of the path, so top-level nodes have an empty path.
    pub fn ancestor_path(&self, id: NodeId) -> Vec<String> {
        let Some(node) = self.html.tree.get(id) else {
            return Vec::new();
        };
        let fragment_root = self.fragment_root();
        let mut path: Vec<String> = node
            .ancestors()
            .filter(|ancestor| Some(ancestor.id()) != fragment_root)
            .filter_map(|ancestor| element_name(ancestor).map(str::to_owned))
            .collect();
        path.reverse();
        path
    }

    /// Whether the node is still connected to the document root.
    ///
    /// Nodes replaced by an earlier rewrite are detached.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let root = self.html.tree.root().id();
        match self.html.tree.get(id) {
            Some(node) => node.id() == root || node.ancestors().any(|a| a.id() == root),
            None => false,
        }
    }

    /// Serialized markup of an element including its own tags.
    pub fn outer_html(&self, id: NodeId) -> Option<String> {
        let node = self.html.tree.get(id)?;
        ElementRef::wrap(node).map(|element| element.html())
    }

    /// Replace the children of `target` with deep copies of the children of
    /// `source_parent` in `source`.
    ///
    /// `target` keeps its identity, attributes and position among siblings.
    pub fn replace_children(&mut self, target: NodeId, source: &Html, source_parent: NodeId) {
        let Some(source_parent) = source.tree.get(source_parent) else {
            return;
        };
        let old_children: Vec<NodeId> = match self.html.tree.get(target) {
            Some(node) => node.children().map(|child| child.id()).collect(),
            None => return,
        };
        for child in old_children {
            if let Some(mut child) = self.html.tree.get_mut(child) {
                child.detach();
            }
        }
        for child in source_parent.children() {
            copy_subtree(&mut self.html.tree, target, child);
        }
    }

    /// Serialize the document.
    ///
    /// Fragments serialize to their content only.
    pub fn serialize(&self) -> String {
        match self.kind {
            DocumentKind::Full => self.html.html(),
            DocumentKind::Fragment => self.html.root_element().inner_html(),
        }
    }

    fn fragment_root(&self) -> Option<NodeId> {
        match self.kind {
            DocumentKind::Full => None,
            DocumentKind::Fragment => Some(self.html.root_element().id()),
        }
    }
}

/// Tag name of an element node, `None` for other node types.
fn element_name(node: NodeRef<'_, Node>) -> Option<&str> {
    node.value().as_element().map(scraper::node::Element::name)
}

/// Append a deep copy of `source` as the last child of `parent`.
fn copy_subtree(tree: &mut Tree<Node>, parent: NodeId, source: NodeRef<'_, Node>) {
    let Some(mut parent) = tree.get_mut(parent) else {
        return;
    };
    let copied = parent.append(source.value().clone()).id();
    for child in source.children() {
        copy_subtree(tree, copied, child);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_fragment_round_trip() {
        let doc = Document::parse("<p>Hello <b>world</b></p><p>Again</p>");

        assert_eq!(doc.kind(), DocumentKind::Fragment);
        assert_eq!(doc.serialize(), "<p>Hello <b>world</b></p><p>Again</p>");
    }

    #[test]
    fn test_full_document_detection() {
        let doc = Document::parse("<!DOCTYPE html><html><body><p>x</p></body></html>");

        assert_eq!(doc.kind(), DocumentKind::Full);
        assert!(doc.serialize().contains("<body><p>x</p></body>"));
    }

    #[test]
    fn test_full_document_after_leading_comment() {
        let doc = Document::parse("\n<!-- generated -->\n<html><body><p>x</p></body></html>");

        assert_eq!(doc.kind(), DocumentKind::Full);
    }

    #[test]
    fn test_document_tags_later_in_fragment() {
        let markup = "<p>x</p><!-- <body> --><script>let s = \"<html>\";</script>";
        let doc = Document::parse(markup);

        assert_eq!(doc.kind(), DocumentKind::Fragment);
        assert_eq!(doc.serialize(), markup);
    }

    #[test]
    fn test_body_of_full_document() {
        let doc = Document::parse("<html><head><title>t</title></head><body><p>x</p></body></html>");
        let body = doc.body().unwrap();

        assert_eq!(doc.element_name(body), Some("body"));
        assert_eq!(doc.elements_by_tag(body, "p").len(), 1);
        assert!(doc.elements_by_tag(body, "title").is_empty());
    }

    #[test]
    fn test_elements_by_tag_in_document_order() {
        let doc = Document::parse("<div><p>a</p><section><p>b</p></section></div><P>c</P>");
        let body = doc.body().unwrap();
        let ids = doc.elements_by_tag(body, "p");

        let texts: Vec<String> = ids
            .iter()
            .map(|id| doc.outer_html(*id).unwrap())
            .collect();
        assert_eq!(texts, vec!["<p>a</p>", "<p>b</p>", "<p>c</p>"]);
    }

    #[test]
    fn test_ancestor_path() {
        let doc = Document::parse("<div><blockquote><p>x</p></blockquote></div><p>y</p>");
        let body = doc.body().unwrap();
        let ids = doc.elements_by_tag(body, "p");

        assert_eq!(doc.ancestor_path(ids[0]), vec!["div", "blockquote"]);
        assert!(doc.ancestor_path(ids[1]).is_empty());
    }

    #[test]
    fn test_ancestor_path_in_full_document() {
        let doc = Document::parse("<html><body><p>x</p></body></html>");
        let body = doc.body().unwrap();
        let p = doc.elements_by_tag(body, "p")[0];

        assert_eq!(doc.ancestor_path(p), vec!["html", "body"]);
    }

    #[test]
    fn test_replace_children_keeps_position() {
        let mut doc = Document::parse("<p>one</p><p>two</p><p>three</p>");
        let body = doc.body().unwrap();
        let second = doc.elements_by_tag(body, "p")[1];

        let source = Html::parse_fragment("<i>2</i> and more");
        doc.replace_children(second, &source, source.root_element().id());

        assert_eq!(
            doc.serialize(),
            "<p>one</p><p><i>2</i> and more</p><p>three</p>"
        );
    }

    #[test]
    fn test_replaced_descendants_are_detached() {
        let mut doc = Document::parse("<div><span>a</span></div>");
        let body = doc.body().unwrap();
        let div = doc.elements_by_tag(body, "div")[0];
        let span = doc.elements_by_tag(body, "span")[0];

        let source = Html::parse_fragment("<span>b</span>");
        doc.replace_children(div, &source, source.root_element().id());

        assert!(doc.is_attached(div));
        assert!(!doc.is_attached(span));
    }

    #[test]
    fn test_outer_html_of_non_element() {
        let doc = Document::parse("text only");
        let body = doc.body().unwrap();
        let text = doc.html.tree.get(body).unwrap().first_child().unwrap().id();

        assert!(doc.outer_html(text).is_none());
    }
}
