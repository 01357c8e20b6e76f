//! Host-document query collaborator over html5ever/rcdom.
//!
//! The instantiation pipeline needs a narrow contract from the document:
//! find annotated descendants (or self) in document order, find direct
//! script-type children, detach a node, and read attributes. Everything here
//! serves that contract and nothing else.
//!
//! html5ever lowercases HTML attribute names while parsing, so attribute
//! lookups compare names ASCII-case-insensitively: a query for `widgetType`
//! matches the stored `widgettype`. Parameter-name matching above this layer
//! stays case-sensitive.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::rc::Rc;

use crate::error::ParserError;

pub struct MarkupDocument {
    dom: RcDom,
}

impl MarkupDocument {
    pub fn from_html(html: &str) -> Result<Self, ParserError> {
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .map_err(|e| ParserError::document_parse(&e.to_string()))?;
        Ok(MarkupDocument { dom })
    }

    pub fn root(&self) -> Handle {
        self.dom.document.clone()
    }

    /// All elements under `root` (or the whole document), self included,
    /// carrying `attribute` — in document order, parents before children.
    pub fn scan(&self, root: Option<&Handle>, attribute: &str) -> Vec<Handle> {
        let start = root.cloned().unwrap_or_else(|| self.root());
        let mut out = Vec::new();
        scan_into(&start, attribute, &mut out);
        out
    }

    pub fn by_id(&self, id: &str) -> Option<Handle> {
        find_by_id(&self.root(), id)
    }
}

fn scan_into(node: &Handle, attribute: &str, out: &mut Vec<Handle>) {
    if has_attr(node, attribute) {
        out.push(node.clone());
    }
    for child in node.children.borrow().iter() {
        scan_into(child, attribute, out);
    }
}

fn find_by_id(node: &Handle, id: &str) -> Option<Handle> {
    if attr(node, "id").as_deref() == Some(id) {
        return Some(node.clone());
    }
    for child in node.children.borrow().iter() {
        if let Some(found) = find_by_id(child, id) {
            return Some(found);
        }
    }
    None
}

/// Element tag name, lowercase. `None` for non-element nodes.
pub fn tag_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

/// Attribute value by ASCII-case-insensitive name.
pub fn attr(node: &Handle, name: &str) -> Option<String> {
    if let NodeData::Element { attrs, .. } = &node.data {
        for a in attrs.borrow().iter() {
            if a.name.local.as_ref().eq_ignore_ascii_case(name) {
                return Some(a.value.to_string());
            }
        }
    }
    None
}

pub fn has_attr(node: &Handle, name: &str) -> bool {
    attr(node, name).is_some()
}

/// Concatenated text content of the node's subtree.
pub fn text_content(node: &Handle) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text(node: &Handle, out: &mut String) {
    if let NodeData::Text { contents } = &node.data {
        out.push_str(&contents.borrow());
    }
    for child in node.children.borrow().iter() {
        collect_text(child, out);
    }
}

/// Direct `<script>` children whose `type` attribute starts with `prefix`.
pub fn script_children(node: &Handle, prefix: &str) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|child| {
            tag_name(child).as_deref() == Some("script")
                && attr(child, "type").is_some_and(|t| t.starts_with(prefix))
        })
        .cloned()
        .collect()
}

/// Remove a node from its parent's child list.
pub fn detach(node: &Handle) {
    if let Some(weak) = node.parent.take() {
        if let Some(parent) = weak.upgrade() {
            parent
                .children
                .borrow_mut()
                .retain(|child| !Rc::ptr_eq(child, node));
        }
    }
}

/// Ancestors of `node`, nearest first.
pub fn ancestors(node: &Handle) -> Vec<Handle> {
    let mut out = Vec::new();
    let mut current = node.clone();
    loop {
        let weak = current.parent.take();
        let parent = weak.as_ref().and_then(|w| w.upgrade());
        current.parent.set(weak);
        match parent {
            Some(p) => {
                out.push(p.clone());
                current = p;
            }
            None => break,
        }
    }
    out
}

/// Stable identity key for a node within one document.
pub fn node_key(node: &Handle) -> usize {
    Rc::as_ptr(node) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_document_order() {
        let doc = MarkupDocument::from_html(
            r#"<div widgetType="a" id="outer">
                 <span widgetType="b" id="first"></span>
                 <span widgetType="c" id="second"></span>
               </div>"#,
        )
        .unwrap();
        let found = doc.scan(None, "widgetType");
        let ids: Vec<_> = found.iter().filter_map(|n| attr(n, "id")).collect();
        assert_eq!(ids, vec!["outer", "first", "second"]);
    }

    #[test]
    fn test_scan_includes_root_itself() {
        let doc =
            MarkupDocument::from_html(r#"<div widgetType="a" id="r"><p widgetType="b"></p></div>"#)
                .unwrap();
        let root = doc.by_id("r").unwrap();
        let found = doc.scan(Some(&root), "widgetType");
        assert_eq!(found.len(), 2);
        assert!(Rc::ptr_eq(&found[0], &root));
    }

    #[test]
    fn test_attr_case_insensitive() {
        let doc =
            MarkupDocument::from_html(r#"<div jsId="w1" dojoType="pkg.Widget"></div>"#).unwrap();
        let found = doc.scan(None, "dojoType");
        assert_eq!(found.len(), 1);
        assert_eq!(attr(&found[0], "jsId").as_deref(), Some("w1"));
        assert_eq!(attr(&found[0], "JSID").as_deref(), Some("w1"));
        assert_eq!(attr(&found[0], "missing"), None);
    }

    #[test]
    fn test_script_children_and_detach() {
        let doc = MarkupDocument::from_html(
            r#"<div id="host">
                 <script type="dojo/connect" event="onClick">doSomething();</script>
                 <script type="text/javascript">plain();</script>
               </div>"#,
        )
        .unwrap();
        let host = doc.by_id("host").unwrap();
        let scripts = script_children(&host, "dojo/");
        assert_eq!(scripts.len(), 1);
        assert_eq!(text_content(&scripts[0]).trim(), "doSomething();");

        detach(&scripts[0]);
        assert!(script_children(&host, "dojo/").is_empty());
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let doc =
            MarkupDocument::from_html(r#"<div id="a"><div id="b"><div id="c"></div></div></div>"#)
                .unwrap();
        let leaf = doc.by_id("c").unwrap();
        let chain = ancestors(&leaf);
        let ids: Vec<_> = chain.iter().filter_map(|n| attr(n, "id")).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
