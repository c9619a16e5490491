//! Document Tree
//!
//! Arena representation of a parsed document. Nodes are stored in document
//! order; parents own their children through index lists and every node keeps
//! a lookup-only index of its parent.

use std::fmt::Write as _;

use crate::parser::lexer::{Token, DIRECTIVE_PREFIX, SCRIPTLET_MARKERS};

/// Index of a node inside a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

/// A tagged element
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Tag name as written in the source
    pub tag_name: String,
    /// Attributes in source order, keys unique per element
    pub attributes: Vec<(String, String)>,
    /// Whether the source used `<tag/>` syntax
    pub self_closing: bool,
}

impl Element {
    /// Case-insensitive tag name comparison
    pub fn is_named(&self, name: &str) -> bool {
        eq_ignore_case(&self.tag_name, name)
    }

    /// Look up an attribute value by case-insensitive name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| eq_ignore_case(key, name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether this element is a `<%@...%>` directive
    pub fn is_directive(&self) -> bool {
        self.tag_name.starts_with(DIRECTIVE_PREFIX)
    }

    /// Terminator of a JSP scriptlet element, `None` for ordinary elements
    pub fn scriptlet_terminator(&self) -> Option<&'static str> {
        SCRIPTLET_MARKERS
            .iter()
            .find(|(marker, _)| *marker == self.tag_name)
            .map(|&(_, terminator)| terminator)
    }

    /// Whether this element never takes child elements (HTML void elements,
    /// directives, scriptlets)
    pub fn is_void(&self) -> bool {
        self.is_directive()
            || self.scriptlet_terminator().is_some()
            || VOID_ELEMENTS
                .iter()
                .any(|void| void.eq_ignore_ascii_case(&self.tag_name))
    }
}

/// Kind-specific payload of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Synthetic document root, never matched by queries
    Root,
    Element(Element),
    /// Text, HTML comments and declarations, verbatim. Also the body of a
    /// scriptlet element.
    Text(String),
}

/// A node of the document tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A parsed document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    nodes: Vec<Node>,
}

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Names of open elements that a start tag closes implicitly
fn implicitly_closed(opening: &str) -> &'static [&'static str] {
    match opening.to_ascii_lowercase().as_str() {
        "li" => &["li"],
        "p" => &["p"],
        "tr" => &["tr", "th", "td"],
        "th" => &["th"],
        "td" => &["thead", "th", "td"],
        "tbody" | "tfoot" => &["thead", "tbody"],
        "option" => &["option"],
        "optgroup" => &["optgroup", "option"],
        "dd" | "dt" => &["dt", "dd"],
        "rt" | "rp" => &["rt", "rp"],
        "body" => &["head", "link", "script"],
        "select" | "input" | "output" | "button" | "datalist" | "textarea" => &["select"],
        "address" | "article" | "aside" | "blockquote" | "details" | "div" | "dl"
        | "fieldset" | "figcaption" | "figure" | "footer" | "form" | "h1" | "h2" | "h3"
        | "h4" | "h5" | "h6" | "header" | "hr" | "main" | "nav" | "ol" | "pre" | "section"
        | "table" | "ul" => &["p"],
        _ => &[],
    }
}

/// Case-insensitive comparison used for tag and attribute names
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

impl Document {
    /// Build a document from lexer tokens
    pub fn from_tokens(tokens: Vec<Token<'_>>) -> Self {
        let mut document = Document {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        };
        // Open elements, innermost last; the root is never popped
        let mut open = vec![document.root()];

        for token in tokens {
            let current = *open.last().unwrap_or(&document.root());
            match token {
                Token::StartTag {
                    name,
                    attributes,
                    self_closing,
                } => {
                    let element = Element {
                        tag_name: name.into_owned(),
                        attributes,
                        self_closing,
                    };

                    // `<li>a<li>b` yields sibling items
                    let closes = implicitly_closed(&element.tag_name);
                    while open.len() > 1
                        && open
                            .last()
                            .and_then(|&id| document.element(id))
                            .is_some_and(|open_element| {
                                closes.iter().any(|name| open_element.is_named(name))
                            })
                    {
                        open.pop();
                    }
                    let parent = *open.last().unwrap_or(&document.root());

                    let leaf = self_closing || element.is_void();
                    let id = document.push(parent, NodeKind::Element(element));
                    if !leaf {
                        open.push(id);
                    }
                }
                Token::EndTag { name } => {
                    // Close up to the nearest open element of that name; stray
                    // end tags are ignored
                    let position = open.iter().skip(1).rposition(|&id| {
                        document
                            .element(id)
                            .is_some_and(|element| element.is_named(name))
                    });
                    if let Some(position) = position {
                        open.truncate(position + 1);
                    }
                }
                Token::Scriptlet { marker, body } => {
                    let element = Element {
                        tag_name: marker.to_string(),
                        attributes: Vec::new(),
                        self_closing: false,
                    };
                    let id = document.push(current, NodeKind::Element(element));
                    if !body.is_empty() {
                        document.push(id, NodeKind::Text(body.to_string()));
                    }
                }
                Token::Text(text) => {
                    document.push(current, NodeKind::Text(text.to_string()));
                }
            }
        }

        document
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// The synthetic root node
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// The element stored at `id`, if that node is an element
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// All elements in document order
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node.kind, NodeKind::Element(_)))
            .map(|(idx, _)| NodeId(idx))
    }

    /// Parent element, excluding the synthetic root
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0]
            .parent
            .filter(|&parent| self.element(parent).is_some())
    }

    /// Ancestor elements, nearest first, excluding the synthetic root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent_element(id), move |&current| {
            self.parent_element(current)
        })
    }

    /// Whether `ancestor` is a proper ancestor of `id`
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        std::iter::successors(self.nodes[id.0].parent, |&current| {
            self.nodes[current.0].parent
        })
        .any(|current| current == ancestor)
    }

    /// Child elements in document order
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(|&child| self.element(child).is_some())
    }

    /// Descendant elements of `id` in document order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id.0].children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if self.element(current).is_some() {
                found.push(current);
            }
            stack.extend(self.nodes[current.0].children.iter().rev().copied());
        }
        found
    }

    /// Element siblings preceding `id`, nearest first
    pub fn preceding_siblings(&self, id: NodeId) -> Vec<NodeId> {
        self.sibling_elements(id)
            .into_iter()
            .take_while(|&sibling| sibling != id)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect()
    }

    /// Element siblings following `id`, nearest first
    pub fn following_siblings(&self, id: NodeId) -> Vec<NodeId> {
        self.sibling_elements(id)
            .into_iter()
            .skip_while(|&sibling| sibling != id)
            .skip(1)
            .collect()
    }

    fn sibling_elements(&self, id: NodeId) -> Vec<NodeId> {
        match self.nodes[id.0].parent {
            Some(parent) => self.element_children(parent).collect(),
            None => Vec::new(),
        }
    }

    /// Serialize a node and its subtree back to markup
    pub fn outer_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Concatenated serialization of several nodes
    pub fn outer_markup_all(&self, ids: &[NodeId]) -> String {
        let mut out = String::new();
        for &id in ids {
            self.write_node(id, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        match &node.kind {
            NodeKind::Root => {
                for &child in &node.children {
                    self.write_node(child, out);
                }
            }
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element(element) => {
                out.push('<');
                out.push_str(&element.tag_name);
                if let Some(terminator) = element.scriptlet_terminator() {
                    for &child in &node.children {
                        self.write_node(child, out);
                    }
                    out.push_str(terminator);
                    return;
                }
                for (key, value) in &element.attributes {
                    let escaped = value.replace('&', "&amp;").replace('"', "&quot;");
                    let _ = write!(out, " {}=\"{}\"", key, escaped);
                }

                if element.is_directive() {
                    out.push_str(" %>");
                    return;
                }
                if element.self_closing && node.children.is_empty() {
                    out.push_str(" />");
                    return;
                }
                out.push('>');
                if element.is_void() && node.children.is_empty() {
                    return;
                }

                for &child in &node.children {
                    self.write_node(child, out);
                }
                let _ = write!(out, "</{}>", element.tag_name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    fn tag_names(document: &Document, ids: impl IntoIterator<Item = NodeId>) -> Vec<String> {
        ids.into_iter()
            .filter_map(|id| document.element(id))
            .map(|element| element.tag_name.clone())
            .collect()
    }

    #[test]
    fn test_elements_in_document_order() {
        let document = parse_document("<html><body><div><p></p></div><span></span></body></html>");

        assert_eq!(
            tag_names(&document, document.elements()),
            vec!["html", "body", "div", "p", "span"]
        );
    }

    #[test]
    fn test_ancestors_exclude_root() {
        let document = parse_document("<n:form><button:block><button:submit/></button:block></n:form>");
        let submit = document.elements().last().unwrap();

        assert_eq!(
            tag_names(&document, document.ancestors(submit)),
            vec!["button:block", "n:form"]
        );
        let form = document.elements().next().unwrap();
        assert_eq!(document.ancestors(form).count(), 0);
        assert!(document.is_ancestor(form, submit));
        assert!(!document.is_ancestor(submit, form));
    }

    #[test]
    fn test_mismatched_end_tags() {
        // </span> has no open element and is ignored; </div> closes <p> too
        let document = parse_document("<div><p>text</span></div><em></em>");
        let ids: Vec<_> = document.elements().collect();

        assert_eq!(tag_names(&document, ids.clone()), vec!["div", "p", "em"]);
        assert_eq!(document.parent_element(ids[1]), Some(ids[0]));
        assert_eq!(document.parent_element(ids[2]), None);
    }

    #[test]
    fn test_unclosed_elements_close_at_end() {
        let document = parse_document("<div><p>");
        let ids: Vec<_> = document.elements().collect();

        assert_eq!(ids.len(), 2);
        assert_eq!(document.parent_element(ids[1]), Some(ids[0]));
    }

    #[test]
    fn test_void_elements_have_no_children() {
        let document = parse_document("<p><br><img src=\"a.png\"><span></span></p>");
        let p = document.elements().next().unwrap();

        assert_eq!(
            tag_names(&document, document.element_children(p)),
            vec!["br", "img", "span"]
        );
    }

    #[test]
    fn test_siblings() {
        let document = parse_document("<ul><li id=\"a\"></li><li id=\"b\"></li><li id=\"c\"></li></ul>");
        let ids: Vec<_> = document.elements().collect();

        assert_eq!(document.preceding_siblings(ids[3]), vec![ids[2], ids[1]]);
        assert_eq!(document.following_siblings(ids[1]), vec![ids[2], ids[3]]);
        assert!(document.following_siblings(ids[3]).is_empty());
    }

    #[test]
    fn test_element_attribute_lookup_is_case_insensitive() {
        let document = parse_document("<table:plain resultSetName=\"rows\"></table:plain>");
        let element = document.element(document.elements().next().unwrap()).unwrap();

        assert_eq!(element.attribute("resultsetname"), Some("rows"));
        assert!(element.is_named("TABLE:PLAIN"));
        assert_eq!(element.attribute("missing"), None);
    }

    #[test]
    fn test_start_tags_close_open_list_items_and_paragraphs() {
        let document = parse_document("<ul><li>a<li>b</ul><p>one<p>two<div></div>");
        let ids: Vec<_> = document.elements().collect();

        assert_eq!(
            tag_names(&document, ids.clone()),
            vec!["ul", "li", "li", "p", "p", "div"]
        );
        assert_eq!(document.parent_element(ids[2]), Some(ids[0]));
        assert_eq!(document.parent_element(ids[4]), None);
        assert_eq!(document.parent_element(ids[5]), None);
    }

    #[test]
    fn test_table_cells_close_implicitly() {
        let document = parse_document("<table><tr><td>a<td>b<tr><td>c</table>");
        let ids: Vec<_> = document.elements().collect();

        assert_eq!(
            tag_names(&document, document.element_children(ids[0])),
            vec!["tr", "tr"]
        );
        assert_eq!(
            tag_names(&document, document.element_children(ids[1])),
            vec!["td", "td"]
        );
    }

    #[test]
    fn test_custom_tags_do_not_close_paragraphs() {
        let document = parse_document("<p><table:plain></table:plain><n:form></n:form></p>");
        let p = document.elements().next().unwrap();

        assert_eq!(
            tag_names(&document, document.element_children(p)),
            vec!["table:plain", "n:form"]
        );
    }

    #[test]
    fn test_scriptlets_are_leaf_elements() {
        let document = parse_document("<div><% if (x) { %><p>a</p><% } %><%-- note --%></div>");
        let div = document.elements().next().unwrap();

        assert_eq!(
            tag_names(&document, document.element_children(div)),
            vec!["%", "p", "%", "%--"]
        );
        assert_eq!(
            document.outer_markup(div),
            "<div><% if (x) { %><p>a</p><% } %><%-- note --%></div>"
        );
    }

    #[test]
    fn test_outer_markup_escapes_attribute_values() {
        let document = parse_document("<a title=\"x &amp; &quot;y&quot;\"></a>");
        let a = document.elements().next().unwrap();

        assert_eq!(document.element(a).unwrap().attribute("title"), Some("x & \"y\""));
        assert_eq!(
            document.outer_markup(a),
            "<a title=\"x &amp; &quot;y&quot;\"></a>"
        );
    }

    #[test]
    fn test_outer_markup() {
        let document =
            parse_document("<div class=\"box\"><n:set var=\"x\"/>hi<br><%@page x=\"1\"%></div>");
        let div = document.elements().next().unwrap();

        assert_eq!(
            document.outer_markup(div),
            "<div class=\"box\"><n:set var=\"x\" />hi<br><%@page x=\"1\" %></div>"
        );
    }
}
