//! Tree Queries
//!
//! CSS-like selectors evaluated against a parsed [`Document`]. Tag and
//! attribute names match case-insensitively; attribute values match exactly
//! unless the `i` flag is given. The synthetic document root never matches.

pub mod parse;

use std::fmt;

use crate::parser::{Document, NodeId};

pub use parse::{
    AttrOp, Combinator, ComplexSelector, Compound, Filter, RelativeSelector, SelectorError,
};

/// A compiled selector list
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    source: String,
    list: Vec<ComplexSelector>,
}

impl Selector {
    /// Parse a selector list such as `jsp\:attribute c\:choose, p.note`
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        Ok(Self {
            source: source.to_string(),
            list: parse::parse_selector_list(source)?,
        })
    }

    /// The selector text as configured
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the element at `id` matches any selector of the list
    pub fn matches(&self, document: &Document, id: NodeId) -> bool {
        document.element(id).is_some()
            && self
                .list
                .iter()
                .any(|complex| matches_complex(document, complex, id, None))
    }

    /// All matching elements of the document, in document order
    pub fn select(&self, document: &Document) -> Vec<NodeId> {
        document
            .elements()
            .filter(|&id| self.matches(document, id))
            .collect()
    }

    /// Whether any element of the document matches
    pub fn matches_any(&self, document: &Document) -> bool {
        document.elements().any(|id| self.matches(document, id))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Constraint tying the leftmost compound of a `:has()` argument to the
/// element under test
#[derive(Clone, Copy)]
struct Anchor {
    combinator: Combinator,
    scope: NodeId,
}

fn matches_complex(
    document: &Document,
    complex: &ComplexSelector,
    id: NodeId,
    anchor: Option<Anchor>,
) -> bool {
    match complex.parts.len() {
        0 => false,
        len => matches_from(document, complex, len - 1, id, anchor),
    }
}

/// Right-to-left matching with backtracking over ancestors and siblings
fn matches_from(
    document: &Document,
    complex: &ComplexSelector,
    index: usize,
    id: NodeId,
    anchor: Option<Anchor>,
) -> bool {
    if !matches_compound(document, &complex.parts[index], id) {
        return false;
    }

    if index == 0 {
        return match anchor {
            None => true,
            Some(anchor) => related(document, anchor.combinator, anchor.scope, id),
        };
    }

    let next = |candidate: NodeId| matches_from(document, complex, index - 1, candidate, anchor);
    match complex.combinators[index - 1] {
        Combinator::Descendant => document.ancestors(id).any(next),
        Combinator::Child => document.parent_element(id).is_some_and(next),
        Combinator::Adjacent => document
            .preceding_siblings(id)
            .first()
            .copied()
            .is_some_and(next),
        Combinator::Sibling => document.preceding_siblings(id).into_iter().any(next),
    }
}

/// Whether `id` stands in `combinator` relation to `scope`
fn related(document: &Document, combinator: Combinator, scope: NodeId, id: NodeId) -> bool {
    match combinator {
        Combinator::Descendant => document.is_ancestor(scope, id),
        Combinator::Child => document.node(id).parent == Some(scope),
        Combinator::Adjacent => document.preceding_siblings(id).first() == Some(&scope),
        Combinator::Sibling => document.preceding_siblings(id).contains(&scope),
    }
}

fn matches_compound(document: &Document, compound: &Compound, id: NodeId) -> bool {
    let Some(element) = document.element(id) else {
        return false;
    };

    if let Some(tag) = &compound.tag {
        if !element.is_named(tag) {
            return false;
        }
    }

    compound.filters.iter().all(|filter| match filter {
        Filter::Id(expected) => element.attribute("id") == Some(expected.as_str()),
        Filter::Class(expected) => element
            .attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == expected.as_str())),
        Filter::Attribute {
            name,
            value,
            case_insensitive,
        } => match (element.attribute(name), value) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(actual), Some((op, expected))) => {
                attribute_matches(actual, *op, expected, *case_insensitive)
            }
        },
        Filter::Not(list) => !list
            .iter()
            .any(|complex| matches_complex(document, complex, id, None)),
        Filter::Has(list) => list.iter().any(|relative| has_match(document, relative, id)),
        Filter::FirstChild => document.preceding_siblings(id).is_empty(),
        Filter::LastChild => document.following_siblings(id).is_empty(),
        Filter::OnlyChild => {
            document.preceding_siblings(id).is_empty()
                && document.following_siblings(id).is_empty()
        }
        Filter::Empty => document.node(id).children.is_empty(),
    })
}

fn has_match(document: &Document, relative: &RelativeSelector, scope: NodeId) -> bool {
    let candidates = match relative.leading {
        Combinator::Descendant | Combinator::Child => document.descendants(scope),
        Combinator::Adjacent | Combinator::Sibling => document
            .following_siblings(scope)
            .into_iter()
            .flat_map(|sibling| std::iter::once(sibling).chain(document.descendants(sibling)))
            .collect(),
    };
    let anchor = Some(Anchor {
        combinator: relative.leading,
        scope,
    });

    candidates
        .into_iter()
        .any(|candidate| matches_complex(document, &relative.selector, candidate, anchor))
}

fn attribute_matches(actual: &str, op: AttrOp, expected: &str, case_insensitive: bool) -> bool {
    let (actual, expected) = if case_insensitive {
        (actual.to_lowercase(), expected.to_lowercase())
    } else {
        (actual.to_string(), expected.to_string())
    };

    match op {
        AttrOp::Equals => actual == expected,
        AttrOp::Includes => actual.split_whitespace().any(|word| word == expected),
        AttrOp::DashMatch => {
            actual == expected || actual.starts_with(&format!("{expected}-"))
        }
        AttrOp::Prefix => !expected.is_empty() && actual.starts_with(&expected),
        AttrOp::Suffix => !expected.is_empty() && actual.ends_with(&expected),
        AttrOp::Substring => !expected.is_empty() && actual.contains(&expected),
    }
}
