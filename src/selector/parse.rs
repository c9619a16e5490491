//! Selector Parser
//!
//! Hand-written recursive descent over a small CSS-like grammar:
//! selector lists, compound selectors, the four combinators, attribute
//! predicates and the `:not()` / `:has()` pseudo-classes. A backslash escapes
//! the next character, which is how colon-namespaced tag names such as
//! `n\:form` are written.

use thiserror::Error;

/// Error produced when a selector string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid selector `{selector}` at offset {offset}: {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub offset: usize,
    pub reason: String,
}

/// Relationship between two compound selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `a b`
    Descendant,
    /// `a > b`
    Child,
    /// `a + b`
    Adjacent,
    /// `a ~ b`
    Sibling,
}

/// Attribute value operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    /// `[a=v]`
    Equals,
    /// `[a~=v]`
    Includes,
    /// `[a|=v]`
    DashMatch,
    /// `[a^=v]`
    Prefix,
    /// `[a$=v]`
    Suffix,
    /// `[a*=v]`
    Substring,
}

/// Simple selectors that refine a compound selector
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Id(String),
    Class(String),
    Attribute {
        name: String,
        /// `None` tests presence only
        value: Option<(AttrOp, String)>,
        case_insensitive: bool,
    },
    Not(Vec<ComplexSelector>),
    Has(Vec<RelativeSelector>),
    FirstChild,
    LastChild,
    OnlyChild,
    Empty,
}

/// Type selector plus filters, e.g. `table\:plain[resultSetName]`
#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    /// `None` is the universal selector
    pub tag: Option<String>,
    pub filters: Vec<Filter>,
}

/// Compounds joined by combinators; `combinators[i]` joins `parts[i]` and
/// `parts[i + 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSelector {
    pub parts: Vec<Compound>,
    pub combinators: Vec<Combinator>,
}

/// Selector inside `:has()`, anchored to the element being tested
#[derive(Debug, Clone, PartialEq)]
pub struct RelativeSelector {
    pub leading: Combinator,
    pub selector: ComplexSelector,
}

/// Parse a comma-separated selector list
pub fn parse_selector_list(source: &str) -> Result<Vec<ComplexSelector>, SelectorError> {
    let mut parser = Parser { source, pos: 0 };
    let list = parser.complex_list()?;
    parser.skip_whitespace();
    if parser.pos < source.len() {
        return Err(parser.error("unexpected character"));
    }
    Ok(list)
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, reason: &str) -> SelectorError {
        SelectorError {
            selector: self.source.to_string(),
            offset: self.pos,
            reason: reason.to_string(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), SelectorError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected `{expected}`")))
        }
    }

    /// Returns true when any whitespace was skipped
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos > start
    }

    fn complex_list(&mut self) -> Result<Vec<ComplexSelector>, SelectorError> {
        let mut list = vec![self.complex()?];
        loop {
            self.skip_whitespace();
            if !self.eat(',') {
                return Ok(list);
            }
            list.push(self.complex()?);
        }
    }

    fn relative_list(&mut self) -> Result<Vec<RelativeSelector>, SelectorError> {
        let mut list = Vec::new();
        loop {
            self.skip_whitespace();
            let leading = self.explicit_combinator().unwrap_or(Combinator::Descendant);
            list.push(RelativeSelector {
                leading,
                selector: self.complex()?,
            });
            self.skip_whitespace();
            if !self.eat(',') {
                return Ok(list);
            }
        }
    }

    fn explicit_combinator(&mut self) -> Option<Combinator> {
        let combinator = match self.peek()? {
            '>' => Combinator::Child,
            '+' => Combinator::Adjacent,
            '~' => Combinator::Sibling,
            _ => return None,
        };
        self.bump();
        Some(combinator)
    }

    fn complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        self.skip_whitespace();
        let mut parts = vec![self.compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.explicit_combinator() {
                Some(combinator) => {
                    self.skip_whitespace();
                    combinator
                }
                None => match self.peek() {
                    None | Some(',') | Some(')') => break,
                    Some(_) if had_space => Combinator::Descendant,
                    Some(_) => return Err(self.error("unexpected character")),
                },
            };
            combinators.push(combinator);
            parts.push(self.compound()?);
        }

        Ok(ComplexSelector { parts, combinators })
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let start = self.pos;
        let tag = if self.eat('*') {
            None
        } else if self.at_ident_start() {
            Some(self.ident()?)
        } else {
            None
        };

        let mut filters = Vec::new();
        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    filters.push(Filter::Id(self.ident()?));
                }
                Some('.') => {
                    self.bump();
                    filters.push(Filter::Class(self.ident()?));
                }
                Some('[') => filters.push(self.attribute()?),
                Some(':') => filters.push(self.pseudo()?),
                _ => break,
            }
        }

        if self.pos == start {
            return Err(self.error("expected a selector"));
        }
        Ok(Compound { tag, filters })
    }

    fn at_ident_start(&self) -> bool {
        match self.peek() {
            Some('\\') => true,
            Some(c) => is_ident_char(c),
            None => false,
        }
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.bump();
                ident.push(self.escape()?);
            } else if is_ident_char(c) {
                self.bump();
                ident.push(c);
            } else {
                break;
            }
        }
        if ident.is_empty() {
            return Err(self.error("expected an identifier"));
        }
        Ok(ident)
    }

    /// Escape after a backslash: up to six hex digits, or one literal char
    fn escape(&mut self) -> Result<char, SelectorError> {
        let start = self.pos;
        let hex_len = self.source[start..]
            .chars()
            .take(6)
            .take_while(char::is_ascii_hexdigit)
            .count();

        if hex_len == 0 {
            return self.bump().ok_or_else(|| self.error("dangling escape"));
        }

        let code = u32::from_str_radix(&self.source[start..start + hex_len], 16)
            .map_err(|_| self.error("invalid escape"))?;
        self.pos += hex_len;
        // A single whitespace terminates a hex escape
        if self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn attribute(&mut self) -> Result<Filter, SelectorError> {
        self.expect('[')?;
        self.skip_whitespace();
        let name = self.ident()?;
        self.skip_whitespace();

        if self.eat(']') {
            return Ok(Filter::Attribute {
                name,
                value: None,
                case_insensitive: false,
            });
        }

        let op = match self.bump() {
            Some('=') => AttrOp::Equals,
            Some(c @ ('~' | '|' | '^' | '$' | '*')) => {
                self.expect('=')?;
                match c {
                    '~' => AttrOp::Includes,
                    '|' => AttrOp::DashMatch,
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    _ => AttrOp::Substring,
                }
            }
            _ => return Err(self.error("expected attribute operator")),
        };

        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => self.quoted(quote)?,
            _ => self.ident()?,
        };
        self.skip_whitespace();

        let case_insensitive = if self.eat('i') || self.eat('I') {
            true
        } else {
            let _ = self.eat('s') || self.eat('S');
            false
        };
        self.skip_whitespace();
        self.expect(']')?;

        Ok(Filter::Attribute {
            name,
            value: Some((op, value)),
            case_insensitive,
        })
    }

    fn quoted(&mut self, quote: char) -> Result<String, SelectorError> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('\\') => value.push(self.escape()?),
                Some(c) if c == quote => return Ok(value),
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn pseudo(&mut self) -> Result<Filter, SelectorError> {
        self.expect(':')?;
        let name = self.ident()?.to_ascii_lowercase();

        match name.as_str() {
            "not" => {
                self.expect('(')?;
                let list = self.complex_list()?;
                self.skip_whitespace();
                self.expect(')')?;
                Ok(Filter::Not(list))
            }
            "has" => {
                self.expect('(')?;
                let list = self.relative_list()?;
                self.skip_whitespace();
                self.expect(')')?;
                Ok(Filter::Has(list))
            }
            "first-child" => Ok(Filter::FirstChild),
            "last-child" => Ok(Filter::LastChild),
            "only-child" => Ok(Filter::OnlyChild),
            "empty" => Ok(Filter::Empty),
            _ => Err(self.error(&format!("unsupported pseudo-class `:{name}`"))),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}
