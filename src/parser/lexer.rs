//! Markup Lexer
//!
//! Permissive tokenization of template markup (HTML with JSP directives,
//! scriptlets and colon-namespaced custom tags). Anything that does not look
//! like a tag is passed through as text, so the lexer never fails.
//!
//! JSP scriptlets, expressions, declarations and comments become tokens of
//! their own, named after their opening marker (`%`, `%=`, `%!`, `%--`), so
//! usage rules can allow or reject them like any other tag.

use std::borrow::Cow;

/// A token produced by the markup lexer
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    /// Start tag like `<n:form name="f">`, or a directive like `<%@page %>`
    StartTag {
        name: Cow<'a, str>,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    },
    /// End tag like `</n:form>`
    EndTag { name: &'a str },
    /// `<% code %>`, `<%= expr %>`, `<%! decl %>` or `<%-- note --%>`
    Scriptlet { marker: &'a str, body: &'a str },
    /// Character data, HTML comments and declarations, verbatim
    Text(&'a str),
}

/// Prefix used for the tag name of JSP directives (`<%@attribute ...%>`)
pub const DIRECTIVE_PREFIX: &str = "%@";

/// Scriptlet markers with their terminators, longest marker first
pub const SCRIPTLET_MARKERS: [(&str, &str); 4] =
    [("%--", "--%>"), ("%=", "%>"), ("%!", "%>"), ("%", "%>")];

/// Elements whose content is raw text up to the matching end tag
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

/// Tokenize a whole document
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut lexer = Lexer { input, pos: 0 };
    let mut tokens = Vec::new();

    while lexer.pos < input.len() {
        let token = lexer.next_token();

        // Script and style bodies are not markup
        if let Token::StartTag {
            name,
            self_closing: false,
            ..
        } = &token
        {
            if let Some(raw) = RAW_TEXT_ELEMENTS
                .iter()
                .find(|raw| raw.eq_ignore_ascii_case(name))
                .copied()
            {
                tokens.push(token);
                if let Some(text) = lexer.raw_text_until_end_tag(raw) {
                    tokens.push(Token::Text(text));
                }
                continue;
            }
        }

        tokens.push(token);
    }

    tokens
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Consume up to and including `terminator`, or to end of input
    fn consume_through(&mut self, terminator: &str) -> &'a str {
        let start = self.pos;
        match self.rest().find(terminator) {
            Some(idx) => self.pos += idx + terminator.len(),
            None => self.pos = self.input.len(),
        }
        &self.input[start..self.pos]
    }

    fn next_token(&mut self) -> Token<'a> {
        let rest = self.rest();

        if !rest.starts_with('<') {
            let start = self.pos;
            let len = rest.find('<').unwrap_or(rest.len());
            self.pos += len;
            return Token::Text(&self.input[start..self.pos]);
        }

        if rest.starts_with("<!--") {
            return Token::Text(self.consume_through("-->"));
        }
        if rest.starts_with("<%@") {
            return self.directive();
        }
        if let Some((marker, terminator)) = SCRIPTLET_MARKERS
            .iter()
            .copied()
            .find(|(marker, _)| rest[1..].starts_with(marker))
        {
            return self.scriptlet(marker, terminator);
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            return Token::Text(self.consume_through(">"));
        }
        if rest.starts_with("</") {
            return self.end_tag();
        }

        match rest[1..].chars().next() {
            Some(c) if is_name_start(c) => self.start_tag(),
            _ => {
                // Lone '<' is plain text
                let start = self.pos;
                self.pos += 1;
                Token::Text(&self.input[start..self.pos])
            }
        }
    }

    fn start_tag(&mut self) -> Token<'a> {
        self.bump(); // '<'
        let name = Cow::Borrowed(self.name());
        let (attributes, self_closing) = self.attributes(false);
        Token::StartTag {
            name,
            attributes,
            self_closing,
        }
    }

    /// `<%@name attr="v" %>` becomes a start tag named `%@name`
    fn directive(&mut self) -> Token<'a> {
        self.pos += 3; // "<%@"
        let after_open = self.pos;
        self.skip_whitespace();
        let bare = self.name();

        // Borrow "%@name" straight from the input unless a gap separates them
        let name = if self.pos - bare.len() == after_open {
            Cow::Borrowed(&self.input[after_open - 2..self.pos])
        } else {
            Cow::Owned(format!("{DIRECTIVE_PREFIX}{bare}"))
        };

        let (attributes, _) = self.attributes(true);
        Token::StartTag {
            name,
            attributes,
            self_closing: true,
        }
    }

    /// Scriptlet body runs to its terminator, or to end of input
    fn scriptlet(&mut self, marker: &'static str, terminator: &str) -> Token<'a> {
        self.pos += 1 + marker.len(); // '<' and the marker
        let start = self.pos;
        let body = match self.rest().find(terminator) {
            Some(len) => {
                self.pos += len + terminator.len();
                &self.input[start..start + len]
            }
            None => {
                self.pos = self.input.len();
                &self.input[start..]
            }
        };
        Token::Scriptlet { marker, body }
    }

    fn end_tag(&mut self) -> Token<'a> {
        self.pos += 2; // "</"
        let name = self.name();
        self.consume_through(">");
        Token::EndTag { name }
    }

    fn name(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '>' || c == '/' || c == '=' {
                break;
            }
            if c == '%' && self.rest().starts_with("%>") {
                break;
            }
            self.bump();
        }
        &self.input[start..self.pos]
    }

    /// Parse attributes until `>`, `/>` or (for directives) `%>`
    fn attributes(&mut self, directive: bool) -> (Vec<(String, String)>, bool) {
        let mut attributes: Vec<(String, String)> = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            let rest = self.rest();

            if rest.is_empty() {
                break;
            }
            if directive && rest.starts_with("%>") {
                self.pos += 2;
                break;
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                self_closing = true;
                break;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            if rest.starts_with('/') || rest.starts_with('=') {
                self.bump();
                continue;
            }

            let name = self.name().to_string();
            if name.is_empty() {
                // Stray character such as a lone '%'
                self.bump();
                continue;
            }
            self.skip_whitespace();
            let value = if self.peek() == Some('=') {
                self.bump();
                self.skip_whitespace();
                self.attribute_value(directive)
            } else {
                String::new()
            };

            // First occurrence of a key wins
            if !attributes
                .iter()
                .any(|(existing, _)| existing.eq_ignore_ascii_case(&name))
            {
                attributes.push((name, value));
            }
        }

        (attributes, self_closing)
    }

    fn attribute_value(&mut self, directive: bool) -> String {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let start = self.pos;
                let len = self.rest().find(quote).unwrap_or(self.rest().len());
                self.pos += len;
                let value = &self.input[start..self.pos];
                self.bump(); // closing quote, if any
                decode_entities(value).into_owned()
            }
            _ => {
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c.is_whitespace() || c == '>' {
                        break;
                    }
                    if directive && self.rest().starts_with("%>") {
                        break;
                    }
                    self.bump();
                }
                decode_entities(&self.input[start..self.pos]).into_owned()
            }
        }
    }

    /// Raw text up to (not including) `</name`, case-insensitive
    fn raw_text_until_end_tag(&mut self, name: &str) -> Option<&'a str> {
        let start = self.pos;
        let needle = format!("</{name}");
        let lower = self.rest().to_ascii_lowercase();
        let len = lower.find(&needle).unwrap_or(lower.len());
        self.pos += len;
        (len > 0).then(|| &self.input[start..self.pos])
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Decode character references (`&amp;`, `&#38;`, `&#x26;`) in an attribute
/// value. Unknown references are kept as written.
pub fn decode_entities(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }

    let mut decoded = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        decoded.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let reference = rest
            .find(';')
            .and_then(|end| decode_reference(&rest[1..end]).map(|ch| (ch, end)));
        match reference {
            Some((ch, end)) => {
                decoded.push(ch);
                rest = &rest[end + 1..];
            }
            None => {
                decoded.push('&');
                rest = &rest[1..];
            }
        }
    }
    decoded.push_str(rest);
    Cow::Owned(decoded)
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}
