//! Text pattern rules
//!
//! Required patterns are searched in the whole document and may span lines.
//! Forbidden patterns are tested one line at a time, so a forbidden construct
//! broken over two lines is not reported.

use serde::Deserialize;
use serde_json::Value;

use super::rules::{compile_pattern, parse_config, with_comment, PatternMatcher, PatternRules};
use super::VerificationInput;
use crate::error::ConfigError;
use crate::validation::VerificationError;

pub const NAME: &str = "RegexpBasedVerifier";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegexpConfig {
    #[serde(default)]
    pub required: PatternRules,
    #[serde(default)]
    pub forbidden: PatternRules,
}

#[derive(Debug, Clone)]
pub struct RegexpBasedVerifier {
    required: Vec<PatternMatcher>,
    forbidden: Vec<PatternMatcher>,
}

impl RegexpBasedVerifier {
    pub fn new(config: &RegexpConfig) -> Result<Self, ConfigError> {
        let compile = |rules: &PatternRules| {
            rules
                .iter()
                .map(|rule| compile_pattern(NAME, rule))
                .collect::<Result<Vec<_>, _>>()
        };

        Ok(Self {
            required: compile(&config.required)?,
            forbidden: compile(&config.forbidden)?,
        })
    }

    pub fn from_value(config: &Value) -> Result<Self, ConfigError> {
        Self::new(&parse_config(NAME, config)?)
    }

    pub fn verify(&self, input: &VerificationInput<'_>, path: &str) -> Vec<VerificationError> {
        let mut errors = Vec::new();

        for matcher in &self.required {
            if !matcher.regex.is_match(input.text) {
                let message = format!("no text matching {} was found", matcher.rule.pattern);
                errors.push(VerificationError::new(
                    NAME,
                    with_comment(message, &matcher.rule.comment),
                    path,
                    "",
                ));
            }
        }

        if self.forbidden.is_empty() {
            return errors;
        }

        for (index, line) in input.text.split('\n').enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            for matcher in &self.forbidden {
                if matcher.regex.is_match(line) {
                    let message = format!(
                        "line {}: text matching {} was found",
                        index + 1,
                        matcher.rule.pattern
                    );
                    errors.push(VerificationError::new(
                        NAME,
                        with_comment(message, &matcher.rule.comment),
                        path,
                        line,
                    ));
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use serde_json::json;

    fn run(config: Value, text: &str) -> Vec<VerificationError> {
        let verifier = RegexpBasedVerifier::from_value(&config).unwrap();
        let document = parse_document(text);
        verifier.verify(&VerificationInput::new(text, &document), "test.jsp")
    }

    const PAGE: &str = "<html>\n\
                        <head>\n\
                        <script src=\"js/devtool.js\"></script>\n\
                        <meta charset=\"utf-8\">\n\
                        </head>\n\
                        <body><br/></body>\n\
                        </html>";

    #[test]
    fn test_empty_rules_report_nothing() {
        assert!(run(Value::Null, PAGE).is_empty());
        assert!(run(json!({}), PAGE).is_empty());
    }

    #[test]
    fn test_required_and_forbidden() {
        let errors = run(
            json!({
                "required": {"Script\\s+src": ""},
                "forbidden": {"META": "", "/>": "use a plain end tag"}
            }),
            PAGE,
        );

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message(), "line 4: text matching META was found");
        assert_eq!(errors[0].offending_content(), "<meta charset=\"utf-8\">");
        assert_eq!(
            errors[1].message(),
            "line 6: text matching /> was found (use a plain end tag)"
        );
        assert_eq!(errors[1].path(), "test.jsp");
        assert_eq!(errors[1].verifier_name(), NAME);
    }

    #[test]
    fn test_missing_required_pattern() {
        let errors = run(json!({"required": ["taglib"]}), PAGE);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "no text matching taglib was found");
        assert_eq!(errors[0].offending_content(), "");
    }

    #[test]
    fn test_one_error_per_matching_line() {
        let text = "a foo foo\nfoo\nbar\r\nFOO\r\n";
        let errors = run(json!({"forbidden": ["foo"]}), text);

        assert_eq!(errors.len(), 3);
        assert_eq!(errors[2].offending_content(), "FOO");
        assert!(errors[2].message().starts_with("line 4:"));
    }

    #[test]
    fn test_required_spans_lines_but_forbidden_does_not() {
        let text = "<script\nsrc=\"a.js\"></script>";
        let required = run(json!({"required": ["script\\s+src"]}), text);
        let forbidden = run(json!({"forbidden": ["script\\s+src"]}), text);

        assert!(required.is_empty());
        assert!(forbidden.is_empty());
    }

    #[test]
    fn test_invalid_pattern_fails_construction() {
        let result = RegexpBasedVerifier::from_value(&json!({"forbidden": ["[unclosed"]}));
        assert!(matches!(result, Err(ConfigError::InvalidPattern { .. })));
    }
}
