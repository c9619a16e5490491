//! Tag Definition Types
//!
//! Component (tag file) definitions as declared by `<%@attribute%>`
//! directives.

use serde::Serialize;

use crate::parser::eq_ignore_case;

/// One declared attribute of a component.
///
/// Every field is optional: an undeclared field is `None`, which is distinct
/// from a field declared with an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttributeDefinition {
    pub name: Option<String>,
    pub description: Option<String>,
    pub required: Option<String>,
    #[serde(rename = "type")]
    pub attr_type: Option<String>,
    pub rtexprvalue: Option<String>,
    pub fragment: Option<String>,
}

/// A loadable component and its declared attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagDefinition {
    /// Colon-namespaced name derived from the definition file path
    pub name: String,
    /// Attributes in declaration order
    pub attributes: Vec<AttributeDefinition>,
}

impl AttributeDefinition {
    /// Check if this attribute has the given name (case-insensitive)
    pub fn matches_name(&self, name: &str) -> bool {
        self.name
            .as_deref()
            .is_some_and(|declared| eq_ignore_case(declared, name))
    }
}

impl TagDefinition {
    /// Find an attribute definition by case-insensitive name
    pub fn find_attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.attributes.iter().find(|attr| attr.matches_name(name))
    }

    /// Declared attribute names in declaration order
    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter_map(|attr| attr.name.as_deref())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute(name: &str) -> AttributeDefinition {
        AttributeDefinition {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_find_attribute_is_case_insensitive() {
        let definition = TagDefinition {
            name: "field:text".to_string(),
            attributes: vec![attribute("name"), attribute("cssClass")],
        };

        assert!(definition.find_attribute("CSSCLASS").is_some());
        assert!(definition.find_attribute("title").is_none());
        assert_eq!(definition.attribute_names(), vec!["name", "cssClass"]);
    }

    #[test]
    fn test_definition_serializes_with_declared_field_names() {
        let definition = TagDefinition {
            name: "field:text".to_string(),
            attributes: vec![AttributeDefinition {
                attr_type: Some("java.lang.String".to_string()),
                ..attribute("name")
            }],
        };
        let json = serde_json::to_value(&definition).unwrap();

        assert_eq!(json["name"], "field:text");
        assert_eq!(json["attributes"][0]["type"], "java.lang.String");
        assert!(json["attributes"][0]["required"].is_null());
    }

    #[test]
    fn test_unnamed_attribute_never_matches() {
        let definition = TagDefinition {
            name: "broken".to_string(),
            attributes: vec![AttributeDefinition::default()],
        };

        assert!(definition.find_attribute("").is_none());
        assert!(definition.attribute_names().is_empty());
    }
}
