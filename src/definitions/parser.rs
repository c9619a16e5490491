//! Tag file parsing
//!
//! Extracts the `<%@attribute ...%>` directives of a tag file body.

use crate::definitions::schema::AttributeDefinition;
use crate::parser::parse_document;

const ATTRIBUTE_DIRECTIVE: &str = "%@attribute";

/// Parse every attribute directive of a tag file, in declaration order
pub fn parse_tag_file(body: &str) -> Vec<AttributeDefinition> {
    let document = parse_document(body);

    document
        .elements()
        .filter_map(|id| document.element(id))
        .filter(|element| element.is_named(ATTRIBUTE_DIRECTIVE))
        .map(|element| {
            let field = |name: &str| element.attribute(name).map(str::to_string);
            AttributeDefinition {
                name: field("name"),
                description: field("description"),
                required: field("required"),
                attr_type: field("type"),
                rtexprvalue: field("rtexprvalue"),
                fragment: field("fragment"),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_fields() {
        let definitions = parse_tag_file(
            "<%@attribute name=\"attribute name\" description=\"attribute description\" \
             required=\"is attribute required\" type=\"attribute type\" \
             rtexprvalue=\"is attribute rtexpvalue\" fragment=\"is attribute fragment\" %>",
        );

        assert_eq!(definitions.len(), 1);
        let definition = &definitions[0];
        assert_eq!(definition.name.as_deref(), Some("attribute name"));
        assert_eq!(definition.description.as_deref(), Some("attribute description"));
        assert_eq!(definition.required.as_deref(), Some("is attribute required"));
        assert_eq!(definition.attr_type.as_deref(), Some("attribute type"));
        assert_eq!(definition.rtexprvalue.as_deref(), Some("is attribute rtexpvalue"));
        assert_eq!(definition.fragment.as_deref(), Some("is attribute fragment"));
    }

    #[test]
    fn test_undeclared_fields_are_absent() {
        let definitions = parse_tag_file("<%@attribute %>");

        assert_eq!(definitions, vec![AttributeDefinition::default()]);
    }

    #[test]
    fn test_empty_value_is_not_absent() {
        let definitions = parse_tag_file("<%@attribute name=\"x\" description=\"\"%>");

        assert_eq!(definitions[0].description.as_deref(), Some(""));
        assert_eq!(definitions[0].required, None);
    }

    #[test]
    fn test_parse_multiple_definitions_skips_other_directives() {
        let definitions = parse_tag_file(
            "<%@tag%><%@taglib%>\
             <%@attribute name=\"first\" required=\"true\" %>\r\n\
             <%@attribute name=\"second\" type=\"java.lang.String\" %>\r\n\
             <div>${first}</div>",
        );

        let names: Vec<_> = definitions
            .iter()
            .map(|definition| definition.name.as_deref())
            .collect();
        assert_eq!(names, vec![Some("first"), Some("second")]);
        assert_eq!(definitions[1].attr_type.as_deref(), Some("java.lang.String"));
    }
}
