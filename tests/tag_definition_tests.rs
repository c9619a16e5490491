//! Tag file loading and attribute checks against the checked-in fixtures
use std::path::PathBuf;

use markup_verifier::definitions::{load_all_tags, TagLibrary};
use markup_verifier::verifiers::TagAttributeVerifier;
use markup_verifier::Verifier;

fn tags_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/tags")
}

fn verifier() -> Verifier {
    Verifier::TagAttribute(TagAttributeVerifier::load(&tags_dir(), "utf-8").expect("load tags"))
}

#[test]
fn test_definitions_are_named_after_their_path() {
    let definitions = load_all_tags(&tags_dir(), "utf-8").unwrap();
    let names: Vec<_> = definitions.iter().map(|d| d.name.as_str()).collect();

    assert_eq!(names, vec!["testWidget:hasAttribute", "testWidget:noAttribute"]);
    assert_eq!(definitions[0].attribute_names(), vec!["attribute"]);
    assert!(definitions[1].attributes.is_empty());
}

#[test]
fn test_attribute_fields_are_read() {
    let library = TagLibrary::load(&tags_dir(), "utf-8").unwrap();
    let definition = library.get("TESTWIDGET:HASATTRIBUTE").expect("case-insensitive lookup");
    let attribute = definition.find_attribute("Attribute").expect("declared attribute");

    assert_eq!(attribute.required.as_deref(), Some("false"));
    assert_eq!(attribute.rtexprvalue.as_deref(), Some("true"));
    assert_eq!(
        attribute.description.as_deref(),
        Some("free text shown by the widget")
    );
    assert_eq!(attribute.attr_type, None);
}

#[test]
fn test_undefined_attributes_are_detected() {
    let errors = verifier().verify_text(
        "<testWidget:noAttribute attribute>\
           <testWidget:hasAttribute noSuch=\"attribute\"></testWidget:hasAttribute>\
         </testWidget:noAttribute>",
        "path",
    );

    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e.verifier_name() == "TagAttributeVerifier"));
}

#[test]
fn test_defined_attributes_pass() {
    let errors = verifier().verify_text(
        "<testWidget:noAttribute>\
           <testWidget:hasAttribute attribute></testWidget:hasAttribute>\
         </testWidget:noAttribute>",
        "path",
    );

    assert!(errors.is_empty());
}

#[test]
fn test_tags_outside_the_definition_directory_are_not_checked() {
    let errors = verifier().verify_text(
        "<testWidget:notExist noSuchAttribute></testWidget:notExist>",
        "path",
    );

    assert!(errors.is_empty());
}
