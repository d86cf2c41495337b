use std::cell::RefCell;

use pretty_assertions::assert_eq;

use crate::{
    css::{parse_stylesheet, CssRule},
    dom::{Element, Page},
    error::Error,
    font::{classify, Category},
};

use super::*;

/// Computed style that always answers with the same value.
struct FixedStyle {
    value: Option<&'static str>,
    queries: RefCell<Vec<(String, String)>>,
}

impl FixedStyle {
    fn new(value: Option<&'static str>) -> Self {
        Self {
            value,
            queries: RefCell::new(Vec::new()),
        }
    }
}

impl ComputedStyle for FixedStyle {
    fn computed_style(&self, selector: &str, property: &str) -> Result<String> {
        self.queries
            .borrow_mut()
            .push((selector.to_owned(), property.to_owned()));
        self.value
            .map(str::to_owned)
            .ok_or_else(|| Error::InvalidSelector(selector.to_owned()))
    }
}

fn decls<'r>(font: Option<&'r str>, font_family: Option<&'r str>) -> FontDeclarations<'r> {
    FontDeclarations {
        selector: "h1",
        font,
        font_family,
    }
}

fn names(fonts: Option<Vec<FamilyName>>) -> Option<Vec<String>> {
    fonts.map(|fonts| fonts.iter().map(|f| f.as_str().to_owned()).collect())
}

fn resolve_names(font: Option<&str>, font_family: Option<&str>) -> Option<Vec<String>> {
    names(resolve(decls(font, font_family), &FixedStyle::new(None)))
}

#[test]
fn resolves_the_longhand() {
    let fonts = resolve(
        decls(None, Some(r#""Courier New", monospace"#)),
        &FixedStyle::new(None),
    );
    assert_eq!(
        fonts,
        Some(vec![
            FamilyName::title("Courier New"),
            FamilyName::Generic("monospace".into())
        ])
    );
}

#[test]
fn resolves_the_shorthand() {
    assert_eq!(
        resolve_names(Some("bold 12px/1.5 Arial, sans-serif"), None),
        Some(vec!["Arial".into(), "sans-serif".into()])
    );
}

#[test]
fn longhand_beats_shorthand() {
    assert_eq!(
        resolve_names(Some("12px Arial"), Some("Georgia, serif")),
        Some(vec!["Georgia".into(), "serif".into()])
    );
    // Even when the shorthand is broken
    assert_eq!(
        resolve_names(Some("Arial"), Some("Georgia")),
        Some(vec!["Georgia".into()])
    );
}

#[test]
fn css_wide_keywords_are_not_fonts() {
    for &keyword in &["inherit", "INITIAL", " unset ", "revert", "revert-layer"] {
        assert_eq!(resolve_names(Some(keyword), None), None);
        assert_eq!(resolve_names(None, Some(keyword)), None);
    }
    // A keyword longhand leaves the shorthand in charge
    assert_eq!(
        resolve_names(Some("12px Arial"), Some("inherit")),
        Some(vec!["Arial".into()])
    );
}

#[test]
fn missing_or_empty_declarations_resolve_to_nothing() {
    assert_eq!(resolve_names(None, None), None);
    assert_eq!(resolve_names(Some(""), Some("  ")), None);
}

#[test]
fn broken_shorthands_resolve_to_nothing() {
    assert_eq!(resolve_names(Some("Arial"), None), None);
    assert_eq!(resolve_names(Some("caption"), None), None);
}

#[test]
fn variables_are_resolved_through_computed_style() {
    let style = FixedStyle::new(Some("Menlo, monospace"));
    let fonts = resolve(decls(None, Some("var(--mono)")), &style);
    assert_eq!(names(fonts), Some(vec!["Menlo".into(), "monospace".into()]));
    assert_eq!(
        *style.queries.borrow(),
        vec![("h1".to_owned(), "font-family".to_owned())]
    );

    let style = FixedStyle::new(Some("14px Menlo"));
    let fonts = resolve(decls(Some("var(--size) var(--mono)"), None), &style);
    assert_eq!(names(fonts), Some(vec!["Menlo".into()]));
    assert_eq!(style.queries.borrow()[0].1, "font");
}

#[test]
fn plain_values_never_query_computed_style() {
    let style = FixedStyle::new(Some("Menlo"));
    resolve(decls(Some("12px Arial"), Some("Arial")), &style);
    assert!(style.queries.borrow().is_empty());
}

#[test]
fn failed_lookups_fall_back_to_the_literal_value() {
    let fonts = resolve(decls(None, Some("var(--mono)")), &FixedStyle::new(None)).unwrap();
    assert_eq!(fonts, vec![FamilyName::title("var(--mono)")]);
    assert_eq!(classify(&fonts), Category::None);

    let fonts = resolve(decls(None, Some("var(--x), serif")), &FixedStyle::new(Some(" "))).unwrap();
    assert_eq!(classify(&fonts), Category::Serif);
}

#[test]
fn declarations_from_style_rules() {
    let rules = parse_stylesheet("h1 { font: 12px Arial; font-family: Georgia !important }");
    let rule = match &rules[0] {
        CssRule::Style(rule) => rule,
        other => panic!("unexpected rule {:?}", other),
    };
    assert_eq!(
        FontDeclarations::from(rule),
        FontDeclarations {
            selector: "h1",
            font: Some("12px Arial"),
            font_family: Some("Georgia"),
        }
    );
}

#[test]
fn declarations_from_serialized_rules() {
    let record = SerializedRule {
        font: String::new(),
        font_family: "Arial".into(),
        selector: ".x".into(),
    };
    let decls = FontDeclarations::from(&record);
    assert_eq!(decls.font, None);
    assert_eq!(decls.font_family, Some("Arial"));
    assert!(!decls.is_empty());
    assert!(FontDeclarations::from(&SerializedRule::default()).is_empty());
}

#[test]
fn resolves_variables_on_a_page() {
    let mut page = Page::new("https://example.org/").unwrap();
    let head = page.head();
    page.append_child(
        head,
        Element::new("style").with_text(
            ":root { --heading: 'Courier New', monospace }\n\
             h1 { font-family: var(--heading) }",
        ),
    );
    let body = page.body();
    page.append_child(body, Element::new("h1"));
    let fonts = resolve(decls(None, Some("var(--heading)")), &page).unwrap();
    assert_eq!(family::to_css(&fonts), r#""Courier New", monospace"#);
}
