use std::collections::HashSet;

use pretty_assertions::assert_eq;
use strum::IntoEnumIterator;

use super::*;

fn names(fonts: &[FamilyName]) -> Vec<&str> {
    fonts.iter().map(FamilyName::as_str).collect()
}

#[test]
fn first_known_entry_decides_the_category() {
    assert_eq!(classify(&["Courier New", "monospace"]), Category::Monospace);
    assert_eq!(classify(&["Fancy Corp Sans", "Georgia", "sans-serif"]), Category::Serif);
    assert_eq!(classify(&["sans-serif", "serif"]), Category::SansSerif);
}

#[test]
fn classification_is_case_insensitive() {
    assert_eq!(classify(&["  COURIER new "]), Category::Monospace);
    assert_eq!(classify(&["Brush Script MT"]), Category::Cursive);
}

#[test]
fn unknown_lists_are_none() {
    let empty: [&str; 0] = [];
    assert_eq!(classify(&empty), Category::None);
    assert_eq!(classify(&["Fancy Corp Sans", "Other Corp"]), Category::None);
}

#[test]
fn explicit_none_keywords_stop_the_search() {
    assert_eq!(classify(&["emoji", "serif"]), Category::None);
    assert_eq!(classify(&["Noto", "math", "monospace"]), Category::None);
}

#[test]
fn every_keyword_belongs_to_exactly_one_category() {
    let mut seen = HashSet::new();
    for (category, keywords) in KEYWORDS {
        for keyword in *keywords {
            assert!(seen.insert(*keyword), "duplicate keyword {:?}", keyword);
            assert_eq!(keyword.to_lowercase(), *keyword);
            assert_eq!(Category::of_keyword(keyword), Some(*category));
        }
    }
    assert_eq!(seen.len(), FONT_MAPPING.len());
    // Every category except `none` can be reached by its own generic keyword
    for category in Category::iter().filter(|c| *c != Category::None) {
        assert_eq!(Category::of_keyword(&category.to_string()), Some(category));
    }
}

#[test]
fn categories_serialize_kebab_case() {
    assert_eq!(Category::SansSerif.to_string(), "sans-serif");
    assert_eq!(serde_plain::to_string(&Category::SansSerif).unwrap(), "sans-serif");
    let parsed: Category = serde_plain::from_str("monospace").unwrap();
    assert_eq!(parsed, Category::Monospace);
}

#[test]
fn parses_family_lists() {
    let fonts = family::parse(r#""Courier New", monospace"#).unwrap();
    assert_eq!(
        fonts,
        vec![
            FamilyName::Title("Courier New".into()),
            FamilyName::Generic("monospace".into())
        ]
    );
    let fonts = family::parse("Times   New Roman ,'Open \\'Sans\\'', SERIF").unwrap();
    assert_eq!(names(&fonts), vec!["Times New Roman", "Open 'Sans'", "serif"]);
    assert_eq!(fonts[2], FamilyName::Generic("serif".into()));
}

#[test]
fn quoted_generic_keywords_stay_names() {
    let fonts = family::parse(r#""serif", serif"#).unwrap();
    assert_eq!(family::to_css(&fonts), r#""serif", serif"#);
}

#[test]
fn rejects_broken_family_lists() {
    assert!(family::parse("Arial,,serif").is_err());
    assert!(family::parse(r#""Unterminated, serif"#).is_err());
    assert!(family::parse("").is_err());
}

#[test]
fn serializes_with_quotes_only_for_named_families() {
    let fonts = vec![
        FamilyName::title("Atkinson Hyperlegible Mono"),
        FamilyName::title("Say \"Hi\""),
        FamilyName::Generic("monospace".into()),
    ];
    assert_eq!(
        family::to_css(&fonts),
        r#""Atkinson Hyperlegible Mono", "Say \"Hi\"", monospace"#
    );
}

#[test]
fn parses_full_shorthand() {
    let font = shorthand::parse(r#"italic small-caps bold 12px/1.5 "A", serif"#).unwrap();
    assert_eq!(font.style.as_deref(), Some("italic"));
    assert_eq!(font.variant.as_deref(), Some("small-caps"));
    assert_eq!(font.weight.as_deref(), Some("bold"));
    assert_eq!(font.size, "12px");
    assert_eq!(font.line_height.as_deref(), Some("1.5"));
    assert_eq!(names(&font.family), vec!["A", "serif"]);
}

#[test]
fn parses_minimal_and_spaced_shorthands() {
    let font = shorthand::parse("16px Arial").unwrap();
    assert_eq!(font.size, "16px");
    assert_eq!(names(&font.family), vec!["Arial"]);

    let font = shorthand::parse("700 condensed larger / normal Helvetica Neue, sans-serif").unwrap();
    assert_eq!(font.weight.as_deref(), Some("700"));
    assert_eq!(font.stretch.as_deref(), Some("condensed"));
    assert_eq!(font.size, "larger");
    assert_eq!(font.line_height.as_deref(), Some("normal"));
    assert_eq!(names(&font.family), vec!["Helvetica Neue", "sans-serif"]);

    let font = shorthand::parse("oblique 10deg calc(1em + 2px) monospace").unwrap();
    assert_eq!(font.style.as_deref(), Some("oblique 10deg"));
    assert_eq!(font.size, "calc(1em + 2px)");
    assert_eq!(names(&font.family), vec!["monospace"]);
}

#[test]
fn rejects_incomplete_shorthands() {
    assert!(shorthand::parse("caption").is_err());
    assert!(shorthand::parse("Arial").is_err());
    assert!(shorthand::parse("bold 12px").is_err());
    assert!(shorthand::parse("italic italic 12px serif").is_err());
    assert!(shorthand::parse("12px/ serif").is_err());
}
