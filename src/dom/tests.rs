use std::{cell::Cell, rc::Rc};

use pretty_assertions::assert_eq;

use crate::resolve::ComputedStyle;

use super::*;

fn page_with_style(css: &str) -> Page {
    let mut page = Page::new("https://example.org/index.html").unwrap();
    let head = page.head();
    page.append_child(head, Element::new("style").with_text(css));
    page
}

#[test]
fn new_pages_have_head_and_body() {
    let page = Page::new("https://example.org/").unwrap();
    assert_eq!(page.element(page.root()).tag(), "html");
    assert_eq!(page.parent_element(page.head()), Some(page.root()));
    assert_eq!(page.next_element_sibling(page.head()), Some(page.body()));
    assert_eq!(page.query_selector("body").unwrap(), Some(page.body()));
    assert_eq!(page.query_selector("main").unwrap(), None);
    assert!(Page::new("not a url").is_err());
}

#[test]
fn style_elements_get_a_sheet() {
    let page = page_with_style("p { font: 12px serif }");
    assert_eq!(page.style_sheets().len(), 1);
    let sheet = page.sheet(page.style_sheets()[0]);
    assert_eq!(sheet.css_rules().unwrap().len(), 1);
    assert_eq!(page.element(sheet.owner().unwrap()).tag(), "style");
}

#[test]
fn linked_sheets_know_their_origin() {
    let mut page = Page::new("https://example.org/index.html").unwrap();
    let head = page.head();
    let local = page.append_child(
        head,
        Element::new("link")
            .with_attr("rel", "stylesheet")
            .with_attr("href", "/main.css"),
    );
    let remote = page.append_child(
        head,
        Element::new("link")
            .with_attr("rel", "Preload StyleSheet")
            .with_attr("href", "https://cdn.example.net/x.css"),
    );
    assert!(page.element(remote).is_stylesheet_link());
    assert_eq!(page.element(local).sheet(), None);

    let local_sheet = page.finish_load(local, "a { color: red }").unwrap();
    let remote_sheet = page.finish_load(remote, "a { color: blue }").unwrap();
    assert!(page.sheet(local_sheet).css_rules().is_ok());
    assert!(matches!(
        page.sheet(remote_sheet).css_rules(),
        Err(Error::Security(href)) if href == "https://cdn.example.net/x.css"
    ));
    assert!(matches!(page.next_event(), Some(PageEvent::Load(node)) if node == local));
    assert!(matches!(page.next_event(), Some(PageEvent::Load(node)) if node == remote));
    assert!(page.next_event().is_none());
}

#[test]
fn insertions_are_reported_once_observed() {
    let mut page = Page::new("https://example.org/").unwrap();
    let body = page.body();
    page.append_child(body, Element::new("div"));
    assert!(page.next_event().is_none());

    page.bus().observe_mutations();
    let div = page.append_child(body, Element::new("div"));
    assert!(matches!(page.next_event(), Some(PageEvent::Mutation(nodes)) if nodes == vec![div]));
}

#[test]
fn custom_events_need_a_listener() {
    let bus = EventBus::default();
    bus.dispatch_custom("ping", serde_json::json!([]));
    assert_eq!(bus.len(), 0);
    bus.add_listener("ping");
    bus.dispatch_custom("ping", serde_json::json!([1]));
    assert_eq!(bus.len(), 1);
    assert!(matches!(
        bus.pop(),
        Some(PageEvent::Custom { name, detail }) if name == "ping" && detail == serde_json::json!([1])
    ));
}

#[test]
fn replace_settles_on_a_later_turn() {
    let mut page = page_with_style("a { color: red }");
    let id = page.style_sheets()[0];
    let seen = Rc::new(Cell::new(None));
    let seen_by_callback = Rc::clone(&seen);
    page.script_sheet(id)
        .replace(
            "@import url(x.css); p { font: 1em serif } em { color: red }",
            Some(Box::new(move |sheet: &StyleSheet| {
                seen_by_callback.set(Some(sheet.len()))
            })),
        )
        .unwrap();
    // Nothing changed yet
    assert_eq!(page.sheet(id).len(), 1);
    assert_eq!(seen.get(), None);
    // Settling is internal to the page
    assert!(page.next_event().is_none());
    assert_eq!(page.sheet(id).len(), 2);
    assert_eq!(seen.get(), Some(2));
}

#[test]
fn script_insert_rule_defaults_to_the_front() {
    let mut page = page_with_style("a { color: red }");
    let id = page.style_sheets()[0];
    let mut sheet = page.script_sheet(id);
    assert_eq!(sheet.insert_rule("b { color: blue }", None).unwrap(), 0);
    assert_eq!(sheet.css_rules().unwrap()[0].to_string(), "b { color: blue; }");
}

#[test]
fn cascade_orders_by_importance_specificity_and_position() {
    let mut page = page_with_style(
        "p { font-family: A }\n\
         #x { font-family: B }\n\
         p { font-family: C }",
    );
    let body = page.body();
    let p = page.append_child(body, Element::new("p").with_attr("id", "x"));
    let q = page.append_child(body, Element::new("p"));
    assert_eq!(page.computed_value(p, "font-family"), "B");
    assert_eq!(page.computed_value(q, "font-family"), "C");

    let id = page.style_sheets()[0];
    page.sheet_mut(id).insert_rule("p { font-family: D !important }", 0).unwrap();
    assert_eq!(page.computed_value(p, "font-family"), "D");
}

#[test]
fn adopted_sheets_come_last() {
    let mut page = page_with_style("p { font-family: A }");
    let adopted = page.create_sheet();
    page.sheet_mut(adopted).insert_rule("p { font-family: B }", 0).unwrap();
    let body = page.body();
    let p = page.append_child(body, Element::new("p"));
    assert_eq!(page.computed_value(p, "font-family"), "A");
    page.adopt_sheet(adopted);
    assert_eq!(page.computed_value(p, "font-family"), "B");
}

#[test]
fn font_properties_inherit() {
    let mut page = page_with_style(
        "body { font-family: Georgia }\n\
         em { font-family: inherit }\n\
         b { font-family: initial }",
    );
    let body = page.body();
    let p = page.append_child(body, Element::new("p"));
    let em = page.append_child(p, Element::new("em"));
    let b = page.append_child(p, Element::new("b"));
    assert_eq!(page.computed_value(p, "font-family"), "Georgia");
    assert_eq!(page.computed_value(em, "font-family"), "Georgia");
    assert_eq!(page.computed_value(b, "font-family"), "serif");
    assert_eq!(page.computed_value(page.head(), "font-family"), "serif");
    assert_eq!(page.computed_value(p, "font"), "");
}

#[test]
fn shorthand_sets_the_family() {
    let mut page = page_with_style("p { font: italic 12px Georgia, serif }");
    let body = page.body();
    let p = page.append_child(body, Element::new("p"));
    assert_eq!(page.computed_value(p, "font-family"), r#""Georgia", serif"#);
    assert_eq!(page.computed_value(p, "font"), "italic 12px Georgia, serif");
}

#[test]
fn custom_properties_are_substituted() {
    let mut page = page_with_style(
        ":root { --mono: 'Fira Code', monospace; --size: 14px }\n\
         code { font-family: var(--mono) }\n\
         kbd { font-family: var(--missing, Menlo) }\n\
         samp { font: var(--size) var(--mono) }\n\
         var { font-family: var(--missing) }",
    );
    let body = page.body();
    let code = page.append_child(body, Element::new("code"));
    let kbd = page.append_child(body, Element::new("kbd"));
    let samp = page.append_child(body, Element::new("samp"));
    let var = page.append_child(body, Element::new("var"));
    assert_eq!(page.computed_value(code, "font-family"), "'Fira Code', monospace");
    assert_eq!(page.computed_value(kbd, "font-family"), "Menlo");
    assert_eq!(page.computed_value(samp, "font"), "14px 'Fira Code', monospace");
    assert_eq!(page.computed_value(var, "font-family"), "");
}

#[test]
fn cyclic_custom_properties_compute_to_nothing() {
    let mut page = page_with_style(
        ":root { --a: var(--b); --b: var(--a) }\n\
         p { font-family: var(--a) }\n\
         em { font-family: var(--a, Arial) }",
    );
    let body = page.body();
    let p = page.append_child(body, Element::new("p"));
    let em = page.append_child(body, Element::new("em"));
    assert_eq!(page.computed_value(p, "font-family"), "");
    assert_eq!(page.computed_value(em, "font-family"), "Arial");
}

#[test]
fn rules_inside_media_queries_apply() {
    let mut page = page_with_style("@media screen { p { font-family: Verdana } }");
    let body = page.body();
    let p = page.append_child(body, Element::new("p"));
    assert_eq!(page.computed_value(p, "font-family"), "Verdana");
}

#[test]
fn computed_style_falls_back_to_the_root() {
    let page = page_with_style(":root { font-family: Tahoma } p { font-family: Arial }");
    assert_eq!(page.computed_style("p.missing", "font-family").unwrap(), "Tahoma");
    assert!(matches!(
        page.computed_style("p!", "font-family"),
        Err(Error::InvalidSelector(_))
    ));
}

#[test]
fn canvas_ignores_invalid_fonts() {
    let mut canvas = Canvas2d::default();
    assert_eq!(canvas.font(), "10px sans-serif");
    canvas.set_font("bold 12px Georgia");
    assert_eq!(canvas.font(), "bold 12px Georgia");
    canvas.set_font("nonsense");
    assert_eq!(canvas.font(), "bold 12px Georgia");
}
