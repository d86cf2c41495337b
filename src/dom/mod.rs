//! A minimal, in-memory document.
//!
//! Stands in for the browser page: an element tree, the stylesheets attached
//! to it, the adopted stylesheets and the document event queue. It exposes
//! the same capabilities a content script has and nothing more.
use reqwest::Url;
use tracing::{debug, info};

use crate::{
    css::{CssRule, SelectorList, SheetMutation, StyleSheet},
    error::{Error, Result},
    font::shorthand,
};

pub mod events;
mod style;
#[cfg(test)]
mod tests;

pub use self::events::{EventBus, PageEvent, SheetCallback};

pub type NodeId = usize;
pub type SheetId = usize;

const DEFAULT_CANVAS_FONT: &str = "10px sans-serif";

#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    sheet: Option<SheetId>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_lowercase(),
            attributes: Vec::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
            sheet: None,
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = text.into();
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        let name = name.to_lowercase();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, old)) => *old = value.to_owned(),
            None => self.attributes.push((name, value.to_owned())),
        }
    }

    /// The stylesheet of a `<style>` or loaded `<link>` element.
    pub fn sheet(&self) -> Option<SheetId> {
        self.sheet
    }

    /// Is this a `<link rel="stylesheet">`?
    pub fn is_stylesheet_link(&self) -> bool {
        self.tag == "link"
            && self.attr("rel").map_or(false, |rel| {
                rel.split_whitespace()
                    .any(|token| token.eq_ignore_ascii_case("stylesheet"))
            })
    }
}

#[derive(Debug)]
pub struct Page {
    url: Url,
    nodes: Vec<Element>,
    sheets: Vec<StyleSheet>,
    /// Sheets of `<style>` and `<link>` elements, in the order they attached.
    document_sheets: Vec<SheetId>,
    adopted_sheets: Vec<SheetId>,
    bus: EventBus,
}

impl Page {
    /// An empty page with `<html>`, `<head>` and `<body>`.
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|_| Error::InvalidUrl(url.to_owned()))?;
        let mut page = Self {
            url,
            nodes: vec![Element::new("html")],
            sheets: Vec::new(),
            document_sheets: Vec::new(),
            adopted_sheets: Vec::new(),
            bus: EventBus::default(),
        };
        page.append_child(0, Element::new("head"));
        page.append_child(0, Element::new("body"));
        Ok(page)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn bus(&self) -> EventBus {
        self.bus.clone()
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn head(&self) -> NodeId {
        1
    }

    pub fn body(&self) -> NodeId {
        2
    }

    pub fn element(&self, node: NodeId) -> &Element {
        &self.nodes[node]
    }

    pub fn element_mut(&mut self, node: NodeId) -> &mut Element {
        &mut self.nodes[node]
    }

    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].parent
    }

    pub fn previous_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let siblings = &self.nodes[self.parent_element(node)?].children;
        let idx = siblings.iter().position(|child| *child == node)?;
        idx.checked_sub(1).map(|prev| siblings[prev])
    }

    pub fn next_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let siblings = &self.nodes[self.parent_element(node)?].children;
        let idx = siblings.iter().position(|child| *child == node)?;
        siblings.get(idx + 1).copied()
    }

    /// Insert `element` as the last child of `parent`.
    ///
    /// A `<style>` element gets its sheet right away, a stylesheet `<link>`
    /// only once [`Page::finish_load`] is called.
    pub fn append_child(&mut self, parent: NodeId, mut element: Element) -> NodeId {
        let node = self.nodes.len();
        element.parent = Some(parent);
        if element.tag == "style" {
            let sheet = StyleSheet::owned(node, None, &element.text, true);
            element.sheet = Some(self.attach_sheet(sheet));
        }
        self.nodes.push(element);
        self.nodes[parent].children.push(node);
        self.bus.notify_inserted(node);
        node
    }

    /// Complete loading the stylesheet of a `<link>` element.
    ///
    /// Sheets from other origins can be used for styling, but their rules
    /// can't be read by scripts.
    pub fn finish_load(&mut self, node: NodeId, text: &str) -> Result<SheetId> {
        let href = self.nodes[node]
            .attr("href")
            .ok_or_else(|| Error::InvalidUrl(String::new()))?;
        let url = self
            .url
            .join(href)
            .map_err(|_| Error::InvalidUrl(href.to_owned()))?;
        let origin_clean = url.origin() == self.url.origin();
        info!(
            "Loaded stylesheet {} ({})",
            url,
            if origin_clean { "same origin" } else { "cross origin" }
        );
        let sheet = StyleSheet::owned(node, Some(url.to_string()), text, origin_clean);
        let id = self.attach_sheet(sheet);
        self.nodes[node].sheet = Some(id);
        self.bus.push(PageEvent::Load(node));
        Ok(id)
    }

    fn attach_sheet(&mut self, sheet: StyleSheet) -> SheetId {
        let id = self.sheets.len();
        self.sheets.push(sheet);
        self.document_sheets.push(id);
        id
    }

    /// The equivalent of `document.styleSheets`.
    pub fn style_sheets(&self) -> &[SheetId] {
        &self.document_sheets
    }

    pub fn adopted_style_sheets(&self) -> &[SheetId] {
        &self.adopted_sheets
    }

    pub fn sheet(&self, id: SheetId) -> &StyleSheet {
        &self.sheets[id]
    }

    pub fn sheet_mut(&mut self, id: SheetId) -> &mut StyleSheet {
        &mut self.sheets[id]
    }

    /// `new CSSStyleSheet()`, not attached to anything yet.
    pub fn create_sheet(&mut self) -> SheetId {
        self.sheets.push(StyleSheet::new());
        self.sheets.len() - 1
    }

    pub fn adopt_sheet(&mut self, id: SheetId) {
        if !self.adopted_sheets.contains(&id) {
            self.adopted_sheets.push(id);
        }
    }

    /// The mutation API of a sheet, as page scripts see it.
    pub fn script_sheet(&mut self, id: SheetId) -> PageSheet<'_> {
        PageSheet { page: self, id }
    }

    /// First element in tree order matching `selector`.
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        let selectors = SelectorList::parse(selector)?;
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            if selectors.matches(self, node) {
                return Ok(Some(node));
            }
            stack.extend(self.nodes[node].children.iter().rev());
        }
        Ok(None)
    }

    /// Take the next event off the queue.
    ///
    /// Settled `replace()` calls are handled here and never returned.
    pub fn next_event(&mut self) -> Option<PageEvent> {
        loop {
            match self.bus.pop()? {
                PageEvent::ReplaceSettled { sheet, text, then } => {
                    debug!("Replace of sheet {} settled", sheet);
                    let sheet = &mut self.sheets[sheet];
                    match sheet.replace_sync(&text) {
                        Ok(()) => {
                            if let Some(then) = then {
                                then(sheet);
                            }
                        }
                        Err(why) => debug!("Replace rejected: {}", why),
                    }
                }
                event => return Some(event),
            }
        }
    }
}

/// A stylesheet of a page, seen through the script API.
pub struct PageSheet<'p> {
    page: &'p mut Page,
    id: SheetId,
}

impl SheetMutation for PageSheet<'_> {
    fn insert_rule(&mut self, rule: &str, index: Option<usize>) -> Result<usize> {
        self.page.sheets[self.id].insert_rule(rule, index.unwrap_or(0))
    }

    fn add_rule(&mut self, selector: &str, style: &str, index: Option<usize>) -> Result<i32> {
        self.page.sheets[self.id].add_rule(selector, style, index)
    }

    fn replace(&mut self, text: &str, then: Option<SheetCallback>) -> Result<()> {
        self.page.sheets[self.id].css_rules()?;
        self.page.bus.push(PageEvent::ReplaceSettled {
            sheet: self.id,
            text: text.to_owned(),
            then,
        });
        Ok(())
    }

    fn replace_sync(&mut self, text: &str) -> Result<()> {
        self.page.sheets[self.id].replace_sync(text)
    }

    fn css_rules(&self) -> Result<&[CssRule]> {
        self.page.sheets[self.id].css_rules()
    }
}

/// The `font` accessor of a 2D canvas context.
pub trait CanvasFont {
    fn font(&self) -> String;
    fn set_font(&mut self, value: &str);
}

#[derive(Debug, Clone)]
pub struct Canvas2d {
    font: String,
}

impl Default for Canvas2d {
    fn default() -> Self {
        Self {
            font: DEFAULT_CANVAS_FONT.to_owned(),
        }
    }
}

impl CanvasFont for Canvas2d {
    fn font(&self) -> String {
        self.font.clone()
    }

    /// Invalid values are ignored, like browsers do.
    fn set_font(&mut self, value: &str) {
        if shorthand::parse(value).is_ok() {
            self.font = value.trim().to_owned();
        }
    }
}
