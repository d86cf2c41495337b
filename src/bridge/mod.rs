//! Relaying stylesheet changes made by page scripts.
//!
//! Scripts can add rules to stylesheets at any time. The bridge sits between
//! them and the stylesheet, lets every call through and afterwards reports
//! the affected rules with a custom event on the document.
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    css::{CssRule, SheetMutation, StyleSheet},
    dom::{CanvasFont, EventBus, Page, SheetCallback},
    error::{Error, Result, ResultExt},
};


/// Name of the custom event carrying serialized rules.
pub const CSS_RULES_EVENT: &str = "frankenfont-css-rules";

/// A style rule, reduced to what the font pipeline needs.
///
/// Missing declarations are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerializedRule {
    pub font: String,
    pub font_family: String,
    pub selector: String,
}

/// Serialize all style rules with font declarations, including those
/// nested in grouping rules.
pub fn serialize_rules(rules: &[CssRule]) -> Vec<SerializedRule> {
    let mut records = Vec::new();
    collect(rules, &mut records);
    records
}

fn collect(rules: &[CssRule], records: &mut Vec<SerializedRule>) {
    for rule in rules {
        match rule {
            CssRule::Style(rule) => {
                let font = rule.property_value("font");
                let font_family = rule.property_value("font-family");
                if font.is_some() || font_family.is_some() {
                    records.push(SerializedRule {
                        font: font.unwrap_or_default().to_owned(),
                        font_family: font_family.unwrap_or_default().to_owned(),
                        selector: rule.selector_text.clone(),
                    });
                }
            }
            CssRule::Grouping(group) => collect(&group.rules, records),
            CssRule::Other(_) => {}
        }
    }
}

/// Dispatch the font rules among `rules`, if there are any.
pub fn relay(bus: &EventBus, rules: &[CssRule]) {
    let records = serialize_rules(rules);
    if records.is_empty() {
        return;
    }
    debug!("Relaying {} rule(s)", records.len());
    let detail = serde_json::to_value(&records)
        .map_err(|why| Error::Serializing(why, "relaying stylesheet rules"))
        .log_err();
    if let Some(detail) = detail {
        bus.dispatch_custom(CSS_RULES_EVENT, detail);
    }
}

/// The page side of the relay.
#[derive(Debug, Clone)]
pub struct Bridge {
    bus: EventBus,
}

impl Bridge {
    pub fn install(page: &Page) -> Self {
        info!("Intercepting stylesheet mutations on {}", page.url());
        Self { bus: page.bus() }
    }

    /// Route the mutation API of `sheet` through the bridge.
    pub fn wrap<S: SheetMutation>(&self, sheet: S) -> Intercepted<S> {
        Intercepted {
            inner: sheet,
            bus: self.bus.clone(),
        }
    }

    pub fn wrap_canvas<C: CanvasFont>(&self, canvas: C) -> InterceptedCanvas<C> {
        InterceptedCanvas { inner: canvas }
    }
}

/// A stylesheet whose mutations are reported.
pub struct Intercepted<S> {
    inner: S,
    bus: EventBus,
}

impl<S: SheetMutation> Intercepted<S> {
    fn relay_at(&self, index: usize) {
        if let Some(rules) = self.inner.css_rules().log_debug() {
            if let Some(rule) = rules.get(index) {
                relay(&self.bus, std::slice::from_ref(rule));
            }
        }
    }

    fn relay_all(&self) {
        if let Some(rules) = self.inner.css_rules().log_debug() {
            relay(&self.bus, rules);
        }
    }
}

impl<S: SheetMutation> SheetMutation for Intercepted<S> {
    fn insert_rule(&mut self, rule: &str, index: Option<usize>) -> Result<usize> {
        let index = self.inner.insert_rule(rule, index)?;
        self.relay_at(index);
        Ok(index)
    }

    fn add_rule(&mut self, selector: &str, style: &str, index: Option<usize>) -> Result<i32> {
        let end = self.inner.css_rules().map(<[CssRule]>::len).unwrap_or_default();
        let ret = self.inner.add_rule(selector, style, index)?;
        // The return value is always -1 and says nothing about the position
        self.relay_at(index.unwrap_or(end));
        Ok(ret)
    }

    fn replace(&mut self, text: &str, then: Option<SheetCallback>) -> Result<()> {
        let bus = self.bus.clone();
        let then: SheetCallback = Box::new(move |sheet: &StyleSheet| {
            if let Ok(rules) = sheet.css_rules() {
                relay(&bus, rules);
            }
            if let Some(then) = then {
                then(sheet);
            }
        });
        self.inner.replace(text, Some(then))
    }

    fn replace_sync(&mut self, text: &str) -> Result<()> {
        self.inner.replace_sync(text)?;
        self.relay_all();
        Ok(())
    }

    fn css_rules(&self) -> Result<&[CssRule]> {
        self.inner.css_rules()
    }
}

/// A canvas context whose font accesses are logged.
pub struct InterceptedCanvas<C> {
    inner: C,
}

impl<C: CanvasFont> CanvasFont for InterceptedCanvas<C> {
    fn font(&self) -> String {
        let font = self.inner.font();
        debug!("Canvas font read: {:?}", font);
        font
    }

    fn set_font(&mut self, value: &str) {
        debug!("Canvas font set to {:?}", value);
        self.inner.set_font(value);
    }
}
