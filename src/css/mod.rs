//! Stylesheets, rules and declarations.
//!
//! Only as much of CSSOM as needed to find and rewrite font declarations.
use core::fmt;

use tracing::debug;

use crate::{
    dom::{events::SheetCallback, NodeId},
    error::{Error, Result},
};

mod parser;
pub mod selector;

pub use self::parser::{parse_rule, parse_stylesheet, split_top_level};
pub use self::selector::{SelectorList, Specificity};

/// A single `name: value` pair inside a style rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}

/// A rule with a selector and a declaration block.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    pub selector_text: String,
    pub selectors: SelectorList,
    pub declarations: Vec<Declaration>,
}

/// A conditional or layering at-rule containing other rules, like `@media`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupingRule {
    /// Everything before the block, like `@media (min-width: 40em)`.
    pub prelude: String,
    pub rules: Vec<CssRule>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CssRule {
    Style(StyleRule),
    Grouping(GroupingRule),
    /// Any other at-rule, kept verbatim.
    Other(String),
}

/// The stylesheet mutation API exposed to page scripts.
pub trait SheetMutation {
    /// Insert a single rule at `index` (default `0`), returning the index.
    fn insert_rule(&mut self, rule: &str, index: Option<usize>) -> Result<usize>;

    /// Legacy `addRule`. Always returns `-1` on success.
    fn add_rule(&mut self, selector: &str, style: &str, index: Option<usize>) -> Result<i32>;

    /// Replace all rules once the new text has been processed.
    ///
    /// `then` runs with the updated sheet after the replacement settled.
    fn replace(&mut self, text: &str, then: Option<SheetCallback>) -> Result<()>;

    /// Replace all rules immediately. `@import` rules are dropped.
    fn replace_sync(&mut self, text: &str) -> Result<()>;

    fn css_rules(&self) -> Result<&[CssRule]>;
}

#[derive(Debug, Clone)]
pub struct StyleSheet {
    rules: Vec<CssRule>,
    href: Option<String>,
    owner: Option<NodeId>,
    /// Whether scripts of the page may read the rules.
    origin_clean: bool,
}

impl StyleSheet {
    /// An empty, constructed stylesheet.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            href: None,
            owner: None,
            origin_clean: true,
        }
    }

    /// A detached stylesheet built from `text`.
    pub fn parse(text: &str) -> Self {
        Self {
            rules: parse_stylesheet(text),
            ..Self::new()
        }
    }

    /// A stylesheet owned by an element of the page.
    pub fn owned(owner: NodeId, href: Option<String>, text: &str, origin_clean: bool) -> Self {
        Self {
            rules: parse_stylesheet(text),
            href,
            owner: Some(owner),
            origin_clean,
        }
    }

    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    /// Rules as seen by a script of the page.
    ///
    /// Fails for sheets loaded from a different origin.
    pub fn css_rules(&self) -> Result<&[CssRule]> {
        if self.origin_clean {
            Ok(&self.rules)
        } else {
            Err(Error::Security(self.href.clone().unwrap_or_default()))
        }
    }

    /// All rules, ignoring origin restrictions. Used by the cascade.
    pub(crate) fn rules_unchecked(&self) -> &[CssRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn insert_rule(&mut self, rule: &str, index: usize) -> Result<usize> {
        self.css_rules()?;
        if index > self.rules.len() {
            return Err(Error::IndexSize(index, self.rules.len()));
        }
        let rule = parse_rule(rule)?;
        self.rules.insert(index, rule);
        Ok(index)
    }

    pub fn add_rule(&mut self, selector: &str, style: &str, index: Option<usize>) -> Result<i32> {
        let index = index.unwrap_or_else(|| self.rules.len());
        self.insert_rule(&format!("{} {{ {} }}", selector, style), index)?;
        Ok(-1)
    }

    pub fn replace_sync(&mut self, text: &str) -> Result<()> {
        self.css_rules()?;
        self.rules = parse_stylesheet(text)
            .into_iter()
            .filter(|rule| match rule {
                CssRule::Other(text) if text.to_lowercase().starts_with("@import") => {
                    debug!("Ignoring @import in replaced stylesheet");
                    false
                }
                _ => true,
            })
            .collect();
        Ok(())
    }
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleRule {
    /// The value of `name`, like `CSSStyleDeclaration.getPropertyValue`.
    ///
    /// Important declarations beat normal ones, otherwise the last one wins.
    pub fn property_value(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .filter(|decl| decl.name == name)
            .max_by_key(|decl| decl.important)
            .map(|decl| decl.value.as_str())
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)?;
        if self.important {
            write!(f, " !important")?;
        }
        write!(f, ";")
    }
}

impl fmt::Display for CssRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CssRule::Style(rule) => {
                write!(f, "{} {{", rule.selector_text)?;
                for decl in &rule.declarations {
                    write!(f, " {}", decl)?;
                }
                write!(f, " }}")
            }
            CssRule::Grouping(rule) => {
                write!(f, "{} {{", rule.prelude)?;
                for inner in &rule.rules {
                    write!(f, "\n  {}", inner)?;
                }
                write!(f, "\n}}")
            }
            CssRule::Other(text) => write!(f, "{}", text),
        }
    }
}
