//! Computed style: cascade, inheritance and custom properties.
use tracing::debug;

use crate::{
    css::{split_top_level, CssRule, Specificity, StyleRule},
    error::Result,
    font::{family, shorthand},
    resolve::{ComputedStyle, CSS_WIDE_KEYWORDS},
};

use super::{NodeId, Page};

/// Cascade order of a declaration: importance, specificity, source order.
type Precedence = (bool, Specificity, usize);

impl Page {
    /// The computed value of `property` for `node`.
    ///
    /// Values that can't be computed, like references to undefined custom
    /// properties without fallback, compute to the empty string.
    pub fn computed_value(&self, node: NodeId, property: &str) -> String {
        self.compute(node, property, &mut Vec::new())
            .unwrap_or_default()
    }

    fn compute(&self, node: NodeId, property: &str, stack: &mut Vec<String>) -> Option<String> {
        // The shorthand sets the family too
        let names: &[&str] = if property == "font-family" {
            &["font-family", "font"]
        } else {
            &[property]
        };
        let (name, value) = match self.cascaded(node, names) {
            Some(declared) => declared,
            None => return self.inherit(node, property),
        };
        let keyword = value.trim().to_lowercase();
        if keyword == "initial" {
            return initial_value(property);
        } else if CSS_WIDE_KEYWORDS.contains(&keyword.as_str()) {
            return self.inherit(node, property);
        }

        let custom = property.starts_with("--");
        if custom {
            stack.push(property.to_owned());
        }
        let value = self.substitute(node, value, stack);
        if custom {
            stack.pop();
        }
        let value = value?;
        if name == "font" && property == "font-family" {
            match shorthand::parse(&value) {
                Ok(font) => Some(family::to_css(&font.family)),
                Err(why) => {
                    debug!("Invalid font shorthand in cascade: {}", why);
                    None
                }
            }
        } else {
            Some(value)
        }
    }

    /// All properties this model knows about are inherited.
    fn inherit(&self, node: NodeId, property: &str) -> Option<String> {
        match self.parent_element(node) {
            // A new stack, cycles only exist within one element
            Some(parent) => self.compute(parent, property, &mut Vec::new()),
            None => initial_value(property),
        }
    }

    /// The winning declaration for any of `names`, with the name it was declared as.
    fn cascaded(&self, node: NodeId, names: &[&str]) -> Option<(&str, &str)> {
        let mut best: Option<(Precedence, &str, &str)> = None;
        let mut order = 0;
        let sheets = self
            .style_sheets()
            .iter()
            .chain(self.adopted_style_sheets().iter());
        for &sheet in sheets {
            visit_style_rules(self.sheet(sheet).rules_unchecked(), &mut |rule| {
                let specificity = match rule.selectors.matching_specificity(self, node) {
                    Some(specificity) => specificity,
                    None => return,
                };
                for decl in &rule.declarations {
                    order += 1;
                    if !names.contains(&decl.name.as_str()) {
                        continue;
                    }
                    let precedence = (decl.important, specificity, order);
                    if best.as_ref().map_or(true, |(winner, ..)| precedence > *winner) {
                        best = Some((precedence, decl.name.as_str(), decl.value.as_str()));
                    }
                }
            });
        }
        best.map(|(_, name, value)| (name, value))
    }

    /// Replace all `var()` references in `value`.
    ///
    /// Returns `None` when a reference can't be resolved and has no fallback.
    fn substitute(&self, node: NodeId, value: &str, stack: &mut Vec<String>) -> Option<String> {
        let mut result = String::new();
        let mut rest = value;
        while let Some(start) = rest.to_ascii_lowercase().find("var(") {
            result.push_str(&rest[..start]);
            let args_start = start + "var(".len();
            let args_len = closing_paren(&rest[args_start..])?;
            let args = &rest[args_start..args_start + args_len];
            let mut parts = split_top_level(args, ',').into_iter();
            let name = parts.next().unwrap_or_default().trim();
            let fallback = parts.collect::<Vec<_>>();

            let referenced = if stack.iter().any(|seen| seen == name) {
                debug!("Cyclic reference to {}", name);
                None
            } else {
                self.compute(node, name, stack)
            };
            match referenced {
                Some(value) if !value.trim().is_empty() => result.push_str(value.trim()),
                _ if !fallback.is_empty() => {
                    let fallback = fallback.join(",");
                    result.push_str(&self.substitute(node, fallback.trim(), stack)?)
                }
                _ => return None,
            }
            rest = &rest[args_start + args_len + 1..];
        }
        result.push_str(rest);
        Some(result)
    }
}

impl ComputedStyle for Page {
    fn computed_style(&self, selector: &str, property: &str) -> Result<String> {
        let node = self.query_selector(selector)?.unwrap_or_else(|| self.root());
        Ok(self.computed_value(node, property))
    }
}

fn initial_value(property: &str) -> Option<String> {
    match property {
        "font-family" => Some("serif".to_owned()),
        // Custom properties start out guaranteed-invalid
        _ if property.starts_with("--") => None,
        _ => Some(String::new()),
    }
}

fn visit_style_rules<'r, F: FnMut(&'r StyleRule)>(rules: &'r [CssRule], f: &mut F) {
    for rule in rules {
        match rule {
            CssRule::Style(rule) => f(rule),
            CssRule::Grouping(group) => visit_style_rules(&group.rules, f),
            CssRule::Other(_) => {}
        }
    }
}

/// Index of the `)` closing an already opened parenthesis.
fn closing_paren(input: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (idx, ch) in input.char_indices() {
        match (quote, ch) {
            (Some(q), ch) if ch == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') if depth == 0 => return Some(idx),
            (None, ')') => depth -= 1,
            _ => {}
        }
    }
    None
}
