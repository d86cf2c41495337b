//! Turning stylesheet text into rules.
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};

use super::{CssRule, Declaration, GroupingRule, SelectorList, StyleRule};

/// At-rules whose block contains rules instead of declarations.
const GROUPING_AT_RULES: &[&str] = &["media", "supports", "layer", "container", "document", "scope"];

lazy_static! {
    static ref IMPORTANT_RE: Regex = Regex::new(r"(?i)!\s*important\s*$").unwrap();
}

/// A rule split off the text, but not yet interpreted.
#[derive(Debug)]
struct RawRule<'css> {
    prelude: &'css str,
    /// `None` for statement at-rules like `@import url(a.css);`.
    block: Option<&'css str>,
}

/// Parse a whole stylesheet.
///
/// Rules that fail to parse are dropped, like browsers do.
pub fn parse_stylesheet(css: &str) -> Vec<CssRule> {
    let css = remove_comments(css);
    parse_rules(&css)
}

/// Parse exactly one rule, as required by `insertRule`.
pub fn parse_rule(text: &str) -> Result<CssRule> {
    let css = remove_comments(text);
    let mut raw = split_rules(&css);
    match raw.len() {
        1 => interpret(raw.remove(0)).ok_or_else(|| Error::InvalidRule(text.to_owned())),
        _ => Err(Error::InvalidRule(text.to_owned())),
    }
}

fn parse_rules(css: &str) -> Vec<CssRule> {
    split_rules(css).into_iter().filter_map(interpret).collect()
}

fn interpret(raw: RawRule<'_>) -> Option<CssRule> {
    let prelude = raw.prelude.trim();
    if prelude.starts_with('@') {
        let name: String = prelude[1..]
            .chars()
            .take_while(|ch| ch.is_alphanumeric() || *ch == '-')
            .collect::<String>()
            .to_lowercase();
        return match raw.block {
            Some(block) if GROUPING_AT_RULES.contains(&name.as_str()) => {
                Some(CssRule::Grouping(GroupingRule {
                    prelude: prelude.to_owned(),
                    rules: parse_rules(block),
                }))
            }
            Some(block) => Some(CssRule::Other(format!("{} {{{}}}", prelude, block))),
            None => Some(CssRule::Other(format!("{};", prelude))),
        };
    }
    let block = raw.block?;
    match SelectorList::parse(prelude) {
        Ok(selectors) => Some(CssRule::Style(StyleRule {
            selector_text: prelude.to_owned(),
            selectors,
            declarations: parse_declarations(block),
        })),
        Err(why) => {
            debug!("Dropping rule: {}", why);
            None
        }
    }
}

/// Split text into top-level rules.
fn split_rules(css: &str) -> Vec<RawRule<'_>> {
    let mut rules = Vec::new();
    let mut rest = css;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        match find_top_level(rest, &['{', ';', '}']) {
            Some((idx, '{')) => {
                let prelude = &rest[..idx];
                let (block, after) = match find_block_end(&rest[idx + 1..]) {
                    Some(end) => (&rest[idx + 1..idx + 1 + end], &rest[idx + 2 + end..]),
                    // Unclosed blocks end at the end of the stylesheet
                    None => (&rest[idx + 1..], ""),
                };
                rules.push(RawRule {
                    prelude,
                    block: Some(block),
                });
                rest = after;
            }
            Some((idx, ';')) => {
                let prelude = &rest[..idx];
                if prelude.trim_start().starts_with('@') {
                    rules.push(RawRule {
                        prelude,
                        block: None,
                    });
                }
                rest = &rest[idx + 1..];
            }
            // Stray closing brace, skip it
            Some((idx, _)) => rest = &rest[idx + 1..],
            None => {
                if rest.trim_start().starts_with('@') {
                    rules.push(RawRule {
                        prelude: rest,
                        block: None,
                    });
                }
                break;
            }
        }
    }
    rules
}

fn parse_declarations(block: &str) -> Vec<Declaration> {
    split_top_level(block, ';')
        .into_iter()
        .filter_map(parse_declaration)
        .collect()
}

fn parse_declaration(text: &str) -> Option<Declaration> {
    let text = text.trim();
    // Nested rules are not supported
    if text.is_empty() || text.contains('{') {
        return None;
    }
    let colon = text.find(':')?;
    let name = text[..colon].trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    let custom = name.starts_with("--");
    let name = if custom {
        name.to_owned()
    } else {
        name.to_lowercase()
    };
    let mut value = text[colon + 1..].trim();
    let important = match IMPORTANT_RE.find(value) {
        Some(m) => {
            value = value[..m.start()].trim_end();
            true
        }
        None => false,
    };
    if value.is_empty() && !custom {
        return None;
    }
    Some(Declaration {
        name,
        value: value.to_owned(),
        important,
    })
}

/// Remove `/* */` comments, leaving strings intact.
fn remove_comments(css: &str) -> String {
    let mut result = String::with_capacity(css.len());
    let mut chars = css.chars().peekable();
    let mut quote: Option<char> = None;
    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some(_), '\\') => {
                result.push(ch);
                if let Some(escaped) = chars.next() {
                    result.push(escaped);
                }
            }
            (Some(q), ch) if ch == q => {
                quote = None;
                result.push(ch);
            }
            (None, '"' | '\'') => {
                quote = Some(ch);
                result.push(ch);
            }
            (None, '/') if chars.peek() == Some(&'*') => {
                chars.next();
                let mut last = ' ';
                for ch in chars.by_ref() {
                    if last == '*' && ch == '/' {
                        break;
                    }
                    last = ch;
                }
                // A comment separates tokens
                result.push(' ');
            }
            _ => result.push(ch),
        }
    }
    result
}

/// Find the first of `needles` outside of strings and parentheses.
fn find_top_level(input: &str, needles: &[char]) -> Option<(usize, char)> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (idx, ch) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, ch) {
            (_, '\\') => escaped = true,
            (Some(q), ch) if ch == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ch) if depth == 0 && needles.contains(&ch) => return Some((idx, ch)),
            _ => {}
        }
    }
    None
}

/// Find the `}` closing a block whose `{` was just consumed.
fn find_block_end(input: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut rest = input;
    let mut offset = 0;
    while let Some((idx, ch)) = find_top_level(rest, &['{', '}']) {
        match ch {
            '{' => depth += 1,
            _ if depth == 0 => return Some(offset + idx),
            _ => depth -= 1,
        }
        offset += idx + 1;
        rest = &input[offset..];
    }
    None
}

/// Split `input` at `sep`, ignoring separators inside strings and parentheses.
pub fn split_top_level(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = input;
    let mut offset = 0;
    while let Some((idx, _)) = find_top_level(rest, &[sep]) {
        parts.push(&input[offset..offset + idx]);
        offset += idx + sep.len_utf8();
        rest = &input[offset..];
    }
    parts.push(&input[offset..]);
    parts
}
