//! CSS selector parsing, matching and specificity.
use crate::{
    dom::{NodeId, Page},
    error::{Error, Result},
    font::family::unquote,
};

/// Specificity as `(ids, classes, types)`.
pub type Specificity = (u32, u32, u32);

/// Legacy pseudo-elements that may be written with a single colon.
const LEGACY_PSEUDO_ELEMENTS: &[&str] = &["before", "after", "first-line", "first-letter"];

/// A comma separated list of complex selectors.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList(Vec<ComplexSelector>);

#[derive(Debug, Clone, PartialEq)]
struct ComplexSelector {
    compounds: Vec<Compound>,
    /// `combinators[i]` sits between `compounds[i]` and `compounds[i + 1]`.
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Debug, Clone, PartialEq)]
struct Compound(Vec<Simple>);

#[derive(Debug, Clone, PartialEq)]
enum Simple {
    Universal,
    Type(String),
    Id(String),
    Class(String),
    Attribute {
        name: String,
        matcher: Option<(AttrOp, String)>,
    },
    PseudoClass(String),
    /// `:not()`, `:is()` and `:where()`.
    Logical(String, SelectorList),
    PseudoElement(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AttrOp {
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

impl SelectorList {
    pub fn parse(text: &str) -> Result<Self> {
        let err = || Error::InvalidSelector(text.to_owned());
        let mut parser = Parser {
            input: text,
            pos: 0,
        };
        let list = parser.selector_list().ok_or_else(err)?;
        parser.skip_whitespace();
        if parser.pos != text.len() {
            return Err(err());
        }
        Ok(list)
    }

    pub fn matches(&self, page: &Page, node: NodeId) -> bool {
        self.0.iter().any(|sel| sel.matches(page, node))
    }

    /// Highest specificity of all selectors in the list that match `node`.
    pub fn matching_specificity(&self, page: &Page, node: NodeId) -> Option<Specificity> {
        self.0
            .iter()
            .filter(|sel| sel.matches(page, node))
            .map(ComplexSelector::specificity)
            .max()
    }

    fn max_specificity(&self) -> Specificity {
        self.0
            .iter()
            .map(ComplexSelector::specificity)
            .max()
            .unwrap_or((0, 0, 0))
    }
}

impl ComplexSelector {
    fn matches(&self, page: &Page, node: NodeId) -> bool {
        self.match_at(self.compounds.len() - 1, page, node)
    }

    fn match_at(&self, idx: usize, page: &Page, node: NodeId) -> bool {
        if !self.compounds[idx].matches(page, node) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match self.combinators[idx - 1] {
            Combinator::Child => page
                .parent_element(node)
                .map_or(false, |parent| self.match_at(idx - 1, page, parent)),
            Combinator::Descendant => {
                let mut current = page.parent_element(node);
                while let Some(ancestor) = current {
                    if self.match_at(idx - 1, page, ancestor) {
                        return true;
                    }
                    current = page.parent_element(ancestor);
                }
                false
            }
            Combinator::NextSibling => page
                .previous_element_sibling(node)
                .map_or(false, |sibling| self.match_at(idx - 1, page, sibling)),
            Combinator::SubsequentSibling => {
                let mut current = page.previous_element_sibling(node);
                while let Some(sibling) = current {
                    if self.match_at(idx - 1, page, sibling) {
                        return true;
                    }
                    current = page.previous_element_sibling(sibling);
                }
                false
            }
        }
    }

    fn specificity(&self) -> Specificity {
        self.compounds
            .iter()
            .flat_map(|compound| compound.0.iter())
            .map(Simple::specificity)
            .fold((0, 0, 0), |acc, s| (acc.0 + s.0, acc.1 + s.1, acc.2 + s.2))
    }
}

impl Compound {
    fn matches(&self, page: &Page, node: NodeId) -> bool {
        self.0.iter().all(|simple| simple.matches(page, node))
    }
}

impl Simple {
    fn matches(&self, page: &Page, node: NodeId) -> bool {
        let element = page.element(node);
        match self {
            Simple::Universal => true,
            Simple::Type(tag) => element.tag() == tag.as_str(),
            Simple::Id(id) => element.attr("id") == Some(id.as_str()),
            Simple::Class(class) => element
                .attr("class")
                .map_or(false, |classes| classes.split_whitespace().any(|c| c == class.as_str())),
            Simple::Attribute { name, matcher } => match (element.attr(name), matcher) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some((op, expected))) => op.matches(actual, expected),
            },
            Simple::PseudoClass(name) => match name.as_str() {
                "root" => node == page.root(),
                "first-child" => {
                    page.parent_element(node).is_some()
                        && page.previous_element_sibling(node).is_none()
                }
                "last-child" => {
                    page.parent_element(node).is_some() && page.next_element_sibling(node).is_none()
                }
                // Dynamic and unsupported states never match
                _ => false,
            },
            Simple::Logical(name, list) => match name.as_str() {
                "not" => !list.matches(page, node),
                _ => list.matches(page, node),
            },
            Simple::PseudoElement(_) => false,
        }
    }

    fn specificity(&self) -> Specificity {
        match self {
            Simple::Universal => (0, 0, 0),
            Simple::Id(_) => (1, 0, 0),
            Simple::Class(_) | Simple::Attribute { .. } | Simple::PseudoClass(_) => (0, 1, 0),
            Simple::Type(_) | Simple::PseudoElement(_) => (0, 0, 1),
            Simple::Logical(name, _) if name == "where" => (0, 0, 0),
            Simple::Logical(_, list) => list.max_specificity(),
        }
    }
}

impl AttrOp {
    fn matches(self, actual: &str, expected: &str) -> bool {
        match self {
            AttrOp::Equals => actual == expected,
            AttrOp::Includes => actual.split_whitespace().any(|word| word == expected),
            AttrOp::DashMatch => {
                actual == expected || actual.starts_with(&format!("{}-", expected))
            }
            AttrOp::Prefix => !expected.is_empty() && actual.starts_with(expected),
            AttrOp::Suffix => !expected.is_empty() && actual.ends_with(expected),
            AttrOp::Substring => !expected.is_empty() && actual.contains(expected),
        }
    }
}

/// Recursive descent over the selector text.
///
/// Every method returns `None` on a syntax error.
struct Parser<'s> {
    input: &'s str,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn rest(&self) -> &'s str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let before = self.pos;
        while let Some(ch) = self.peek().filter(|ch| ch.is_whitespace()) {
            self.pos += ch.len_utf8();
        }
        self.pos != before
    }

    fn selector_list(&mut self) -> Option<SelectorList> {
        let mut selectors = vec![self.complex()?];
        loop {
            self.skip_whitespace();
            if !self.eat(',') {
                break;
            }
            selectors.push(self.complex()?);
        }
        Some(SelectorList(selectors))
    }

    fn complex(&mut self) -> Option<ComplexSelector> {
        self.skip_whitespace();
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(',') | Some(')') | None => break,
                Some(_) if had_space => Combinator::Descendant,
                Some(_) => return None,
            };
            if combinator != Combinator::Descendant {
                self.bump();
                self.skip_whitespace();
            }
            combinators.push(combinator);
            compounds.push(self.compound()?);
        }
        Some(ComplexSelector {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Option<Compound> {
        let mut simples = Vec::new();
        if self.eat('*') {
            simples.push(Simple::Universal);
        } else if let Some(tag) = self.ident() {
            simples.push(Simple::Type(tag.to_lowercase()));
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    simples.push(Simple::Id(self.ident()?));
                }
                Some('.') => {
                    self.bump();
                    simples.push(Simple::Class(self.ident()?));
                }
                Some('[') => {
                    self.bump();
                    simples.push(self.attribute()?);
                }
                Some(':') => {
                    self.bump();
                    simples.push(self.pseudo()?);
                }
                _ => break,
            }
        }
        if simples.is_empty() {
            None
        } else {
            Some(Compound(simples))
        }
    }

    fn attribute(&mut self) -> Option<Simple> {
        self.skip_whitespace();
        let name = self.ident()?.to_lowercase();
        self.skip_whitespace();
        let op = match self.bump()? {
            ']' => return Some(Simple::Attribute {
                name,
                matcher: None,
            }),
            '=' => AttrOp::Equals,
            other => {
                let op = match other {
                    '~' => AttrOp::Includes,
                    '|' => AttrOp::DashMatch,
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    '*' => AttrOp::Substring,
                    _ => return None,
                };
                if !self.eat('=') {
                    return None;
                }
                op
            }
        };
        self.skip_whitespace();
        let value = match self.peek()? {
            quote @ ('"' | '\'') => {
                let (value, rest) = unquote(self.rest(), quote)?;
                self.pos = self.input.len() - rest.len();
                value
            }
            _ => self.ident()?,
        };
        self.skip_whitespace();
        // Case sensitivity flags are accepted and ignored
        if let Some('i' | 'I' | 's' | 'S') = self.peek() {
            self.bump();
            self.skip_whitespace();
        }
        if !self.eat(']') {
            return None;
        }
        Some(Simple::Attribute {
            name,
            matcher: Some((op, value)),
        })
    }

    fn pseudo(&mut self) -> Option<Simple> {
        let element = self.eat(':');
        let name = self.ident()?.to_lowercase();
        let argument = if self.eat('(') {
            Some(self.parenthesized()?)
        } else {
            None
        };
        if element || LEGACY_PSEUDO_ELEMENTS.contains(&name.as_str()) {
            return Some(Simple::PseudoElement(name));
        }
        match (name.as_str(), argument) {
            ("not" | "is" | "where" | "matches", Some(arg)) => {
                Some(Simple::Logical(name.clone(), SelectorList::parse(arg).ok()?))
            }
            (_, Some(_)) => Some(Simple::PseudoClass(format!("{}()", name))),
            (_, None) => Some(Simple::PseudoClass(name)),
        }
    }

    /// Read up to the matching `)` and return the text in between.
    fn parenthesized(&mut self) -> Option<&'s str> {
        let start = self.pos;
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        while let Some(ch) = self.bump() {
            match (quote, ch) {
                (_, '\\') => {
                    self.bump();
                }
                (Some(q), ch) if ch == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(ch),
                (None, '(') => depth += 1,
                (None, ')') if depth == 0 => return Some(&self.input[start..self.pos - 1]),
                (None, ')') => depth -= 1,
                _ => {}
            }
        }
        None
    }

    fn ident(&mut self) -> Option<String> {
        let start = self.pos;
        let mut ident = String::new();
        while let Some(ch) = self.peek() {
            match ch {
                '\\' => {
                    self.bump();
                    ident.push(self.bump()?);
                }
                ch if ch.is_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii() => {
                    self.bump();
                    ident.push(ch);
                }
                _ => break,
            }
        }
        let valid = !ident.is_empty() && ident != "-" && !ident.starts_with(|c: char| c.is_ascii_digit());
        if valid {
            Some(ident)
        } else {
            self.pos = start;
            None
        }
    }
}
