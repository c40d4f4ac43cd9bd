// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selector parsing and matching.
//!
//! ## Supported subset
//!
//! - Type (`div`), universal (`*`), `#id`, `.class`, `[attr]`, `[attr=value]`
//!   with a quoted or bare value, and compounds of these (`a.b#c[d]`).
//! - Combinators: descendant (whitespace), child (`>`), adjacent sibling (`+`),
//!   general sibling (`~`).
//! - Selector lists (`a, b`).
//!
//! Pseudo-classes and the other attribute operators are rejected with
//! [`DomError::UnsupportedSelector`].

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::DomError;
use crate::tree::State;
use crate::types::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    universal: bool,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCondition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Part {
    compound: Compound,
    // Relation to the part on the left.
    combinator: Option<Combinator>,
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorList(Vec<Vec<Part>>);

fn unsupported(selector: &str) -> DomError {
    DomError::UnsupportedSelector(selector.to_string())
}

impl SelectorList {
    pub(crate) fn parse(selector: &str) -> Result<Self, DomError> {
        let groups = split_groups(selector)?;
        let mut parsed = Vec::with_capacity(groups.len());
        for group in groups {
            parsed.push(parse_chain(group)?);
        }
        Ok(Self(parsed))
    }

    /// Whether `node` matches any selector in the list.
    pub(crate) fn matches(&self, state: &State, node: NodeId) -> bool {
        self.0.iter().any(|chain| matches_chain(state, node, chain))
    }
}

fn split_groups(selector: &str) -> Result<Vec<&str>, DomError> {
    let mut groups = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut bracket_depth = 0_usize;
    for (i, ch) in selector.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '[') => bracket_depth += 1,
            (None, ']') => {
                bracket_depth = bracket_depth
                    .checked_sub(1)
                    .ok_or_else(|| unsupported(selector))?;
            }
            (None, ',') if bracket_depth == 0 => {
                groups.push(selector[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if quote.is_some() || bracket_depth != 0 {
        return Err(unsupported(selector));
    }
    groups.push(selector[start..].trim());
    if groups.iter().any(|g| g.is_empty()) {
        return Err(unsupported(selector));
    }
    Ok(groups)
}

fn tokenize(selector: &str) -> Result<Vec<&str>, DomError> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut quote: Option<char> = None;
    let mut bracket_depth = 0_usize;
    for (i, ch) in selector.char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' if bracket_depth > 0 => quote = Some(ch),
            '[' => {
                bracket_depth += 1;
                start.get_or_insert(i);
            }
            ']' => {
                bracket_depth = bracket_depth
                    .checked_sub(1)
                    .ok_or_else(|| unsupported(selector))?;
            }
            '>' | '+' | '~' if bracket_depth == 0 => {
                if let Some(s) = start.take() {
                    tokens.push(&selector[s..i]);
                }
                tokens.push(&selector[i..i + 1]);
            }
            c if c.is_ascii_whitespace() && bracket_depth == 0 => {
                if let Some(s) = start.take() {
                    tokens.push(&selector[s..i]);
                }
            }
            _ => {
                start.get_or_insert(i);
            }
        }
    }
    if quote.is_some() || bracket_depth != 0 {
        return Err(unsupported(selector));
    }
    if let Some(s) = start {
        tokens.push(&selector[s..]);
    }
    Ok(tokens)
}

fn parse_chain(selector: &str) -> Result<Vec<Part>, DomError> {
    let mut parts: Vec<Part> = Vec::new();
    let mut pending: Option<Combinator> = None;
    for token in tokenize(selector)? {
        let combinator = match token {
            ">" => Some(Combinator::Child),
            "+" => Some(Combinator::AdjacentSibling),
            "~" => Some(Combinator::GeneralSibling),
            _ => None,
        };
        if let Some(combinator) = combinator {
            if pending.is_some() || parts.is_empty() {
                return Err(unsupported(selector));
            }
            pending = Some(combinator);
            continue;
        }
        let compound = parse_compound(token)?;
        let combinator = if parts.is_empty() {
            None
        } else {
            Some(pending.take().unwrap_or(Combinator::Descendant))
        };
        parts.push(Part {
            compound,
            combinator,
        });
    }
    if parts.is_empty() || pending.is_some() {
        return Err(unsupported(selector));
    }
    Ok(parts)
}

fn parse_compound(part: &str) -> Result<Compound, DomError> {
    let bytes = part.as_bytes();
    let mut i = 0;
    let mut compound = Compound::default();
    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if compound.universal || compound.tag.is_some() || i != 0 {
                    return Err(unsupported(part));
                }
                compound.universal = true;
                i += 1;
            }
            b'#' => {
                let (id, next) = parse_ident(part, i + 1).ok_or_else(|| unsupported(part))?;
                if compound.id.replace(id.to_string()).is_some() {
                    return Err(unsupported(part));
                }
                i = next;
            }
            b'.' => {
                let (class, next) = parse_ident(part, i + 1).ok_or_else(|| unsupported(part))?;
                compound.classes.push(class.to_string());
                i = next;
            }
            b'[' => {
                let (attr, next) = parse_attr(part, i)?;
                compound.attrs.push(attr);
                i = next;
            }
            _ => {
                if i != 0 {
                    return Err(unsupported(part));
                }
                let (tag, next) = parse_ident(part, i).ok_or_else(|| unsupported(part))?;
                compound.tag = Some(tag.to_string());
                i = next;
            }
        }
    }
    Ok(compound)
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

fn parse_ident(src: &str, start: usize) -> Option<(&str, usize)> {
    let bytes = src.as_bytes();
    let len = bytes
        .get(start..)?
        .iter()
        .take_while(|&&b| is_ident_byte(b))
        .count();
    (len > 0).then(|| (&src[start..start + len], start + len))
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
        i += 1;
    }
    i
}

fn parse_attr(src: &str, open_bracket: usize) -> Result<(AttrCondition, usize), DomError> {
    let bytes = src.as_bytes();
    let i = skip_whitespace(bytes, open_bracket + 1);
    let key_len = bytes[i..]
        .iter()
        .take_while(|&&b| is_ident_byte(b) || b == b':')
        .count();
    if key_len == 0 {
        return Err(unsupported(src));
    }
    let key = src[i..i + key_len].to_ascii_lowercase();
    let i = skip_whitespace(bytes, i + key_len);
    match bytes.get(i) {
        Some(b']') => Ok((AttrCondition::Exists { key }, i + 1)),
        Some(b'=') => {
            let (value, next) = parse_attr_value(src, skip_whitespace(bytes, i + 1))?;
            let next = skip_whitespace(bytes, next);
            if bytes.get(next) != Some(&b']') {
                return Err(unsupported(src));
            }
            Ok((AttrCondition::Eq { key, value }, next + 1))
        }
        _ => Err(unsupported(src)),
    }
}

fn parse_attr_value(src: &str, start: usize) -> Result<(String, usize), DomError> {
    let bytes = src.as_bytes();
    match bytes.get(start) {
        Some(&quote @ (b'"' | b'\'')) => {
            let len = bytes[start + 1..]
                .iter()
                .position(|&b| b == quote)
                .ok_or_else(|| unsupported(src))?;
            let end = start + 1 + len;
            Ok((src[start + 1..end].to_string(), end + 1))
        }
        Some(_) => {
            let len = bytes[start..]
                .iter()
                .take_while(|&&b| !b.is_ascii_whitespace() && b != b']')
                .count();
            if len == 0 {
                return Err(unsupported(src));
            }
            Ok((src[start..start + len].to_string(), start + len))
        }
        None => Err(unsupported(src)),
    }
}

fn matches_chain(state: &State, node: NodeId, parts: &[Part]) -> bool {
    let Some((last, rest)) = parts.split_last() else {
        return false;
    };
    if !matches_compound(state, node, &last.compound) {
        return false;
    }
    let mut current = node;
    let mut combinator = last.combinator;
    for part in rest.iter().rev() {
        let step = &part.compound;
        let found = match combinator.unwrap_or(Combinator::Descendant) {
            Combinator::Child => state
                .parent_element(current)
                .filter(|&p| matches_compound(state, p, step)),
            Combinator::Descendant => {
                let mut cursor = state.parent_element(current);
                while let Some(p) = cursor {
                    if matches_compound(state, p, step) {
                        break;
                    }
                    cursor = state.parent_element(p);
                }
                cursor
            }
            Combinator::AdjacentSibling => state
                .previous_element_sibling(current)
                .filter(|&s| matches_compound(state, s, step)),
            Combinator::GeneralSibling => {
                let mut cursor = state.previous_element_sibling(current);
                while let Some(s) = cursor {
                    if matches_compound(state, s, step) {
                        break;
                    }
                    cursor = state.previous_element_sibling(s);
                }
                cursor
            }
        };
        let Some(found) = found else {
            return false;
        };
        current = found;
        combinator = part.combinator;
    }
    true
}

fn matches_compound(state: &State, node: NodeId, compound: &Compound) -> bool {
    let Some(element) = state.element(node) else {
        return false;
    };
    if let Some(tag) = &compound.tag
        && !element.matches_type(tag)
    {
        return false;
    }
    if let Some(id) = &compound.id
        && element.attribute("id") != Some(id.as_str())
    {
        return false;
    }
    if !compound.classes.iter().all(|c| element.has_class(c)) {
        return false;
    }
    compound.attrs.iter().all(|cond| match cond {
        AttrCondition::Exists { key } => element.attribute(key).is_some(),
        AttrCondition::Eq { key, value } => element.attribute(key) == Some(value.as_str()),
    })
}
