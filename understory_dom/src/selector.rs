// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small compound-selector matcher for [`Document::query_all`](crate::Document::query_all).
//!
//! Supported: an optional tag name (or `*`), then any number of `#id`, `[attr]`,
//! `[attr=value]` and `[attr^=value]` parts, all of which must match. Values may be bare
//! or quoted. Combinators, classes and pseudo-classes are rejected.
//!
//! ```
//! use understory_dom::Selector;
//!
//! let s: Selector = "a[data-type^=ancestor][data-inscope]".parse().unwrap();
//! assert!(s.matches("a", &[("data-type", "ancestor-1"), ("data-inscope", "")]));
//! assert!(!s.matches("div", &[("data-type", "ancestor-1"), ("data-inscope", "")]));
//! assert!("div > a".parse::<Selector>().is_err());
//! ```

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::DomError;

#[derive(Clone, Debug, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Prefix(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct AttrMatch {
    name: String,
    op: AttrOp,
}

/// A parsed compound selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    attrs: Vec<AttrMatch>,
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !is_ident(c)).unwrap_or(s.len());
    s.split_at(end)
}

impl Selector {
    /// Parse a selector.
    pub fn parse(text: &str) -> Result<Self, DomError> {
        let err = |reason| DomError::InvalidSelector {
            selector: text.to_string(),
            reason,
        };
        let mut rest = text.trim();
        if rest.is_empty() {
            return Err(err("empty selector"));
        }

        let mut tag = None;
        if let Some(r) = rest.strip_prefix('*') {
            rest = r;
        } else {
            let (ident, r) = take_ident(rest);
            if !ident.is_empty() {
                tag = Some(ident.to_ascii_lowercase());
                rest = r;
            }
        }

        let mut attrs = Vec::new();
        let mut seen_id = false;
        while let Some(c) = rest.chars().next() {
            match c {
                '#' => {
                    if seen_id {
                        return Err(err("more than one id"));
                    }
                    let (ident, r) = take_ident(&rest[1..]);
                    if ident.is_empty() {
                        return Err(err("expected an id after `#`"));
                    }
                    seen_id = true;
                    attrs.push(AttrMatch {
                        name: "id".to_string(),
                        op: AttrOp::Equals(ident.to_string()),
                    });
                    rest = r;
                }
                '[' => {
                    let (name, r) = take_ident(&rest[1..]);
                    if name.is_empty() {
                        return Err(err("expected an attribute name"));
                    }
                    let (op, r) = if let Some(r) = r.strip_prefix(']') {
                        (AttrOp::Exists, r)
                    } else if let Some(r) = r.strip_prefix("^=") {
                        let (v, r) = Self::take_value(r).ok_or_else(|| err("bad attribute value"))?;
                        (AttrOp::Prefix(v), r)
                    } else if let Some(r) = r.strip_prefix('=') {
                        let (v, r) = Self::take_value(r).ok_or_else(|| err("bad attribute value"))?;
                        (AttrOp::Equals(v), r)
                    } else {
                        return Err(err("unsupported attribute operator"));
                    };
                    attrs.push(AttrMatch {
                        name: name.to_ascii_lowercase(),
                        op,
                    });
                    rest = r;
                }
                _ => return Err(err("unsupported selector syntax")),
            }
        }

        Ok(Self { tag, attrs })
    }

    /// Parse `value]` where value is bare or quoted; returns the value and what follows `]`.
    fn take_value(s: &str) -> Option<(String, &str)> {
        let (value, r) = match s.chars().next()? {
            q @ ('"' | '\'') => {
                let body = &s[1..];
                let end = body.find(q)?;
                (&body[..end], &body[end + 1..])
            }
            _ => take_ident(s),
        };
        let r = r.strip_prefix(']')?;
        Some((value.to_string(), r))
    }

    /// Whether an element with `tag` and `attrs` matches.
    pub fn matches<N, V>(&self, tag: &str, attrs: &[(N, V)]) -> bool
    where
        N: AsRef<str>,
        V: AsRef<str>,
    {
        if let Some(t) = &self.tag
            && !t.eq_ignore_ascii_case(tag)
        {
            return false;
        }
        self.attrs.iter().all(|m| {
            let Some((_, value)) = attrs.iter().find(|(n, _)| n.as_ref() == m.name) else {
                return false;
            };
            let value = value.as_ref();
            match &m.op {
                AttrOp::Exists => true,
                AttrOp::Equals(v) => value == v,
                AttrOp::Prefix(p) => value.starts_with(p.as_str()),
            }
        })
    }
}

impl core::str::FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
