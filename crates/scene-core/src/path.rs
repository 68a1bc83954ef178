//! Dot-and-bracket path lookup
//!
//! Paths address nested members of a value: `a.b.c`, `a.b[0]`, `a[2].c`.
//! Each dot-separated segment names a map key or record field and may carry
//! one bracket suffix that then indexes into the result by integer. A segment
//! with an empty key (`[1]`) indexes the current value directly.
//!
//! Lookup distinguishes a member that exists with a `null` value
//! ([`Lookup::Found`]) from one that is absent ([`Lookup::Missing`]). The walk
//! stops with `Missing` as soon as an intermediate value is absent or blank.
//!
//! Copyright (c) 2025 Scene Team
//! Licensed under the Apache-2.0 license

use crate::input::{is_blank_value, value_child, value_index, Input};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

static SEGMENT_REGEX: OnceLock<Regex> = OnceLock::new();

fn segment_regex() -> &'static Regex {
    SEGMENT_REGEX.get_or_init(|| {
        Regex::new(r"^(?P<key>[^\[\]]*)\[(?P<index>[^\[\]]*)\]$").expect("segment pattern is valid")
    })
}

/// Bracket suffix of a path segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentIndex {
    /// `[n]`
    At(usize),
    /// A bracket whose content is not a non-negative integer; never matches
    Invalid(String),
}

/// One dot-separated part of a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub key: String,
    pub index: Option<SegmentIndex>,
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if raw.contains('[') {
            if let Some(captures) = segment_regex().captures(raw) {
                let key = captures["key"].to_string();
                let index = &captures["index"];
                let index = match index.trim().parse::<usize>() {
                    Ok(i) => SegmentIndex::At(i),
                    Err(_) => SegmentIndex::Invalid(index.to_string()),
                };
                return Self { key, index: Some(index) };
            }
        }

        // anything that is not `key[index]` is a literal key
        Self {
            key: raw.to_string(),
            index: None,
        }
    }
}

/// A parsed lookup path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// Parse a path expression. Parsing never fails; malformed segments
    /// become literal keys or unmatched indexes.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path.split('.').map(Segment::parse).collect(),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Walk the path through a JSON value without cloning
    pub fn lookup<'a>(&self, value: &'a Value) -> Lookup<&'a Value> {
        walk(value, &self.segments)
    }

    /// Walk the path through transformer input (records included)
    pub fn lookup_input(&self, input: &Input) -> Lookup<Input> {
        walk(input.clone(), &self.segments)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", segment.key)?;
            match &segment.index {
                Some(SegmentIndex::At(index)) => write!(f, "[{}]", index)?,
                Some(SegmentIndex::Invalid(raw)) => write!(f, "[{}]", raw)?,
                None => {}
            }
        }
        Ok(())
    }
}

/// Result of a path lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    Missing,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Missing => None,
        }
    }
}

trait Traverse: Sized {
    fn is_blank(&self) -> bool;
    fn child(&self, key: &str) -> Option<Self>;
    fn index(&self, index: usize) -> Option<Self>;
}

impl<'a> Traverse for &'a Value {
    fn is_blank(&self) -> bool {
        is_blank_value(self)
    }

    fn child(&self, key: &str) -> Option<Self> {
        value_child(self, key)
    }

    fn index(&self, index: usize) -> Option<Self> {
        value_index(self, index)
    }
}

impl Traverse for Input {
    fn is_blank(&self) -> bool {
        Input::is_blank(self)
    }

    fn child(&self, key: &str) -> Option<Self> {
        Input::child(self, key)
    }

    fn index(&self, index: usize) -> Option<Self> {
        Input::index(self, index)
    }
}

fn walk<T: Traverse>(root: T, segments: &[Segment]) -> Lookup<T> {
    let mut current = root;

    for segment in segments {
        if current.is_blank() {
            return Lookup::Missing;
        }

        let next = match (&segment.index, segment.key.is_empty()) {
            (Some(_), true) => current,
            _ => match current.child(&segment.key) {
                Some(next) => next,
                None => return Lookup::Missing,
            },
        };

        current = match &segment.index {
            None => next,
            Some(SegmentIndex::At(index)) => match next.index(*index) {
                Some(element) => element,
                None => return Lookup::Missing,
            },
            Some(SegmentIndex::Invalid(_)) => return Lookup::Missing,
        };
    }

    Lookup::Found(current)
}

/// Look up `path` in `value`, returning `default` only when the member is absent
pub fn path_get(value: &Value, path: &str, default: Value) -> Value {
    match Path::parse(path).lookup(value) {
        Lookup::Found(found) => found.clone(),
        Lookup::Missing => default,
    }
}
