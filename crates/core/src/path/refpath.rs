//! Reference Path parser.
//!
//! A Reference Path is the write-addressable subset of JSONPath: `$`
//! followed by field accesses (`.name` or `['name']`) and array indices
//! (`[k]`). Wildcards, filters, slices, and descendant operators are
//! rejected.

use std::fmt;

use super::PathError;

/// One step of a Reference Path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefToken {
    Field(String),
    Index(usize),
}

/// A parsed Reference Path. `$` alone parses to an empty token list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefPath {
    pub tokens: Vec<RefToken>,
}

impl RefPath {
    pub fn parse(src: &str) -> Result<RefPath, PathError> {
        let chars: Vec<char> = src.chars().collect();
        let mut pos = 0usize;

        if chars.first() != Some(&'$') {
            return Err(PathError::new(src, 0, "reference path must start with '$'"));
        }
        pos += 1;

        let mut tokens = Vec::new();
        while pos < chars.len() {
            match chars[pos] {
                '.' => {
                    pos += 1;
                    let start = pos;
                    while pos < chars.len() && is_field_char(chars[pos]) {
                        pos += 1;
                    }
                    if pos == start {
                        return Err(PathError::new(src, start, "expected field name after '.'"));
                    }
                    tokens.push(RefToken::Field(chars[start..pos].iter().collect()));
                }
                '[' => {
                    pos += 1;
                    if pos >= chars.len() {
                        return Err(PathError::new(src, pos, "unterminated '['"));
                    }
                    if chars[pos] == '\'' {
                        pos += 1;
                        let start = pos;
                        while pos < chars.len() && chars[pos] != '\'' {
                            pos += 1;
                        }
                        if pos >= chars.len() {
                            return Err(PathError::new(src, start, "unterminated quoted field"));
                        }
                        let name: String = chars[start..pos].iter().collect();
                        if name.is_empty() {
                            return Err(PathError::new(src, start, "empty quoted field"));
                        }
                        pos += 1; // closing quote
                        if pos >= chars.len() || chars[pos] != ']' {
                            return Err(PathError::new(src, pos, "expected ']' after quoted field"));
                        }
                        pos += 1;
                        tokens.push(RefToken::Field(name));
                    } else if chars[pos].is_ascii_digit() {
                        let start = pos;
                        while pos < chars.len() && chars[pos].is_ascii_digit() {
                            pos += 1;
                        }
                        if pos >= chars.len() || chars[pos] != ']' {
                            return Err(PathError::new(src, pos, "expected ']' after index"));
                        }
                        let digits: String = chars[start..pos].iter().collect();
                        let index = digits.parse::<usize>().map_err(|_| {
                            PathError::new(src, start, "array index out of range")
                        })?;
                        pos += 1;
                        tokens.push(RefToken::Index(index));
                    } else {
                        // Wildcards, slices, filters, unions all land here.
                        return Err(PathError::new(
                            src,
                            pos,
                            "only field names and array indices are allowed in a reference path",
                        ));
                    }
                }
                other => {
                    return Err(PathError::new(
                        src,
                        pos,
                        format!("unexpected character '{}'", other),
                    ));
                }
            }
        }

        Ok(RefPath { tokens })
    }

    /// True for `$` -- the path that addresses the whole document.
    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Read the single location this path addresses. A reference path
    /// never matches more than one value; `None` means the location does
    /// not exist.
    pub fn resolve<'a>(&self, root: &'a serde_json::Value) -> Option<&'a serde_json::Value> {
        let mut current = root;
        for token in &self.tokens {
            current = match token {
                RefToken::Field(name) => current.as_object()?.get(name)?,
                RefToken::Index(i) => current.as_array()?.get(*i)?,
            };
        }
        Some(current)
    }
}

fn is_field_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

impl fmt::Display for RefPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for t in &self.tokens {
            match t {
                RefToken::Field(name) => {
                    if !name.is_empty() && name.chars().all(is_field_char) {
                        write!(f, ".{}", name)?;
                    } else {
                        write!(f, "['{}']", name)?;
                    }
                }
                RefToken::Index(i) => write!(f, "[{}]", i)?,
            }
        }
        Ok(())
    }
}
