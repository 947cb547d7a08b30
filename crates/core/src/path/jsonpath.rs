//! JSONPath parsing and selection over `serde_json::Value`.
//!
//! Covers the subset ASL documents actually use: dot and bracket field
//! access, array indices (negative counts from the end), wildcards, and
//! recursive descent. Filters, slices, and unions are parse errors --
//! a document that needs them is out of scope for this grammar.

use serde_json::Value;

use super::PathError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(i64),
    Wildcard,
    RecursiveField(String),
    RecursiveWildcard,
}

/// A parsed JSONPath expression rooted at `$`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    pub segments: Vec<Segment>,
}

impl JsonPath {
    pub fn parse(src: &str) -> Result<JsonPath, PathError> {
        let chars: Vec<char> = src.chars().collect();
        let mut pos = 0usize;

        if chars.first() != Some(&'$') {
            return Err(PathError::new(src, 0, "path must start with '$'"));
        }
        pos += 1;

        let mut segments = Vec::new();
        while pos < chars.len() {
            match chars[pos] {
                '.' => {
                    let recursive = pos + 1 < chars.len() && chars[pos + 1] == '.';
                    pos += if recursive { 2 } else { 1 };
                    if pos < chars.len() && chars[pos] == '*' {
                        pos += 1;
                        segments.push(if recursive {
                            Segment::RecursiveWildcard
                        } else {
                            Segment::Wildcard
                        });
                        continue;
                    }
                    let start = pos;
                    while pos < chars.len() && is_field_char(chars[pos]) {
                        pos += 1;
                    }
                    if pos == start {
                        return Err(PathError::new(src, start, "expected field name after '.'"));
                    }
                    let name: String = chars[start..pos].iter().collect();
                    segments.push(if recursive {
                        Segment::RecursiveField(name)
                    } else {
                        Segment::Field(name)
                    });
                }
                '[' => {
                    pos += 1;
                    if pos >= chars.len() {
                        return Err(PathError::new(src, pos, "unterminated '['"));
                    }
                    match chars[pos] {
                        '\'' => {
                            pos += 1;
                            let start = pos;
                            while pos < chars.len() && chars[pos] != '\'' {
                                pos += 1;
                            }
                            if pos >= chars.len() {
                                return Err(PathError::new(src, start, "unterminated quoted field"));
                            }
                            let name: String = chars[start..pos].iter().collect();
                            pos += 1;
                            if pos >= chars.len() || chars[pos] != ']' {
                                return Err(PathError::new(
                                    src,
                                    pos,
                                    "expected ']' after quoted field",
                                ));
                            }
                            pos += 1;
                            segments.push(Segment::Field(name));
                        }
                        '*' => {
                            pos += 1;
                            if pos >= chars.len() || chars[pos] != ']' {
                                return Err(PathError::new(src, pos, "expected ']' after '*'"));
                            }
                            pos += 1;
                            segments.push(Segment::Wildcard);
                        }
                        '?' => {
                            return Err(PathError::new(src, pos, "filter expressions are not supported"));
                        }
                        c if c.is_ascii_digit() || c == '-' => {
                            let start = pos;
                            if chars[pos] == '-' {
                                pos += 1;
                            }
                            while pos < chars.len() && chars[pos].is_ascii_digit() {
                                pos += 1;
                            }
                            if pos >= chars.len() {
                                return Err(PathError::new(src, pos, "unterminated '['"));
                            }
                            if chars[pos] == ':' || chars[pos] == ',' {
                                return Err(PathError::new(
                                    src,
                                    pos,
                                    "slice and union selectors are not supported",
                                ));
                            }
                            if chars[pos] != ']' {
                                return Err(PathError::new(src, pos, "expected ']' after index"));
                            }
                            let digits: String = chars[start..pos].iter().collect();
                            let index = digits
                                .parse::<i64>()
                                .map_err(|_| PathError::new(src, start, "index out of range"))?;
                            pos += 1;
                            segments.push(Segment::Index(index));
                        }
                        other => {
                            return Err(PathError::new(
                                src,
                                pos,
                                format!("unexpected '{}' in bracket selector", other),
                            ));
                        }
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

        Ok(JsonPath { segments })
    }

    /// True for `$` -- selects the whole input.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Select every value the path matches, in document order.
    pub fn select<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
        let mut current = vec![root];
        for seg in &self.segments {
            let mut next = Vec::new();
            for value in current {
                apply_segment(seg, value, &mut next);
            }
            current = next;
        }
        current
    }

    /// Select exactly one value: `None` if the path matches zero or
    /// several values.
    pub fn select_one<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let matches = self.select(root);
        if matches.len() == 1 {
            Some(matches[0])
        } else {
            None
        }
    }
}

fn is_field_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn apply_segment<'a>(seg: &Segment, value: &'a Value, out: &mut Vec<&'a Value>) {
    match seg {
        Segment::Field(name) => {
            if let Some(obj) = value.as_object() {
                if let Some(v) = obj.get(name) {
                    out.push(v);
                }
            }
        }
        Segment::Index(i) => {
            if let Some(arr) = value.as_array() {
                let idx = if *i < 0 { arr.len() as i64 + i } else { *i };
                if idx >= 0 && (idx as usize) < arr.len() {
                    out.push(&arr[idx as usize]);
                }
            }
        }
        Segment::Wildcard => match value {
            Value::Object(obj) => out.extend(obj.values()),
            Value::Array(arr) => out.extend(arr.iter()),
            _ => {}
        },
        Segment::RecursiveField(name) => {
            descend(value, &mut |v| {
                if let Some(obj) = v.as_object() {
                    if let Some(hit) = obj.get(name) {
                        out.push(hit);
                    }
                }
            });
        }
        Segment::RecursiveWildcard => {
            descend(value, &mut |v| match v {
                Value::Object(obj) => out.extend(obj.values()),
                Value::Array(arr) => out.extend(arr.iter()),
                _ => {}
            });
        }
    }
}

/// Visit `value` and every descendant, parents before children.
fn descend<'a>(value: &'a Value, visit: &mut dyn FnMut(&'a Value)) {
    visit(value);
    match value {
        Value::Object(obj) => {
            for v in obj.values() {
                descend(v, visit);
            }
        }
        Value::Array(arr) => {
            for v in arr {
                descend(v, visit);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn select_field_chain() {
        let doc = json!({"a": {"b": {"c": 42}}});
        let p = JsonPath::parse("$.a.b.c").unwrap();
        assert_eq!(p.select(&doc), vec![&json!(42)]);
    }

    #[test]
    fn select_root() {
        let doc = json!({"a": 1});
        let p = JsonPath::parse("$").unwrap();
        assert!(p.is_root());
        assert_eq!(p.select(&doc), vec![&doc]);
    }

    #[test]
    fn select_index_and_negative_index() {
        let doc = json!({"xs": [10, 20, 30]});
        assert_eq!(
            JsonPath::parse("$.xs[1]").unwrap().select(&doc),
            vec![&json!(20)]
        );
        assert_eq!(
            JsonPath::parse("$.xs[-1]").unwrap().select(&doc),
            vec![&json!(30)]
        );
        assert!(JsonPath::parse("$.xs[3]").unwrap().select(&doc).is_empty());
    }

    #[test]
    fn select_wildcard() {
        let doc = json!({"a": {"x": 1, "y": 2}});
        let hits = JsonPath::parse("$.a.*").unwrap().select(&doc);
        assert_eq!(hits, vec![&json!(1), &json!(2)]);
    }

    #[test]
    fn select_recursive_field() {
        let doc = json!({"a": {"price": 1}, "b": [{"price": 2}], "price": 3});
        let hits = JsonPath::parse("$..price").unwrap().select(&doc);
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn select_quoted_field() {
        let doc = json!({"odd key": true});
        let hits = JsonPath::parse("$['odd key']").unwrap().select(&doc);
        assert_eq!(hits, vec![&json!(true)]);
    }

    #[test]
    fn select_one_requires_single_match() {
        let doc = json!({"a": {"x": 1, "y": 2}});
        assert!(JsonPath::parse("$.a.x").unwrap().select_one(&doc).is_some());
        assert!(JsonPath::parse("$.a.*").unwrap().select_one(&doc).is_none());
        assert!(JsonPath::parse("$.missing").unwrap().select_one(&doc).is_none());
    }

    #[test]
    fn no_match_on_scalar() {
        let doc = json!(5);
        assert!(JsonPath::parse("$.a").unwrap().select(&doc).is_empty());
        assert!(JsonPath::parse("$[0]").unwrap().select(&doc).is_empty());
    }

    #[test]
    fn reject_filters_slices_unions() {
        assert!(JsonPath::parse("$.a[?(@.x > 1)]").is_err());
        assert!(JsonPath::parse("$.a[0:2]").is_err());
        assert!(JsonPath::parse("$.a[0,1]").is_err());
    }

    #[test]
    fn reject_malformed() {
        assert!(JsonPath::parse("a.b").is_err());
        assert!(JsonPath::parse("$.").is_err());
        assert!(JsonPath::parse("$.a[").is_err());
        assert!(JsonPath::parse("$x").is_err());
    }
}
