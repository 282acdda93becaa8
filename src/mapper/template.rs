//! Naming template engine.
//!
//! Templates are literal text with `{key}` placeholders. Integer values may
//! carry a width spec: `{issue:03d}` zero-pads to three digits, `{issue:3d}`
//! space-pads. `{{` and `}}` are literal braces.
//!
//! Rendering validates every placeholder against the substitution set
//! before producing any output, so a template either renders completely or
//! reports exactly why it cannot.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;

static INT_SPEC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0)?([0-9]*)d$").expect("valid format spec pattern"));

/// Why a template cannot be used
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unmatched '{brace}' at position {position}")]
    UnbalancedBrace { brace: char, position: usize },

    #[error("empty placeholder at position {position}")]
    EmptyPlaceholder { position: usize },

    #[error("unsupported format spec '{spec}' for key '{key}'")]
    UnsupportedSpec { key: String, spec: String },

    #[error("unknown key '{0}'")]
    MissingKey(String),

    #[error("key '{0}' is not an integer")]
    NotAnInteger(String),
}

/// A substitution value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Int(i64),
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

/// Substitution dictionary handed to a template
pub type Substitutions = BTreeMap<&'static str, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct IntFormat {
    zero_pad: bool,
    width: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field {
        key: String,
        int_format: Option<IntFormat>,
    },
}

/// A parsed naming template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template string
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        let mut chars = raw.char_indices().peekable();
        let mut segments = Vec::new();
        let mut literal = String::new();

        while let Some((position, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(parse_placeholder(&mut chars, position)?);
                }
                '}' => {
                    return Err(TemplateError::UnbalancedBrace {
                        brace: '}',
                        position,
                    })
                }
                _ => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Keys referenced by the template, in order of first use
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Field { key, .. } = segment {
                if !keys.contains(&key.as_str()) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// Check every placeholder against `values` without rendering
    pub fn validate(&self, values: &Substitutions) -> Result<(), TemplateError> {
        for segment in &self.segments {
            if let Segment::Field { key, int_format } = segment {
                match values.get(key.as_str()) {
                    None => return Err(TemplateError::MissingKey(key.clone())),
                    Some(Value::Text(_)) if int_format.is_some() => {
                        return Err(TemplateError::NotAnInteger(key.clone()))
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    /// Validate, then render
    pub fn render(&self, values: &Substitutions) -> Result<String, TemplateError> {
        self.validate(values)?;

        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field { key, int_format } => match (values.get(key.as_str()), int_format) {
                    (Some(Value::Int(n)), Some(fmt)) if fmt.zero_pad => {
                        out.push_str(&format!("{:0width$}", n, width = fmt.width))
                    }
                    (Some(Value::Int(n)), Some(fmt)) => {
                        out.push_str(&format!("{:>width$}", n, width = fmt.width))
                    }
                    (Some(Value::Int(n)), None) => out.push_str(&n.to_string()),
                    (Some(Value::Text(text)), _) => out.push_str(text),
                    (None, _) => return Err(TemplateError::MissingKey(key.clone())),
                },
            }
        }
        Ok(out)
    }
}

/// Parse `key}` or `key:spec}` after an opening brace
fn parse_placeholder(
    chars: &mut Peekable<CharIndices<'_>>,
    open: usize,
) -> Result<Segment, TemplateError> {
    let mut body = String::new();
    loop {
        match chars.next() {
            Some((_, '}')) => break,
            Some((position, '{')) => {
                return Err(TemplateError::UnbalancedBrace {
                    brace: '{',
                    position,
                })
            }
            Some((_, c)) => body.push(c),
            None => {
                return Err(TemplateError::UnbalancedBrace {
                    brace: '{',
                    position: open,
                })
            }
        }
    }

    let (key, spec) = match body.split_once(':') {
        Some((key, spec)) => (key.trim(), Some(spec)),
        None => (body.trim(), None),
    };

    if key.is_empty() {
        return Err(TemplateError::EmptyPlaceholder { position: open });
    }

    let int_format = match spec {
        None => None,
        Some(spec) => {
            let caps = INT_SPEC
                .captures(spec)
                .ok_or_else(|| TemplateError::UnsupportedSpec {
                    key: key.to_string(),
                    spec: spec.to_string(),
                })?;
            Some(IntFormat {
                zero_pad: caps.get(1).is_some(),
                width: caps
                    .get(2)
                    .and_then(|m| m.as_str().parse().ok())
                    .unwrap_or(0),
            })
        }
    };

    Ok(Segment::Field {
        key: key.to_string(),
        int_format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> Substitutions {
        let mut values = Substitutions::new();
        values.insert("series", Value::from("Saga"));
        values.insert("issue", Value::Int(7));
        values.insert("volume", Value::Int(12));
        values
    }

    #[test]
    fn test_render_plain_and_padded() {
        let template = Template::parse("{series} #{issue:03d} v{volume:02d} [{issue:3d}] {issue}").unwrap();
        assert_eq!(template.render(&values()).unwrap(), "Saga #007 v12 [  7] 7");
    }

    #[test]
    fn test_escaped_braces() {
        let template = Template::parse("{{{series}}}").unwrap();
        assert_eq!(template.render(&values()).unwrap(), "{Saga}");
    }

    #[test]
    fn test_keys_in_order() {
        let template = Template::parse("{series}/{issue}-{series}").unwrap();
        assert_eq!(template.keys(), vec!["series", "issue"]);
    }

    #[test]
    fn test_missing_key() {
        let template = Template::parse("{series} {publisher}").unwrap();
        assert_eq!(
            template.render(&values()),
            Err(TemplateError::MissingKey("publisher".to_string()))
        );
    }

    #[test]
    fn test_int_spec_on_text_rejected() {
        let template = Template::parse("{series:03d}").unwrap();
        assert_eq!(
            template.validate(&values()),
            Err(TemplateError::NotAnInteger("series".to_string()))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Template::parse("{series"),
            Err(TemplateError::UnbalancedBrace { brace: '{', .. })
        ));
        assert!(matches!(
            Template::parse("series}"),
            Err(TemplateError::UnbalancedBrace { brace: '}', .. })
        ));
        assert!(matches!(
            Template::parse("{}"),
            Err(TemplateError::EmptyPlaceholder { position: 0 })
        ));
        assert!(matches!(
            Template::parse("{issue:>5}"),
            Err(TemplateError::UnsupportedSpec { .. })
        ));
    }

    #[test]
    fn test_literal_only() {
        let template = Template::parse("Specials").unwrap();
        assert!(template.keys().is_empty());
        assert_eq!(template.render(&Substitutions::new()).unwrap(), "Specials");
    }
}
