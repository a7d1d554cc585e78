//! Trailing `{{ key: value }}` annotations.
//!
//! The literal between the outer braces is a small JavaScript object
//! literal: bare or quoted keys, `'`/`"`/`` ` `` strings, numbers, booleans,
//! `null`, arrays and nested objects. Anything else (identifiers, calls,
//! template interpolation) is rejected.

use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message} at offset {offset}")]
pub struct AnnotationError {
    pub message: String,
    pub offset: usize,
}

/// Split `text` into its content and a trailing annotation, if any.
///
/// Returns `Ok(None)` when the text has no `{{ ... }}` suffix, and an error
/// when it ends in something shaped like one that does not parse.
///
/// ```
/// use docsmith_core::mdx::annotation::split_annotation;
///
/// let (text, annotation) = split_annotation("Create {{ tag: 'POST' }}")
///     .unwrap()
///     .unwrap();
/// assert_eq!(text, "Create");
/// assert_eq!(annotation["tag"], "POST");
/// ```
pub fn split_annotation(text: &str) -> Result<Option<(String, Map<String, Value>)>, AnnotationError> {
    let trimmed = text.trim_end();
    if !trimmed.ends_with('}') {
        return Ok(None);
    }

    let mut first_error = None;
    for (start, c) in trimmed.char_indices() {
        if c != '{' {
            continue;
        }

        let mut cursor = Cursor::new(trimmed, start);
        cursor.bump();
        cursor.skip_ws();
        if cursor.peek() != Some('{') {
            continue;
        }

        let parsed = cursor.parse_object().and_then(|object| {
            cursor.skip_ws();
            cursor.expect('}')?;
            if cursor.at_end() {
                Ok(object)
            } else {
                Err(cursor.error("unexpected input after annotation"))
            }
        });

        match parsed {
            Ok(object) => {
                return Ok(Some((trimmed[..start].trim_end().to_string(), object)));
            }
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }

    match first_error {
        Some(err) if trimmed.ends_with("}}") => Err(err),
        _ => Ok(None),
    }
}

/// Parse a standalone object literal such as `{ tag: 'GET' }`
pub fn parse_object_literal(source: &str) -> Result<Map<String, Value>, AnnotationError> {
    let mut cursor = Cursor::new(source, 0);
    cursor.skip_ws();
    let object = cursor.parse_object()?;
    cursor.skip_ws();
    if !cursor.at_end() {
        return Err(cursor.error("unexpected input after object"));
    }
    Ok(object)
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str, pos: usize) -> Self {
        Self { src, pos }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), AnnotationError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected `{}`", expected)))
        }
    }

    fn error(&self, message: &str) -> AnnotationError {
        AnnotationError {
            message: message.to_string(),
            offset: self.pos,
        }
    }

    fn parse_value(&mut self) -> Result<Value, AnnotationError> {
        self.skip_ws();
        match self.peek() {
            Some('{') => self.parse_object().map(Value::Object),
            Some('[') => self.parse_array(),
            Some(q @ ('\'' | '"' | '`')) => self.parse_string(q).map(Value::String),
            Some(c) if c == '-' || c == '.' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if is_ident_start(c) => {
                let start = self.pos;
                let ident = self.parse_identifier();
                match ident.as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" => Ok(Value::Null),
                    other => Err(AnnotationError {
                        message: format!("unsupported expression `{}`", other),
                        offset: start,
                    }),
                }
            }
            Some(_) => Err(self.error("expected a value")),
            None => Err(self.error("unexpected end of annotation")),
        }
    }

    fn parse_object(&mut self) -> Result<Map<String, Value>, AnnotationError> {
        self.expect('{')?;
        let mut object = Map::new();
        loop {
            self.skip_ws();
            if self.eat('}') {
                return Ok(object);
            }

            let key = match self.peek() {
                Some(q @ ('\'' | '"')) => self.parse_string(q)?,
                Some(c) if c.is_ascii_digit() => self.take_while(|c| c.is_ascii_digit()),
                Some(c) if is_ident_start(c) => self.parse_identifier(),
                _ => return Err(self.error("expected a property name")),
            };

            self.skip_ws();
            self.expect(':')?;
            let value = self.parse_value()?;
            object.insert(key, value);

            self.skip_ws();
            if !self.eat(',') {
                self.expect('}')?;
                return Ok(object);
            }
        }
    }

    fn parse_array(&mut self) -> Result<Value, AnnotationError> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.eat(']') {
                return Ok(Value::Array(items));
            }
            items.push(self.parse_value()?);
            self.skip_ws();
            if !self.eat(',') {
                self.expect(']')?;
                return Ok(Value::Array(items));
            }
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<String, AnnotationError> {
        self.expect(quote)?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('$') if quote == '`' && self.peek() == Some('{') => {
                    return Err(self.error("template interpolation is not supported"));
                }
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('0') => out.push('\0'),
                    Some('u') => out.push(self.parse_unicode_escape()?),
                    Some(other) => out.push(other),
                    None => return Err(self.error("unterminated string")),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_unicode_escape(&mut self) -> Result<char, AnnotationError> {
        let digits = self.src.get(self.pos..self.pos + 4).unwrap_or("");
        let code = u32::from_str_radix(digits, 16)
            .ok()
            .filter(|_| digits.len() == 4)
            .ok_or_else(|| self.error("invalid unicode escape"))?;
        self.pos += 4;
        char::from_u32(code).ok_or_else(|| self.error("invalid unicode escape"))
    }

    fn parse_number(&mut self) -> Result<Value, AnnotationError> {
        let start = self.pos;
        let text = self.take_while(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'));
        let invalid = || AnnotationError {
            message: format!("invalid number `{}`", text),
            offset: start,
        };

        if let Ok(int) = text.parse::<i64>() {
            return Ok(Value::Number(int.into()));
        }
        let float = text.parse::<f64>().map_err(|_| invalid())?;
        Number::from_f64(float).map(Value::Number).ok_or_else(invalid)
    }

    fn parse_identifier(&mut self) -> String {
        self.take_while(|c| c.is_alphanumeric() || c == '_' || c == '$')
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if pred(c)) {
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_simple_annotation() {
        let (text, annotation) = split_annotation("List contacts {{ tag: 'GET', label: '/v1/contacts' }}")
            .unwrap()
            .unwrap();

        assert_eq!(text, "List contacts");
        assert_eq!(Value::Object(annotation), json!({ "tag": "GET", "label": "/v1/contacts" }));
    }

    #[test]
    fn test_no_annotation() {
        assert_eq!(split_annotation("Plain heading").unwrap(), None);
        assert_eq!(split_annotation("Returns {}").unwrap(), None);
    }

    #[test]
    fn test_nested_values() {
        let (_, annotation) = split_annotation(
            r#"Item {{ "deprecated": true, since: 1.5, tags: ['a', "b"], meta: { n: -2 } }}"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(
            Value::Object(annotation),
            json!({ "deprecated": true, "since": 1.5, "tags": ["a", "b"], "meta": { "n": -2 } })
        );
    }

    #[test]
    fn test_braces_inside_strings() {
        let (text, annotation) = split_annotation("Format {{ label: '{id}' }}").unwrap().unwrap();
        assert_eq!(text, "Format");
        assert_eq!(annotation["label"], "{id}");
    }

    #[test]
    fn test_malformed_annotation_is_error() {
        let err = split_annotation("Broken {{ tag: GET }}").unwrap_err();
        assert!(err.message.contains("unsupported expression"));
    }

    #[test]
    fn test_parse_object_literal_trailing_comma() {
        let object = parse_object_literal("{ a: 1, b: `two`, }").unwrap();
        assert_eq!(Value::Object(object), json!({ "a": 1, "b": "two" }));
    }

    #[test]
    fn test_string_escapes() {
        let object = parse_object_literal(r#"{ s: 'it\'s é' }"#).unwrap();
        assert_eq!(object["s"], "it's é");
    }
}
