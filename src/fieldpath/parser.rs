//! Path specification string parser.

use super::ast::{FieldSpec, PathSegment};
use crate::error::{Error, Result};

/// Parser for path specification strings.
///
/// # Example
///
/// ```
/// use yamlstamp::fieldpath::{Parser, PathSegment};
///
/// let spec = Parser::parse("spec.containers[*].env").unwrap();
/// assert_eq!(spec.segments[2], PathSegment::EachElement);
/// ```
pub struct Parser {
    source: String,
    input: Vec<char>,
    position: usize,
}

impl Parser {
    /// Creates a new parser for the given path string.
    pub fn new(path: &str) -> Self {
        Self {
            source: path.to_string(),
            input: path.chars().collect(),
            position: 0,
        }
    }

    /// Parses the path string into a `FieldSpec` that does not create
    /// missing fields.
    pub fn parse(path: &str) -> Result<FieldSpec> {
        let mut parser = Parser::new(path);
        parser.parse_path()
    }

    fn parse_path(&mut self) -> Result<FieldSpec> {
        let mut segments = Vec::new();

        self.skip_whitespace();

        // Optional root marker
        if self.peek() == Some('$') {
            self.next();
        }

        loop {
            self.skip_whitespace();
            let at_start = segments.is_empty();
            match self.peek() {
                None => break,
                Some('.') => {
                    self.next();
                    segments.push(self.parse_dotted()?);
                }
                Some('[') => segments.push(self.parse_bracket_expression()?),
                Some('{') => segments.push(self.parse_brace_expression()?),
                // The first segment may omit its leading dot
                Some('*') if at_start => {
                    self.next();
                    segments.push(PathSegment::EachElement);
                }
                Some(ch) if at_start && is_identifier_char(ch) => {
                    segments.push(PathSegment::Field(self.parse_identifier()?));
                }
                Some(ch) => {
                    return Err(self.unexpected(self.position, ch, "'.', '[' or '{'"));
                }
            }
        }

        Ok(FieldSpec::new(segments))
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Returns the next character and advances position.
    fn next(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        Some(ch)
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.next();
            } else {
                break;
            }
        }
    }

    /// Expects a specific character and advances, or returns an error.
    fn expect(&mut self, expected: char) -> Result<()> {
        self.skip_whitespace();
        let pos = self.position;
        match self.next() {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => Err(self.unexpected(pos, ch, &format!("'{}'", expected))),
            None => Err(self.unexpected_end(&format!("'{}'", expected))),
        }
    }

    /// Parses what follows a dot: a name, `*` or `{*}`.
    fn parse_dotted(&mut self) -> Result<PathSegment> {
        match self.peek() {
            Some('*') => {
                self.next();
                Ok(PathSegment::EachElement)
            }
            Some('{') => self.parse_brace_expression(),
            Some(ch) if is_identifier_char(ch) => Ok(PathSegment::Field(self.parse_identifier()?)),
            Some(ch) => Err(self.unexpected(self.position, ch, "a field name, '*' or '{*}'")),
            None => Err(self.unexpected_end("a field name, '*' or '{*}'")),
        }
    }

    /// Parses an identifier (field name).
    fn parse_identifier(&mut self) -> Result<String> {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if is_identifier_char(ch) {
                name.push(ch);
                self.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            Err(self.invalid("expected identifier"))
        } else {
            Ok(name)
        }
    }

    /// Parses `[*]`, `[]`, `['name']` or `["name"]`.
    fn parse_bracket_expression(&mut self) -> Result<PathSegment> {
        self.expect('[')?;
        self.skip_whitespace();
        match self.peek() {
            Some(']') => {
                self.next();
                Ok(PathSegment::EachElement)
            }
            Some('*') => {
                self.next();
                self.expect(']')?;
                Ok(PathSegment::EachElement)
            }
            Some(quote @ ('\'' | '"')) => {
                self.next();
                let name = self.parse_quoted(quote)?;
                self.expect(']')?;
                Ok(PathSegment::Field(name))
            }
            Some(ch) => Err(self.unexpected(self.position, ch, "'*', ']' or a quoted field name")),
            None => Err(self.unexpected_end("'*', ']' or a quoted field name")),
        }
    }

    /// Parses `{*}`.
    fn parse_brace_expression(&mut self) -> Result<PathSegment> {
        self.expect('{')?;
        self.expect('*')?;
        self.expect('}')?;
        Ok(PathSegment::EachValue)
    }

    /// Parses the body of a quoted name; the opening quote is consumed.
    fn parse_quoted(&mut self, quote: char) -> Result<String> {
        let mut name = String::new();
        loop {
            match self.next() {
                Some('\\') => match self.next() {
                    Some(ch) => name.push(ch),
                    None => return Err(self.unexpected_end("an escaped character")),
                },
                Some(ch) if ch == quote => return Ok(name),
                Some(ch) => name.push(ch),
                None => return Err(self.unexpected_end(&format!("closing {}", quote))),
            }
        }
    }

    fn unexpected(&self, position: usize, found: char, expected: &str) -> Error {
        self.invalid(&format!(
            "unexpected '{}' at position {}, expected {}",
            found, position, expected
        ))
    }

    fn unexpected_end(&self, expected: &str) -> Error {
        self.invalid(&format!("unexpected end of input, expected {}", expected))
    }

    fn invalid(&self, message: &str) -> Error {
        Error::InvalidPathSpecification {
            path: self.source.clone(),
            message: message.to_string(),
        }
    }
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '-'
}
