//! `hasitem` condition parser.
//!
//! The value of a `hasitem` argument is a single object or an array of
//! objects written in a relaxed syntax:
//!
//! ```text
//! {item=minecraft:torch,quantity=1..,location=slot.hotbar,slot=0..8}
//! [{item=minecraft:bow},{item="minecraft:arrow",quantity=16..}]
//! ```
//!
//! Keys are bare or quoted, values are numbers, booleans, quoted strings or
//! barewords. The input is lexed into a private token stream, parsed into
//! records of normalized values, then each record is decoded into an
//! [`ItemCondition`].

// Slices are taken between positions produced by `char_indices`.
#![allow(clippy::string_slice)]

use std::fmt;

use thiserror::Error;
use tracing::warn;

use crate::range::{Range, parse_range};
use crate::tokenizer::quote_if_needed;

/// One `hasitem` requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCondition {
    /// Item id (`minecraft:torch`) or item tag (`logs`).
    pub item: Option<String>,
    /// Required stack size. Defaults to `1..`.
    pub quantity: Range<i32>,
    /// Required durability damage. `None` or `-1` matches anything.
    pub data: Option<i32>,
    /// Symbolic slot group such as `slot.hotbar` or `slot.armor.head`.
    pub location: Option<String>,
    /// Allowed slot indices.
    pub slot: Option<Range<i32>>,
}

impl Default for ItemCondition {
    fn default() -> Self {
        Self {
            item: None,
            quantity: Range::at_least(1),
            data: None,
            location: None,
            slot: None,
        }
    }
}

impl fmt::Display for ItemCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields = Vec::new();
        if let Some(item) = &self.item {
            fields.push(format!("item={}", quote_if_needed(item)));
        }
        fields.push(format!("quantity={}", self.quantity));
        if let Some(data) = self.data {
            fields.push(format!("data={data}"));
        }
        if let Some(location) = &self.location {
            fields.push(format!("location={}", quote_if_needed(location)));
        }
        if let Some(slot) = &self.slot {
            fields.push(format!("slot={slot}"));
        }
        write!(f, "{{{}}}", fields.join(","))
    }
}

/// Item condition parse or decode error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("item condition error at position {position}: {message}")]
pub struct ItemConditionError {
    pub message: String,
    pub position: usize,
}

impl ItemConditionError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Parse a `hasitem` value into its conditions.
///
/// Any lexing, structural or decoding failure rejects the whole value.
///
/// # Errors
///
/// Returns `ItemConditionError` for mismatched delimiters, unterminated
/// strings, missing `=` and values of the wrong kind for a known field.
///
/// ```
/// use entity_selector::parse_item_conditions;
///
/// let conditions = parse_item_conditions("[{item=minecraft:torch,quantity=2..},{item=logs}]").unwrap();
/// assert_eq!(conditions.len(), 2);
/// assert_eq!(conditions[0].quantity.min, Some(2));
/// assert_eq!(conditions[1].quantity.min, Some(1));
/// ```
pub fn parse_item_conditions(input: &str) -> Result<Vec<ItemCondition>, ItemConditionError> {
    let tokens = lex(input)?;
    let records = Parser::new(&tokens, input.len()).parse()?;
    records.iter().map(decode).collect()
}

// ==================== Tokens ====================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Assign,
    Quoted(String),
    Bare(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LBrace => write!(f, "'{{'"),
            Self::RBrace => write!(f, "'}}'"),
            Self::LBracket => write!(f, "'['"),
            Self::RBracket => write!(f, "']'"),
            Self::Comma => write!(f, "','"),
            Self::Assign => write!(f, "'='"),
            Self::Quoted(s) => write!(f, "\"{s}\""),
            Self::Bare(s) => write!(f, "{s}"),
        }
    }
}

type Spanned = (Token, usize);

fn is_delimiter(c: char) -> bool {
    matches!(c, '{' | '}' | '[' | ']' | ',' | '=' | '"') || c.is_whitespace()
}

fn lex(input: &str) -> Result<Vec<Spanned>, ItemConditionError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        let single = match c {
            '{' => Some(Token::LBrace),
            '}' => Some(Token::RBrace),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            ',' => Some(Token::Comma),
            '=' => Some(Token::Assign),
            _ => None,
        };

        if let Some(token) = single {
            chars.next();
            tokens.push((token, pos));
        } else if c.is_whitespace() {
            chars.next();
        } else if c == '"' {
            chars.next();
            let mut value = String::new();
            let mut closed = false;
            while let Some((_, c)) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => {
                        if let Some((_, escaped)) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    _ => value.push(c),
                }
            }
            if !closed {
                return Err(ItemConditionError::new("unterminated string", pos));
            }
            tokens.push((Token::Quoted(value), pos));
        } else {
            let mut end = input.len();
            while let Some(&(i, c)) = chars.peek() {
                if is_delimiter(c) {
                    end = i;
                    break;
                }
                chars.next();
            }
            tokens.push((Token::Bare(input[pos..end].to_string()), pos));
        }
    }

    Ok(tokens)
}

// ==================== Records ====================

/// A normalized value inside an item object.
#[derive(Debug, Clone, PartialEq)]
enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Object(Record),
    List(Vec<Value>),
}

impl Value {
    /// Classify a bareword: numeric and boolean literals keep their kind,
    /// everything else becomes a string.
    fn from_bare(word: &str) -> Self {
        match word {
            "true" => return Self::Bool(true),
            "false" => return Self::Bool(false),
            _ => {}
        }
        if let Ok(int) = word.parse::<i64>() {
            return Self::Int(int);
        }
        match word.parse::<f64>() {
            Ok(float) if float.is_finite() => Self::Float(float),
            _ => Self::Str(word.to_string()),
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Float(_) => "number",
            Self::Bool(_) => "boolean",
            Self::Str(_) => "string",
            Self::Object(_) => "object",
            Self::List(_) => "array",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Record {
    fields: Vec<(String, Value)>,
    position: usize,
}

/// Deepest nesting of objects and lists accepted inside a field value.
const MAX_DEPTH: usize = 32;

struct Parser<'t> {
    tokens: &'t [Spanned],
    pos: usize,
    end: usize,
    depth: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Spanned], end: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            end,
            depth: 0,
        }
    }

    fn parse(&mut self) -> Result<Vec<Record>, ItemConditionError> {
        let records = match self.peek() {
            Some(Token::LBracket) => self.parse_array()?,
            Some(Token::LBrace) => vec![self.parse_object()?],
            Some(other) => {
                return Err(self.error(format!("expected '{{' or '[', found {other}")));
            }
            None => return Err(self.error("empty item condition")),
        };

        if let Some(token) = self.peek() {
            return Err(self.error(format!("unexpected {token} after item condition")));
        }

        Ok(records)
    }

    fn parse_array(&mut self) -> Result<Vec<Record>, ItemConditionError> {
        self.expect(&Token::LBracket)?;
        let mut records = Vec::new();

        if self.peek() == Some(&Token::RBracket) {
            self.advance();
            return Ok(records);
        }

        loop {
            records.push(self.parse_object()?);
            match self.next() {
                Some(Token::Comma) => {}
                Some(Token::RBracket) => return Ok(records),
                _ => return Err(self.error_prev("expected ',' or ']' in item array")),
            }
        }
    }

    fn parse_object(&mut self) -> Result<Record, ItemConditionError> {
        let position = self.position();
        self.expect(&Token::LBrace)?;
        let mut record = Record {
            fields: Vec::new(),
            position,
        };

        if self.peek() == Some(&Token::RBrace) {
            self.advance();
            return Ok(record);
        }

        loop {
            let key = match self.next() {
                Some(Token::Bare(key) | Token::Quoted(key)) => key.clone(),
                _ => return Err(self.error_prev("expected key")),
            };
            self.expect(&Token::Assign)?;
            let value = self.parse_value()?;
            record.fields.push((key, value));

            match self.next() {
                Some(Token::Comma) => {}
                Some(Token::RBrace) => return Ok(record),
                _ => return Err(self.error_prev("expected ',' or '}' in item object")),
            }
        }
    }

    fn parse_value(&mut self) -> Result<Value, ItemConditionError> {
        match self.peek() {
            Some(Token::LBrace) => self.nested(Self::parse_object).map(Value::Object),
            Some(Token::LBracket) => self.nested(Self::parse_list),
            Some(Token::Quoted(s)) => {
                let value = Value::Str(s.clone());
                self.advance();
                Ok(value)
            }
            Some(Token::Bare(word)) => {
                let value = Value::from_bare(word);
                self.advance();
                Ok(value)
            }
            _ => Err(self.error("expected value")),
        }
    }

    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ItemConditionError>,
    ) -> Result<T, ItemConditionError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn parse_list(&mut self) -> Result<Value, ItemConditionError> {
        self.expect(&Token::LBracket)?;
        let mut values = Vec::new();

        if self.peek() == Some(&Token::RBracket) {
            self.advance();
            return Ok(Value::List(values));
        }

        loop {
            values.push(self.parse_value()?);
            match self.next() {
                Some(Token::Comma) => {}
                Some(Token::RBracket) => return Ok(Value::List(values)),
                _ => return Err(self.error_prev("expected ',' or ']' in list")),
            }
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ItemConditionError> {
        match self.peek() {
            Some(token) if token == expected => {
                self.advance();
                Ok(())
            }
            Some(token) => Err(self.error(format!("expected {expected}, found {token}"))),
            None => Err(self.error(format!("expected {expected}, found end of input"))),
        }
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn next(&mut self) -> Option<&'t Token> {
        let token = self.peek();
        self.advance();
        token
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(_, pos)| *pos)
    }

    fn error(&self, message: impl Into<String>) -> ItemConditionError {
        ItemConditionError::new(message, self.position())
    }

    /// Error pointing at the token just consumed.
    fn error_prev(&self, message: impl Into<String>) -> ItemConditionError {
        let position = self
            .pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(self.end, |(_, pos)| *pos);
        ItemConditionError::new(message, position)
    }
}

// ==================== Decoding ====================

fn decode(record: &Record) -> Result<ItemCondition, ItemConditionError> {
    let mut condition = ItemCondition::default();
    let mismatch = |key: &str, value: &Value| {
        ItemConditionError::new(
            format!("field '{key}' cannot be {}", value.kind()),
            record.position,
        )
    };

    for (key, value) in &record.fields {
        let key = key.as_str();
        match key {
            "item" => match value {
                Value::Str(item) => condition.item = Some(item.clone()),
                other => return Err(mismatch(key, other)),
            },
            "quantity" => {
                if let Some(range) = decode_range(value).map_err(|v| mismatch(key, v))? {
                    condition.quantity = range;
                }
            }
            "data" => match value {
                Value::Int(data) => {
                    let data = i32::try_from(*data).map_err(|_| mismatch(key, value))?;
                    condition.data = Some(data);
                }
                other => return Err(mismatch(key, other)),
            },
            "location" => match value {
                Value::Str(location) => condition.location = Some(location.clone()),
                other => return Err(mismatch(key, other)),
            },
            "slot" => {
                if let Some(range) = decode_range(value).map_err(|v| mismatch(key, v))? {
                    condition.slot = Some(range);
                }
            }
            unknown => warn!("ignoring unknown hasitem field '{}'", unknown),
        }
    }

    Ok(condition)
}

/// Integers are exact ranges, strings go through the range grammar. A string
/// outside the grammar leaves the field unset.
fn decode_range(value: &Value) -> Result<Option<Range<i32>>, &Value> {
    match value {
        Value::Int(int) => i32::try_from(*int).map(|v| Some(Range::exact(v))).map_err(|_| value),
        Value::Str(text) => Ok(parse_range(text)),
        other => Err(other),
    }
}
