//! Selector parser
//!
//! Parses `@e[...]`-style selector strings into a [`Selector`]: the symbol
//! plus a [`Query`] of every recognized argument.
//!
//! Parsing is total. Whatever cannot be understood is skipped, logged and
//! recorded in [`Selector::diagnostics`].

// Slices are taken at positions of ASCII delimiters found by `find`/`strip_*`.
#![allow(clippy::string_slice)]

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use hashbrown::HashSet;
use tracing::warn;

use crate::error::SelectorError;
use crate::item::parse_item_conditions;
use crate::query::{
    Coordinate, CountSelector, GameMode, OriginOverride, Query, ScoreFilter, SelectorSymbol,
    Vector3, parse_finite,
};
use crate::range::parse_range;
use crate::tokenizer::{Depth, quote_if_needed, split_arguments};

/// A parsed selector.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    symbol: SelectorSymbol,
    query: Query,
    diagnostics: Vec<SelectorError>,
}

impl Selector {
    /// Parse a selector string.
    ///
    /// Accepts `@x`, `@x[args]` and `[args]` (which means `@e[args]`). A string
    /// of any other shape becomes `@e` with no constraints.
    ///
    /// ```
    /// use entity_selector::{Selector, SelectorSymbol};
    ///
    /// let selector = Selector::parse("@a[tag=red,tag=!dead,c=2]");
    /// assert_eq!(selector.symbol(), SelectorSymbol::Player);
    /// assert!(selector.query().tags.contains("red"));
    /// assert!(selector.query().exclude_tags.contains("dead"));
    /// assert!(selector.diagnostics().is_empty());
    /// ```
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let mut parser = Parser::default();
        let symbol = match split_selector(input.trim()) {
            Ok((symbol, arguments)) => {
                for argument in split_arguments(arguments) {
                    parser.argument(argument);
                }
                symbol
            }
            Err(reason) => {
                parser.record(SelectorError::syntax(input, reason));
                SelectorSymbol::All
            }
        };

        Self {
            symbol,
            query: parser.query,
            diagnostics: parser.diagnostics,
        }
    }

    #[must_use]
    pub const fn symbol(&self) -> SelectorSymbol {
        self.symbol
    }

    #[must_use]
    pub const fn query(&self) -> &Query {
        &self.query
    }

    /// Recovered syntax and argument errors, in the order they were found.
    #[must_use]
    pub fn diagnostics(&self) -> &[SelectorError] {
        &self.diagnostics
    }
}

impl FromStr for Selector {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Split `@x[...]` into its symbol and the text between the brackets.
fn split_selector(input: &str) -> Result<(SelectorSymbol, &str), &'static str> {
    let (symbol, rest) = if let Some(rest) = input.strip_prefix('@') {
        let mut chars = rest.chars();
        let letter = chars.next().ok_or("missing selector symbol")?;
        let symbol = SelectorSymbol::from_char(letter).ok_or("unknown selector symbol")?;
        (symbol, chars.as_str())
    } else if input.starts_with('[') {
        (SelectorSymbol::All, input)
    } else {
        return Err("expected '@' or '['");
    };

    if rest.is_empty() {
        return Ok((symbol, ""));
    }

    let arguments = rest
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .ok_or("expected '[arguments]' after selector symbol")?;

    Ok((symbol, arguments))
}

/// Strip one leading `!`.
fn split_negation(value: &str) -> (bool, &str) {
    match value.strip_prefix('!') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, value),
    }
}

/// Remove surrounding double quotes and unescape `\"` and `\\`.
fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .filter(|_| value.len() >= 2)
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[derive(Default)]
struct Parser {
    query: Query,
    diagnostics: Vec<SelectorError>,
}

impl Parser {
    fn argument(&mut self, argument: &str) {
        let Some((key, value)) = argument.split_once('=') else {
            self.skip(argument, "missing '='");
            return;
        };
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() {
            self.skip(argument, "empty key");
            return;
        }

        if key == "hasitem" {
            match parse_item_conditions(value) {
                Ok(conditions) => self.query.has_item.extend(conditions),
                Err(error) => self.record(SelectorError::item_condition(argument, &error)),
            }
            return;
        }

        if let Err(reason) = self.apply(key, value) {
            self.skip(argument, reason);
        }
    }

    fn skip(&mut self, argument: &str, reason: impl Into<String>) {
        self.record(SelectorError::argument(argument, reason));
    }

    fn record(&mut self, error: SelectorError) {
        warn!("{}", error);
        self.diagnostics.push(error);
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), String> {
        let query = &mut self.query;
        match key {
            "type" => {
                let (negated, id) = split_negation(value);
                let id = non_empty(unquote(id))?;
                if negated {
                    query.exclude_types.insert(id);
                } else {
                    query.entity_type = Some(id);
                }
            }
            "name" => {
                let (negated, name) = split_negation(value);
                let name = unquote(name);
                if negated {
                    query.exclude_names.insert(name);
                } else {
                    query.name = Some(name);
                }
            }
            "tag" => {
                let (negated, tag) = split_negation(value);
                let tag = non_empty(unquote(tag))?;
                if negated {
                    query.exclude_tags.insert(tag);
                } else {
                    query.tags.insert(tag);
                }
            }
            "family" => {
                let (negated, family) = split_negation(value);
                let family = non_empty(unquote(family))?;
                if negated {
                    query.exclude_families.insert(family);
                } else {
                    query.families.insert(family);
                }
            }
            "m" => {
                let (negated, literal) = split_negation(value);
                let mode = GameMode::parse(&unquote(literal))
                    .ok_or_else(|| format!("unknown game mode '{literal}'"))?;
                if negated {
                    query.exclude_game_modes.insert(mode);
                } else {
                    query.game_mode = Some(mode);
                }
            }
            "l" => query.level.max = Some(parse_int(value)?),
            "lm" => query.level.min = Some(parse_int(value)?),
            "x" | "y" | "z" => {
                let coordinate = Coordinate::parse(&unquote(value))
                    .ok_or_else(|| format!("invalid coordinate '{value}'"))?;
                let origin = query.origin.get_or_insert_with(OriginOverride::default);
                match key {
                    "x" => origin.x = Some(coordinate),
                    "y" => origin.y = Some(coordinate),
                    _ => origin.z = Some(coordinate),
                }
            }
            "dx" | "dy" | "dz" => {
                let extent = parse_number(value)?;
                let volume = query.volume.get_or_insert(Vector3::ZERO);
                match key {
                    "dx" => volume.x = extent,
                    "dy" => volume.y = extent,
                    _ => volume.z = extent,
                }
            }
            "r" => query.distance.max = Some(parse_number(value)?),
            "rm" => query.distance.min = Some(parse_number(value)?),
            "c" => {
                let count: i32 = parse_int(value)?;
                query.count = CountSelector::from_signed(count);
            }
            "rx" => query.rotation.pitch.max = Some(parse_number(value)?),
            "rxm" => query.rotation.pitch.min = Some(parse_number(value)?),
            "ry" => query.rotation.yaw.max = Some(parse_number(value)?),
            "rym" => query.rotation.yaw.min = Some(parse_number(value)?),
            "scores" => self.scores(value)?,
            _ => return Err(format!("unknown key '{key}'")),
        }
        Ok(())
    }

    /// `{objective=range,...}`. Bad pairs are skipped one by one.
    fn scores(&mut self, value: &str) -> Result<(), String> {
        let body = value
            .strip_prefix('{')
            .and_then(|v| v.strip_suffix('}'))
            .ok_or("scores must be wrapped in '{}'")?;

        for pair in split_arguments(body) {
            match parse_score_filter(pair) {
                Ok(filter) => self.query.scores.push(filter),
                Err(reason) => self.skip(pair, reason),
            }
        }
        Ok(())
    }
}

fn parse_score_filter(pair: &str) -> Result<ScoreFilter, String> {
    let (objective, range) =
        split_key(pair).ok_or_else(|| "missing '=' in score".to_string())?;
    let objective = non_empty(unquote(objective.trim()))?;
    let (exclude, range_text) = split_negation(range.trim());
    let range =
        parse_range::<i64>(range_text).ok_or_else(|| format!("invalid score range '{range_text}'"))?;
    Ok(ScoreFilter {
        objective,
        range,
        exclude,
    })
}

/// Split at the first `=` outside a quoted key.
fn split_key(pair: &str) -> Option<(&str, &str)> {
    let mut depth = Depth::default();
    let (i, _) = pair
        .char_indices()
        .find(|&(_, c)| depth.feed(c) && c == '=')?;
    Some((&pair[..i], &pair[i + 1..]))
}

fn non_empty(value: String) -> Result<String, String> {
    if value.is_empty() {
        Err("empty value".to_string())
    } else {
        Ok(value)
    }
}

fn parse_int(value: &str) -> Result<i32, String> {
    unquote(value)
        .parse()
        .map_err(|_| format!("expected an integer, found '{value}'"))
}

fn parse_number(value: &str) -> Result<f64, String> {
    parse_finite(&unquote(value)).ok_or_else(|| format!("expected a number, found '{value}'"))
}

impl fmt::Display for Selector {
    /// Render the canonical selector string. Set-valued arguments are sorted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)?;

        let query = &self.query;
        let mut args: Vec<String> = Vec::new();

        if let Some(t) = &query.entity_type {
            args.push(format!("type={}", quote_if_needed(t)));
        }
        args.extend(
            sorted(&query.exclude_types)
                .into_iter()
                .map(|t| format!("type=!{}", quote_if_needed(t))),
        );
        if let Some(name) = &query.name {
            args.push(format!("name={}", quote_if_needed(name)));
        }
        args.extend(
            sorted(&query.exclude_names)
                .into_iter()
                .map(|n| format!("name=!{}", quote_if_needed(n))),
        );
        args.extend(
            sorted(&query.tags)
                .into_iter()
                .map(|t| format!("tag={}", quote_if_needed(t))),
        );
        args.extend(
            sorted(&query.exclude_tags)
                .into_iter()
                .map(|t| format!("tag=!{}", quote_if_needed(t))),
        );
        args.extend(
            sorted(&query.families)
                .into_iter()
                .map(|t| format!("family={}", quote_if_needed(t))),
        );
        args.extend(
            sorted(&query.exclude_families)
                .into_iter()
                .map(|t| format!("family=!{}", quote_if_needed(t))),
        );
        if let Some(mode) = query.game_mode {
            args.push(format!("m={}", mode.as_str()));
        }
        let mut excluded_modes: Vec<&str> =
            query.exclude_game_modes.iter().map(|m| m.as_str()).collect();
        excluded_modes.sort_unstable();
        args.extend(excluded_modes.into_iter().map(|m| format!("m=!{m}")));
        if let Some(l) = query.level.max {
            args.push(format!("l={l}"));
        }
        if let Some(lm) = query.level.min {
            args.push(format!("lm={lm}"));
        }
        if let Some(origin) = &query.origin {
            for (key, axis) in [("x", origin.x), ("y", origin.y), ("z", origin.z)] {
                if let Some(axis) = axis {
                    args.push(format!("{key}={axis}"));
                }
            }
        }
        if let Some(volume) = &query.volume {
            args.push(format!("dx={}", volume.x));
            args.push(format!("dy={}", volume.y));
            args.push(format!("dz={}", volume.z));
        }
        if let Some(r) = query.distance.max {
            args.push(format!("r={r}"));
        }
        if let Some(rm) = query.distance.min {
            args.push(format!("rm={rm}"));
        }
        if let Some(count) = query.count {
            args.push(format!("c={}", count.signed()));
        }
        for (key, bound) in [
            ("rx", query.rotation.pitch.max),
            ("rxm", query.rotation.pitch.min),
            ("ry", query.rotation.yaw.max),
            ("rym", query.rotation.yaw.min),
        ] {
            if let Some(bound) = bound {
                args.push(format!("{key}={bound}"));
            }
        }
        if !query.scores.is_empty() {
            let scores: Vec<String> = query.scores.iter().map(ToString::to_string).collect();
            args.push(format!("scores={{{}}}", scores.join(",")));
        }
        if !query.has_item.is_empty() {
            let items: Vec<String> = query.has_item.iter().map(ToString::to_string).collect();
            args.push(format!("hasitem=[{}]", items.join(",")));
        }

        if !args.is_empty() {
            write!(f, "[{}]", args.join(","))?;
        }
        Ok(())
    }
}

fn sorted(set: &HashSet<String>) -> Vec<&String> {
    let mut items: Vec<&String> = set.iter().collect();
    items.sort();
    items
}
