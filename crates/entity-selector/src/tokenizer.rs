//! Depth-aware argument splitting.
//!
//! Selector arguments may carry nested `{}` / `[]` values (`scores`, `hasitem`),
//! so a plain `split(',')` would cut them apart. The splitter only breaks on
//! commas at depth zero and never fails: unbalanced input is handed on as-is
//! and rejected token by token further down.

// Split points come from `char_indices`, so every slice lands on a char boundary.
#![allow(clippy::string_slice)]

/// Split `input` on commas outside of `{}`, `[]` and double-quoted strings.
///
/// Tokens are trimmed and empty tokens are dropped.
///
/// ```
/// use entity_selector::split_arguments;
///
/// let parts = split_arguments("type=pig, scores={a=1,b=2..}, hasitem=[{item=x},{item=y}]");
/// assert_eq!(parts, ["type=pig", "scores={a=1,b=2..}", "hasitem=[{item=x},{item=y}]"]);
/// ```
pub fn split_arguments(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = Depth::default();
    let mut start = 0;

    for (i, c) in input.char_indices() {
        if depth.feed(c) && c == ',' {
            push_token(&mut parts, &input[start..i]);
            start = i + c.len_utf8();
        }
    }
    push_token(&mut parts, &input[start..]);

    parts
}

fn push_token<'a>(parts: &mut Vec<&'a str>, token: &'a str) {
    let token = token.trim();
    if !token.is_empty() {
        parts.push(token);
    }
}

/// Render `value` so that it reads back as the same string.
///
/// Values are quoted when they hold whitespace, a delimiter or a quote, start
/// with `!`, are empty, or would otherwise read back as a number or boolean
/// inside a `hasitem` object.
pub(crate) fn quote_if_needed(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value.starts_with('!')
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ',' | '"' | '[' | ']' | '{' | '}' | '='))
        || matches!(value, "true" | "false")
        || value.parse::<f64>().is_ok();

    if needs_quotes {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// Running nesting state for a left-to-right scan.
///
/// Braces and brackets keep independent counters. Counters may go negative on
/// stray closers; a negative counter is "not at top level" just like a
/// positive one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Depth {
    braces: i32,
    brackets: i32,
    in_quotes: bool,
    escaped: bool,
}

impl Depth {
    /// Consume one character. Returns `true` when `c` sits at top level.
    pub(crate) fn feed(&mut self, c: char) -> bool {
        if self.in_quotes {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == '"' {
                self.in_quotes = false;
            }
            return false;
        }

        let top_level = self.is_top_level();
        match c {
            '"' => self.in_quotes = true,
            '{' => self.braces += 1,
            '}' => self.braces -= 1,
            '[' => self.brackets += 1,
            ']' => self.brackets -= 1,
            _ => {}
        }
        top_level
    }

    /// Whether the scan is currently outside every delimiter pair.
    pub(crate) const fn is_top_level(&self) -> bool {
        self.braces == 0 && self.brackets == 0 && !self.in_quotes
    }
}
