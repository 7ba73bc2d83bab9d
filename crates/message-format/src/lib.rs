//! Message Format
//!
//! Renders raw-text message trees (the JSON used by `tellraw` and friends) to
//! plain strings, resolving `selector` and `score` components through
//! [`entity_selector`].
//!
//! # Components
//!
//! ```text
//! "plain"                                        // a bare string
//! [a, b, c]                                      // concatenation
//! {"text": "hello"}                              // literal text
//! {"rawtext": [a, b]}                            // concatenation
//! {"translate": "%s joined", "with": ["Steve"]}  // placeholder substitution
//! {"selector": "@a[tag=red]"}                    // matched names, ", "-joined
//! {"score": {"name": "@p", "objective": "kills"}}
//! {"text": "a", "extra": [b, c]}                 // children appended
//! ```
//!
//! Formatting never fails. A component that cannot be resolved renders as
//! nothing and the reason is logged.
//!
//! # Examples
//!
//! ```
//! use entity_selector::ExecutionContext;
//! use entity_selector::memory::{MemoryEntity, MemoryWorld};
//! use message_format::format_message;
//! use serde_json::json;
//!
//! let mut world = MemoryWorld::new();
//! world.spawn(MemoryEntity::player("Steve").with_tag("red"));
//! world.spawn(MemoryEntity::player("Alex").with_tag("red"));
//!
//! let mut ctx = ExecutionContext::new(&world);
//! let message = json!({"rawtext": [{"text": "Red team: "}, {"selector": "@a[tag=red]"}]});
//! assert_eq!(format_message(&message, &mut ctx), "Red team: Steve, Alex");
//! ```

use entity_selector::{
    ExecutionContext, ScoreboardIdentity, Selector, SelectorEntity, SelectorError, WorldServices,
};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Why a component rendered as nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error("{component} component is missing string field {field:?}")]
    MissingField {
        component: &'static str,
        field: &'static str,
    },

    #[error("selector {0:?} matched nothing")]
    NoMatch(String),

    #[error("{0:?} has no scoreboard identity")]
    NoIdentity(String),

    #[error("score name '*' needs an executing entity")]
    NoExecutor,

    #[error("unknown scoreboard participant {0:?}")]
    UnknownParticipant(String),

    #[error("unknown objective {0:?}")]
    UnknownObjective(String),

    #[error("{name:?} has no score for {objective:?}")]
    NoScore { name: String, objective: String },

    #[error("unrecognized message component {0}")]
    Unrecognized(String),
}

/// Render a message tree to a string.
pub fn format_message<W: WorldServices>(
    message: &Value,
    ctx: &mut ExecutionContext<'_, W>,
) -> String {
    let mut out = String::new();
    render(message, ctx, &mut out);
    out
}

fn render<W: WorldServices>(value: &Value, ctx: &mut ExecutionContext<'_, W>, out: &mut String) {
    match value {
        Value::Null => {}
        Value::String(text) => out.push_str(text),
        Value::Bool(_) | Value::Number(_) => out.push_str(&value.to_string()),
        Value::Array(items) => {
            for item in items {
                render(item, ctx, out);
            }
        }
        Value::Object(component) => {
            match render_component(component, ctx) {
                Ok(text) => out.push_str(&text),
                Err(error) => debug!("dropping message component: {}", error),
            }
            if let Some(extra) = component.get("extra") {
                render(extra, ctx, out);
            }
        }
    }
}

/// Render the content of one object component, excluding `extra`.
fn render_component<W: WorldServices>(
    component: &Map<String, Value>,
    ctx: &mut ExecutionContext<'_, W>,
) -> Result<String, FormatError> {
    if let Some(text) = component.get("text") {
        return Ok(format_message(text, ctx));
    }
    if let Some(rawtext) = component.get("rawtext") {
        return Ok(format_message(rawtext, ctx));
    }
    if let Some(key) = component.get("translate") {
        let key = key.as_str().ok_or(FormatError::MissingField {
            component: "translate",
            field: "translate",
        })?;
        let args = translation_args(component.get("with"), ctx);
        return Ok(substitute(key, &args));
    }
    if let Some(selector) = component.get("selector") {
        let selector = selector.as_str().ok_or(FormatError::MissingField {
            component: "selector",
            field: "selector",
        })?;
        return render_selector(selector, ctx);
    }
    if let Some(score) = component.get("score") {
        let field = |field: &'static str| {
            score
                .get(field)
                .and_then(Value::as_str)
                .ok_or(FormatError::MissingField {
                    component: "score",
                    field,
                })
        };
        let name = field("name")?;
        let objective = field("objective")?;
        return resolve_score(name, objective, ctx).map(|score| score.to_string());
    }
    if component.contains_key("extra") {
        return Ok(String::new());
    }

    Err(FormatError::Unrecognized(Value::Object(component.clone()).to_string()))
}

/// `with` is either an array of components or `{"rawtext": [...]}`. Each
/// member renders to one argument.
fn translation_args<W: WorldServices>(
    with: Option<&Value>,
    ctx: &mut ExecutionContext<'_, W>,
) -> Vec<String> {
    let members: &[Value] = match with {
        Some(Value::Array(items)) => items.as_slice(),
        Some(Value::Object(object)) => match object.get("rawtext") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };
    members.iter().map(|m| format_message(m, ctx)).collect()
}

/// Fill `%s` (sequential) and `%N$s` (1-based positional) placeholders.
///
/// `%%` is a literal percent sign. Placeholders without an argument render as
/// nothing; anything else after `%` is copied through.
///
/// ```
/// use message_format::substitute;
///
/// let args = ["Steve".to_string(), "Alex".to_string()];
/// assert_eq!(substitute("%2$s hit %1$s", &args), "Alex hit Steve");
/// assert_eq!(substitute("%s and %s: 100%%", &args), "Steve and Alex: 100%");
/// ```
#[must_use]
pub fn substitute(template: &str, args: &[String]) -> String {
    let arg = |index: usize| args.get(index).map_or("", String::as_str);
    let mut out = String::with_capacity(template.len());
    let mut next = 0;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some('s') => {
                chars.next();
                out.push_str(arg(next));
                next += 1;
            }
            Some(d) if d.is_ascii_digit() => {
                let mut lookahead = chars.clone();
                let mut position = 0usize;
                while let Some(digit) = lookahead.peek().and_then(|d| d.to_digit(10)) {
                    position = position.saturating_mul(10).saturating_add(digit as usize);
                    lookahead.next();
                }
                if lookahead.next() == Some('$') && lookahead.next() == Some('s') && position > 0 {
                    out.push_str(arg(position - 1));
                    chars = lookahead;
                } else {
                    out.push('%');
                }
            }
            _ => out.push('%'),
        }
    }
    out
}

fn render_selector<W: WorldServices>(
    selector: &str,
    ctx: &mut ExecutionContext<'_, W>,
) -> Result<String, FormatError> {
    let matched = Selector::parse(selector).resolve(ctx)?;
    let names: Vec<&str> = matched.iter().map(display_name).collect();
    Ok(names.join(", "))
}

/// Entities without a name show their type id.
fn display_name<E: SelectorEntity>(entity: &E) -> &str {
    match entity.name() {
        "" => entity.entity_type(),
        name => name,
    }
}

/// Look up a score for a `score` component.
///
/// `name` is a selector (`@p`, first match wins), `*` (the executor) or a
/// participant name, which may be a fake player.
///
/// # Errors
///
/// Returns a [`FormatError`] naming the first lookup that failed.
pub fn resolve_score<W: WorldServices>(
    name: &str,
    objective: &str,
    ctx: &mut ExecutionContext<'_, W>,
) -> Result<i64, FormatError> {
    let identity = score_holder(name, ctx)?;
    let scoreboard = ctx.world().scoreboard();
    let board = scoreboard
        .objective(objective)
        .ok_or_else(|| FormatError::UnknownObjective(objective.to_string()))?;
    board.score(identity).ok_or_else(|| FormatError::NoScore {
        name: name.to_string(),
        objective: objective.to_string(),
    })
}

fn score_holder<W: WorldServices>(
    name: &str,
    ctx: &mut ExecutionContext<'_, W>,
) -> Result<ScoreboardIdentity, FormatError> {
    if name == "*" {
        let executor = ctx.executor().ok_or(FormatError::NoExecutor)?;
        return executor
            .scoreboard_identity()
            .ok_or_else(|| FormatError::NoIdentity(display_name(executor).to_string()));
    }

    if name.starts_with('@') {
        let matched = Selector::parse(name).resolve(ctx)?;
        let first = matched
            .first()
            .ok_or_else(|| FormatError::NoMatch(name.to_string()))?;
        return first
            .scoreboard_identity()
            .ok_or_else(|| FormatError::NoIdentity(display_name(first).to_string()));
    }

    ctx.world()
        .scoreboard()
        .participant(name)
        .ok_or_else(|| FormatError::UnknownParticipant(name.to_string()))
}

#[cfg(test)]
mod tests {
    use entity_selector::memory::{MemoryEntity, MemoryWorld};
    use entity_selector::{ExecutionContext, Vector3};
    use serde_json::json;

    use super::*;

    fn world() -> MemoryWorld {
        let mut world = MemoryWorld::new();
        let steve = world.add_participant("Steve");
        let alex = world.add_participant("Alex");
        let fake = world.add_participant("#global");
        world.set_score("kills", steve, 7);
        world.set_score("kills", alex, 2);
        world.set_score("round", fake, 3);
        world.spawn(MemoryEntity::player("Steve").with_identity(steve).at(1.0, 0.0, 0.0));
        world.spawn(MemoryEntity::player("Alex").with_identity(alex).at(9.0, 0.0, 0.0));
        world.spawn(MemoryEntity::new("minecraft:pig").at(2.0, 0.0, 0.0));
        world
    }

    #[test]
    fn test_plain_and_nested_text() {
        let world = world();
        let mut ctx = ExecutionContext::new(&world);
        assert_eq!(format_message(&json!("hi"), &mut ctx), "hi");
        assert_eq!(
            format_message(&json!(["a", {"text": "b"}, {"rawtext": ["c", {"text": "d"}]}]), &mut ctx),
            "abcd"
        );
        assert_eq!(
            format_message(&json!({"text": "a", "extra": ["b", {"text": "c"}]}), &mut ctx),
            "abc"
        );
    }

    #[test]
    fn test_selector_component() {
        let world = world();
        let mut ctx = ExecutionContext::new(&world);
        assert_eq!(
            format_message(&json!({"selector": "@a"}), &mut ctx),
            "Steve, Alex"
        );
        assert_eq!(
            format_message(&json!({"selector": "@e[type=pig]"}), &mut ctx),
            "minecraft:pig"
        );
        assert_eq!(format_message(&json!({"selector": "@a[tag=none]"}), &mut ctx), "");
        assert_eq!(format_message(&json!({"selector": "@s"}), &mut ctx), "");
    }

    #[test]
    fn test_score_component() {
        let world = world();
        let mut ctx = ExecutionContext::new(&world).at(Vector3::new(8.0, 0.0, 0.0));
        let score = |name: &str, objective: &str| json!({"score": {"name": name, "objective": objective}});

        assert_eq!(format_message(&score("@p", "kills"), &mut ctx), "2");
        assert_eq!(format_message(&score("Steve", "kills"), &mut ctx), "7");
        assert_eq!(format_message(&score("#global", "round"), &mut ctx), "3");
        assert_eq!(format_message(&score("Nobody", "kills"), &mut ctx), "");
        assert_eq!(format_message(&score("Steve", "missing"), &mut ctx), "");
        assert_eq!(format_message(&score("*", "kills"), &mut ctx), "");
    }

    #[test]
    fn test_score_of_executor() {
        let world = world();
        let steve = world.entities()[0].clone();
        let mut ctx = ExecutionContext::new(&world).executed_by(steve);
        assert_eq!(resolve_score("*", "kills", &mut ctx), Ok(7));
        assert_eq!(
            resolve_score("*", "round", &mut ctx),
            Err(FormatError::NoScore {
                name: "*".to_string(),
                objective: "round".to_string()
            })
        );
    }

    #[test]
    fn test_translate() {
        let world = world();
        let mut ctx = ExecutionContext::new(&world);
        let message = json!({
            "translate": "%s has %s kills",
            "with": {"rawtext": [{"selector": "@a[name=Steve]"}, {"score": {"name": "Steve", "objective": "kills"}}]}
        });
        assert_eq!(format_message(&message, &mut ctx), "Steve has 7 kills");

        let message = json!({"translate": "%2$s before %1$s", "with": ["a", "b"]});
        assert_eq!(format_message(&message, &mut ctx), "b before a");
    }

    #[test]
    fn test_substitute_edge_cases() {
        let args = vec!["x".to_string()];
        assert_eq!(substitute("%s %s", &args), "x ");
        assert_eq!(substitute("%0$s|%9$s", &args), "%0$s|");
        assert_eq!(substitute("50% off", &args), "50% off");
        assert_eq!(substitute("trailing %", &args), "trailing %");
    }

    #[test]
    fn test_unrecognized_component_is_empty() {
        let world = world();
        let mut ctx = ExecutionContext::new(&world);
        assert_eq!(format_message(&json!({"color": "red"}), &mut ctx), "");
        assert_eq!(format_message(&json!({"score": {"name": "Steve"}}), &mut ctx), "");
    }
}
