//! The parsed, engine-agnostic form of a selector.

use std::fmt;

use hashbrown::HashSet;

use crate::item::ItemCondition;
use crate::range::Range;
use crate::tokenizer::quote_if_needed;

/// The `@x` prefix of a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SelectorSymbol {
    /// `@e` - every entity.
    #[default]
    All,
    /// `@a` - every player.
    Player,
    /// `@p` - the nearest player.
    NearestPlayer,
    /// `@r` - a random player.
    RandomPlayer,
    /// `@s` - the executing entity.
    Executor,
}

impl SelectorSymbol {
    /// Look up a symbol by its letter.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'e' => Some(Self::All),
            'a' => Some(Self::Player),
            'p' => Some(Self::NearestPlayer),
            'r' => Some(Self::RandomPlayer),
            's' => Some(Self::Executor),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::All => 'e',
            Self::Player => 'a',
            Self::NearestPlayer => 'p',
            Self::RandomPlayer => 'r',
            Self::Executor => 's',
        }
    }
}

impl fmt::Display for SelectorSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.as_char())
    }
}

/// A point or extent in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl std::ops::Add for Vector3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

/// Head rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotation {
    pub pitch: f64,
    pub yaw: f64,
}

impl Rotation {
    #[must_use]
    pub const fn new(pitch: f64, yaw: f64) -> Self {
        Self { pitch, yaw }
    }
}

/// Player game mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameMode {
    Survival,
    Creative,
    Adventure,
    Spectator,
}

impl GameMode {
    /// Parse a game mode literal: full name, short alias or numeric id.
    #[must_use]
    pub fn parse(literal: &str) -> Option<Self> {
        match literal.to_ascii_lowercase().as_str() {
            "survival" | "s" | "0" => Some(Self::Survival),
            "creative" | "c" | "1" => Some(Self::Creative),
            "adventure" | "a" | "2" => Some(Self::Adventure),
            "spectator" | "sp" | "6" => Some(Self::Spectator),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Survival => "survival",
            Self::Creative => "creative",
            Self::Adventure => "adventure",
            Self::Spectator => "spectator",
        }
    }
}

/// One axis of an `x`/`y`/`z` argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coordinate {
    /// `x=12.5`
    Absolute(f64),
    /// `x=~` or `x=~-3`, offset from the context origin.
    Relative(f64),
}

impl Coordinate {
    /// Parse `12`, `~` or `~-3`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.strip_prefix('~') {
            Some("") => Some(Self::Relative(0.0)),
            Some(offset) => parse_finite(offset).map(Self::Relative),
            None => parse_finite(text).map(Self::Absolute),
        }
    }

    #[must_use]
    pub fn resolve(self, base: f64) -> f64 {
        match self {
            Self::Absolute(value) => value,
            Self::Relative(offset) => base + offset,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(value) => write!(f, "{value}"),
            Self::Relative(offset) if *offset == 0.0 => write!(f, "~"),
            Self::Relative(offset) => write!(f, "~{offset}"),
        }
    }
}

pub(crate) fn parse_finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Per-axis origin overrides from `x`, `y` and `z`.
///
/// Unset axes inherit the execution context's location, so the same query
/// can be evaluated from different places.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OriginOverride {
    pub x: Option<Coordinate>,
    pub y: Option<Coordinate>,
    pub z: Option<Coordinate>,
}

impl OriginOverride {
    #[must_use]
    pub fn resolve(&self, base: Vector3) -> Vector3 {
        let axis = |coord: Option<Coordinate>, base: f64| coord.map_or(base, |c| c.resolve(base));
        Vector3::new(
            axis(self.x, base.x),
            axis(self.y, base.y),
            axis(self.z, base.z),
        )
    }
}

/// Result limiting derived from the signed `c` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountSelector {
    /// `c=N`: the N nearest matches.
    Closest(u32),
    /// `c=-N`: the N farthest matches.
    Farthest(u32),
}

impl CountSelector {
    /// Convert a signed count. Zero selects nothing and yields `None`.
    #[must_use]
    pub fn from_signed(count: i32) -> Option<Self> {
        match count {
            0 => None,
            n if n > 0 => Some(Self::Closest(n.unsigned_abs())),
            n => Some(Self::Farthest(n.unsigned_abs())),
        }
    }

    #[must_use]
    pub const fn magnitude(self) -> u32 {
        match self {
            Self::Closest(n) | Self::Farthest(n) => n,
        }
    }

    #[must_use]
    pub fn signed(self) -> i64 {
        match self {
            Self::Closest(n) => i64::from(n),
            Self::Farthest(n) => -i64::from(n),
        }
    }
}

/// A `scores={objective=range}` requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreFilter {
    pub objective: String,
    pub range: Range<i64>,
    /// `objective=!range`: the score must fall outside the range.
    pub exclude: bool,
}

impl ScoreFilter {
    /// Check a participant's score against this filter.
    #[must_use]
    pub fn accepts(&self, score: i64) -> bool {
        self.range.contains(score) != self.exclude
    }
}

impl fmt::Display for ScoreFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bang = if self.exclude { "!" } else { "" };
        write!(f, "{}={}{}", quote_if_needed(&self.objective), bang, self.range)
    }
}

/// Pitch and yaw bounds from `rx`/`rxm`/`ry`/`rym`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationRange {
    pub pitch: Range<f64>,
    pub yaw: Range<f64>,
}

impl RotationRange {
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.pitch.is_unbounded() && self.yaw.is_unbounded()
    }

    /// Bounds are compared literally against the entity's pitch and yaw.
    /// Yaw does not wrap, so a window such as `rym=170,ry=-170` is empty.
    #[must_use]
    pub fn contains(&self, rotation: Rotation) -> bool {
        self.pitch.contains(rotation.pitch) && self.yaw.contains(rotation.yaw)
    }
}

/// Every constraint a selector string can express.
///
/// Built once by the parser and read-only afterwards. The evaluator clones it
/// to apply per-symbol defaults.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    /// `type=id`. Later occurrences overwrite earlier ones.
    pub entity_type: Option<String>,
    /// `type=!id`, accumulated.
    pub exclude_types: HashSet<String>,
    pub name: Option<String>,
    pub exclude_names: HashSet<String>,
    pub tags: HashSet<String>,
    pub exclude_tags: HashSet<String>,
    pub families: HashSet<String>,
    pub exclude_families: HashSet<String>,
    pub game_mode: Option<GameMode>,
    pub exclude_game_modes: HashSet<GameMode>,
    /// `lm` / `l`.
    pub level: Range<i32>,
    pub origin: Option<OriginOverride>,
    /// `dx`/`dy`/`dz`. Unset axes are zero.
    pub volume: Option<Vector3>,
    /// `rm` / `r`.
    pub distance: Range<f64>,
    pub rotation: RotationRange,
    pub count: Option<CountSelector>,
    /// Declaration order; all must hold.
    pub scores: Vec<ScoreFilter>,
    /// Declaration order; all must hold.
    pub has_item: Vec<ItemCondition>,
}

impl Query {
    /// Whether any constraint needs an origin to evaluate.
    #[must_use]
    pub fn is_spatial(&self) -> bool {
        !self.distance.is_unbounded()
            || self.volume.is_some()
            || !self.rotation.is_unbounded()
            || self.count.is_some()
    }

    /// Whether the query narrows the candidate pool by identity
    /// (type, name, tags or families).
    #[must_use]
    pub fn constrains_identity(&self) -> bool {
        self.entity_type.is_some()
            || !self.exclude_types.is_empty()
            || self.name.is_some()
            || !self.exclude_names.is_empty()
            || !self.tags.is_empty()
            || !self.exclude_tags.is_empty()
            || !self.families.is_empty()
            || !self.exclude_families.is_empty()
    }

    /// Whether any game-mode or level constraint is present. These only
    /// ever match players.
    #[must_use]
    pub fn requires_player(&self) -> bool {
        self.game_mode.is_some()
            || !self.exclude_game_modes.is_empty()
            || !self.level.is_unbounded()
    }
}
