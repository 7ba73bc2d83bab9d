//! In-memory host.
//!
//! A small entity list and scoreboard implementing the host traits. Used by
//! the tests and benches, and a template for real adapters.

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};

use crate::host::{
    EquipmentSlot, ItemStack, Objective, PoolQuery, Scoreboard, ScoreboardIdentity,
    SelectorEntity, WorldServices,
};
use crate::query::{GameMode, Rotation, Vector3};

/// Player-only state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerState {
    pub game_mode: GameMode,
    pub level: i32,
}

/// An entity stored in a [`MemoryWorld`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemoryEntity {
    pub type_id: String,
    pub name: String,
    pub position: Vector3,
    pub rotation: Rotation,
    pub tags: HashSet<String>,
    pub families: HashSet<String>,
    pub player: Option<PlayerState>,
    pub inventory: Vec<Option<ItemStack>>,
    pub equipment: Vec<(EquipmentSlot, ItemStack)>,
    pub identity: Option<ScoreboardIdentity>,
}

impl MemoryEntity {
    #[must_use]
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            ..Self::default()
        }
    }

    /// A survival-mode, level 0 player.
    #[must_use]
    pub fn player(name: impl Into<String>) -> Self {
        Self {
            type_id: "minecraft:player".to_string(),
            name: name.into(),
            player: Some(PlayerState {
                game_mode: GameMode::Survival,
                level: 0,
            }),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn at(mut self, x: f64, y: f64, z: f64) -> Self {
        self.position = Vector3::new(x, y, z);
        self
    }

    #[must_use]
    pub fn facing(mut self, pitch: f64, yaw: f64) -> Self {
        self.rotation = Rotation::new(pitch, yaw);
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    #[must_use]
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.families.insert(family.into());
        self
    }

    /// Set the game mode. Has no effect on non-players.
    #[must_use]
    pub fn with_game_mode(mut self, game_mode: GameMode) -> Self {
        if let Some(player) = &mut self.player {
            player.game_mode = game_mode;
        }
        self
    }

    /// Set the experience level. Has no effect on non-players.
    #[must_use]
    pub fn with_level(mut self, level: i32) -> Self {
        if let Some(player) = &mut self.player {
            player.level = level;
        }
        self
    }

    #[must_use]
    pub fn with_slot(mut self, index: usize, stack: ItemStack) -> Self {
        if self.inventory.len() <= index {
            self.inventory.resize(index + 1, None);
        }
        self.inventory[index] = Some(stack);
        self
    }

    #[must_use]
    pub fn with_equipment(mut self, slot: EquipmentSlot, stack: ItemStack) -> Self {
        self.equipment.retain(|(existing, _)| *existing != slot);
        self.equipment.push((slot, stack));
        self
    }

    #[must_use]
    pub fn with_identity(mut self, identity: ScoreboardIdentity) -> Self {
        self.identity = Some(identity);
        self
    }
}

impl SelectorEntity for MemoryEntity {
    fn entity_type(&self) -> &str {
        &self.type_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> Vector3 {
        self.position
    }

    fn rotation(&self) -> Rotation {
        self.rotation
    }

    fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    fn is_family(&self, family: &str) -> bool {
        self.families.contains(family)
    }

    fn is_player(&self) -> bool {
        self.player.is_some()
    }

    fn game_mode(&self) -> Option<GameMode> {
        self.player.map(|p| p.game_mode)
    }

    fn level(&self) -> Option<i32> {
        self.player.map(|p| p.level)
    }

    fn inventory(&self) -> Vec<Option<ItemStack>> {
        self.inventory.clone()
    }

    fn equipment(&self) -> Vec<(EquipmentSlot, ItemStack)> {
        self.equipment.clone()
    }

    fn scoreboard_identity(&self) -> Option<ScoreboardIdentity> {
        self.identity
    }
}

/// Scores for one objective.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjective {
    scores: HashMap<ScoreboardIdentity, i64>,
}

impl Objective for MemoryObjective {
    fn score(&self, participant: ScoreboardIdentity) -> Option<i64> {
        self.scores.get(&participant).copied()
    }
}

/// Entities plus scoreboard.
#[derive(Debug, Default)]
pub struct MemoryWorld {
    entities: Vec<Arc<MemoryEntity>>,
    objectives: HashMap<String, MemoryObjective>,
    participants: HashMap<String, ScoreboardIdentity>,
    next_identity: u64,
}

impl MemoryWorld {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity. Pool order is spawn order.
    pub fn spawn(&mut self, entity: MemoryEntity) -> Arc<MemoryEntity> {
        let entity = Arc::new(entity);
        self.entities.push(Arc::clone(&entity));
        entity
    }

    pub fn entities(&self) -> &[Arc<MemoryEntity>] {
        &self.entities
    }

    /// Get or create the scoreboard identity for `name`.
    pub fn add_participant(&mut self, name: impl Into<String>) -> ScoreboardIdentity {
        let next = &mut self.next_identity;
        *self.participants.entry(name.into()).or_insert_with(|| {
            *next += 1;
            ScoreboardIdentity(*next)
        })
    }

    /// Create an empty objective.
    pub fn add_objective(&mut self, name: impl Into<String>) {
        self.objectives.entry(name.into()).or_default();
    }

    /// Set a score, creating the objective if needed.
    pub fn set_score(&mut self, objective: &str, participant: ScoreboardIdentity, score: i64) {
        self.objectives
            .entry(objective.to_string())
            .or_default()
            .scores
            .insert(participant, score);
    }
}

impl Scoreboard for MemoryWorld {
    fn objective(&self, name: &str) -> Option<&dyn Objective> {
        self.objectives.get(name).map(|o| o as &dyn Objective)
    }

    fn participant(&self, name: &str) -> Option<ScoreboardIdentity> {
        self.participants.get(name).copied()
    }
}

impl WorldServices for MemoryWorld {
    type Entity = Arc<MemoryEntity>;

    /// Filters type, name and tags natively; everything else is left to the
    /// evaluator.
    fn query_pool(&self, pool: &PoolQuery<'_>) -> Vec<Self::Entity> {
        let query = pool.query;
        self.entities
            .iter()
            .filter(|e| {
                query
                    .entity_type
                    .as_deref()
                    .is_none_or(|t| pool.config.same_type(t, &e.type_id))
            })
            .filter(|e| {
                !query
                    .exclude_types
                    .iter()
                    .any(|t| pool.config.same_type(t, &e.type_id))
            })
            .filter(|e| query.name.as_deref().is_none_or(|n| n == e.name))
            .filter(|e| query.tags.iter().all(|t| e.tags.contains(t)))
            .cloned()
            .collect()
    }

    fn scoreboard(&self) -> &dyn Scoreboard {
        self
    }
}
