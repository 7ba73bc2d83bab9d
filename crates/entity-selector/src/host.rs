//! What the evaluator needs from a host engine.
//!
//! An adapter over a real game or simulation implements [`SelectorEntity`]
//! for its entity handle and [`WorldServices`] for its world. The in-memory
//! [`crate::memory`] host is a complete example.

use std::borrow::Cow;
use std::sync::Arc;

use hashbrown::HashSet;

use crate::config::SelectorConfig;
use crate::query::{GameMode, Query, Rotation, Vector3};

/// A host handle correlating an entity or name to its scoreboard record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScoreboardIdentity(pub u64);

/// An item stack as seen by `hasitem`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStack {
    pub type_id: String,
    pub tags: HashSet<String>,
    pub amount: i32,
    /// Durability damage, `None` when the item has no durability.
    pub damage: Option<i32>,
}

impl ItemStack {
    #[must_use]
    pub fn new(type_id: impl Into<String>, amount: i32) -> Self {
        Self {
            type_id: type_id.into(),
            tags: HashSet::new(),
            amount,
            damage: None,
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    #[must_use]
    pub fn with_damage(mut self, damage: i32) -> Self {
        self.damage = Some(damage);
        self
    }
}

/// An equipment slot outside the indexed inventory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EquipmentSlot {
    Head,
    Chest,
    Legs,
    Feet,
    Mainhand,
    Offhand,
    /// Any other host-defined slot, reported as `slot.equippable.<name>`.
    Other(String),
}

impl EquipmentSlot {
    /// The `location` name used by `hasitem`.
    #[must_use]
    pub fn location(&self) -> Cow<'static, str> {
        match self {
            Self::Head => Cow::Borrowed("slot.armor.head"),
            Self::Chest => Cow::Borrowed("slot.armor.chest"),
            Self::Legs => Cow::Borrowed("slot.armor.legs"),
            Self::Feet => Cow::Borrowed("slot.armor.feet"),
            Self::Mainhand => Cow::Borrowed("slot.weapon.mainhand"),
            Self::Offhand => Cow::Borrowed("slot.weapon.offhand"),
            Self::Other(name) => Cow::Owned(format!("slot.equippable.{name}")),
        }
    }

    /// Armor and weapon slots count as "in range" for a slot filter even
    /// though they carry no index.
    #[must_use]
    pub const fn is_armor_or_weapon(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

/// Per-entity accessors.
///
/// Player-only data (`game_mode`, `level`) is gated behind [`is_player`]:
/// non-players return `None`.
///
/// [`is_player`]: SelectorEntity::is_player
pub trait SelectorEntity {
    /// Namespaced type id such as `minecraft:pig`.
    fn entity_type(&self) -> &str;

    /// Display name (player name or name tag).
    fn name(&self) -> &str;

    fn position(&self) -> Vector3;

    fn rotation(&self) -> Rotation;

    fn has_tag(&self, tag: &str) -> bool;

    fn is_family(&self, family: &str) -> bool;

    fn is_player(&self) -> bool;

    fn game_mode(&self) -> Option<GameMode>;

    fn level(&self) -> Option<i32>;

    /// Inventory container contents by slot index. Empty slots are `None`.
    fn inventory(&self) -> Vec<Option<ItemStack>>;

    /// Occupied equipment slots.
    fn equipment(&self) -> Vec<(EquipmentSlot, ItemStack)>;

    fn scoreboard_identity(&self) -> Option<ScoreboardIdentity>;
}

impl<T: SelectorEntity + ?Sized> SelectorEntity for Arc<T> {
    fn entity_type(&self) -> &str {
        (**self).entity_type()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn position(&self) -> Vector3 {
        (**self).position()
    }

    fn rotation(&self) -> Rotation {
        (**self).rotation()
    }

    fn has_tag(&self, tag: &str) -> bool {
        (**self).has_tag(tag)
    }

    fn is_family(&self, family: &str) -> bool {
        (**self).is_family(family)
    }

    fn is_player(&self) -> bool {
        (**self).is_player()
    }

    fn game_mode(&self) -> Option<GameMode> {
        (**self).game_mode()
    }

    fn level(&self) -> Option<i32> {
        (**self).level()
    }

    fn inventory(&self) -> Vec<Option<ItemStack>> {
        (**self).inventory()
    }

    fn equipment(&self) -> Vec<(EquipmentSlot, ItemStack)> {
        (**self).equipment()
    }

    fn scoreboard_identity(&self) -> Option<ScoreboardIdentity> {
        (**self).scoreboard_identity()
    }
}

/// A named scoreboard counter.
pub trait Objective {
    fn score(&self, participant: ScoreboardIdentity) -> Option<i64>;
}

/// Read access to the host scoreboard.
pub trait Scoreboard {
    fn objective(&self, name: &str) -> Option<&dyn Objective>;

    /// Look up a participant by name, including fake players.
    fn participant(&self, name: &str) -> Option<ScoreboardIdentity>;
}

/// Constraints handed to the host pool.
///
/// The host applies whatever it can natively and may ignore the rest; the
/// evaluator re-checks every constraint afterwards.
#[derive(Debug, Clone, Copy)]
pub struct PoolQuery<'q> {
    pub query: &'q Query,
    /// Resolved origin for distance, volume and ordering.
    pub origin: Option<Vector3>,
    pub config: &'q SelectorConfig,
}

/// Entity pool plus scoreboard, passed explicitly into every evaluation.
pub trait WorldServices {
    type Entity: SelectorEntity + Clone;

    /// Fetch candidates in host iteration order.
    fn query_pool(&self, query: &PoolQuery<'_>) -> Vec<Self::Entity>;

    fn scoreboard(&self) -> &dyn Scoreboard;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equipment_locations() {
        assert_eq!(EquipmentSlot::Head.location(), "slot.armor.head");
        assert_eq!(EquipmentSlot::Offhand.location(), "slot.weapon.offhand");
        assert_eq!(
            EquipmentSlot::Other("saddle".to_string()).location(),
            "slot.equippable.saddle"
        );
        assert!(EquipmentSlot::Feet.is_armor_or_weapon());
        assert!(!EquipmentSlot::Other("body".to_string()).is_armor_or_weapon());
    }

    #[test]
    fn test_item_stack_builder() {
        let stack = ItemStack::new("minecraft:iron_sword", 1)
            .with_tag("weapons")
            .with_damage(12);
        assert!(stack.tags.contains("weapons"));
        assert_eq!(stack.damage, Some(12));
    }
}
