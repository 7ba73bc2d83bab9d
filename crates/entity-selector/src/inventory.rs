//! `hasitem` matching against an entity's inventory and equipment.

use std::borrow::Cow;

use crate::config::SelectorConfig;
use crate::host::{ItemStack, SelectorEntity};
use crate::item::ItemCondition;

const HOTBAR: &str = "slot.hotbar";
const INVENTORY: &str = "slot.inventory";

/// One occupied slot, tagged with its symbolic location.
#[derive(Debug, Clone)]
struct Slot {
    location: Cow<'static, str>,
    /// Container index; `None` for equipment slots.
    index: Option<i32>,
    armor_or_weapon: bool,
    stack: ItemStack,
}

fn collect_slots<E: SelectorEntity + ?Sized>(entity: &E, config: &SelectorConfig) -> Vec<Slot> {
    let mut slots: Vec<Slot> = entity
        .inventory()
        .into_iter()
        .enumerate()
        .filter_map(|(index, stack)| {
            let stack = stack?;
            let location = if index < config.hotbar_size {
                HOTBAR
            } else {
                INVENTORY
            };
            Some(Slot {
                location: Cow::Borrowed(location),
                index: i32::try_from(index).ok(),
                armor_or_weapon: false,
                stack,
            })
        })
        .collect();

    slots.extend(entity.equipment().into_iter().map(|(slot, stack)| Slot {
        location: slot.location(),
        index: None,
        armor_or_weapon: slot.is_armor_or_weapon(),
        stack,
    }));

    slots
}

/// Check that every condition is met by at least one slot.
///
/// An empty condition list always matches.
pub fn has_items<E: SelectorEntity + ?Sized>(
    entity: &E,
    conditions: &[ItemCondition],
    config: &SelectorConfig,
) -> bool {
    if conditions.is_empty() {
        return true;
    }

    let slots = collect_slots(entity, config);
    conditions
        .iter()
        .all(|condition| slots.iter().any(|slot| slot_matches(condition, slot)))
}

fn slot_matches(condition: &ItemCondition, slot: &Slot) -> bool {
    item_matches(condition, &slot.stack)
        && condition.quantity.contains(slot.stack.amount)
        && damage_matches(condition, &slot.stack)
        && location_matches(condition, slot)
}

/// Namespaced patterns match the id exactly, bare patterns match a tag.
fn item_matches(condition: &ItemCondition, stack: &ItemStack) -> bool {
    match condition.item.as_deref() {
        None => true,
        Some(pattern) if pattern.contains(':') => stack.type_id == pattern,
        Some(tag) => stack.tags.contains(tag),
    }
}

fn damage_matches(condition: &ItemCondition, stack: &ItemStack) -> bool {
    match condition.data {
        None | Some(-1) => true,
        Some(wanted) => stack.damage.unwrap_or(0) == wanted,
    }
}

fn location_matches(condition: &ItemCondition, slot: &Slot) -> bool {
    if let Some(location) = condition.location.as_deref() {
        let accepted = slot.location == location
            || (location == INVENTORY && slot.location == HOTBAR);
        if !accepted {
            return false;
        }
    }

    match (&condition.slot, slot.index) {
        (None, _) => true,
        (Some(range), Some(index)) => range.contains(index),
        (Some(_), None) => slot.armor_or_weapon,
    }
}
