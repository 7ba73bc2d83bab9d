//! Entity Selector
//!
//! Parses command-style entity selectors and evaluates them against any host
//! that implements [`WorldServices`].
//!
//! # Syntax
//!
//! ```text
//! @e                               // every entity
//! @a[tag=red,tag=!dead]            // players tagged red and not dead
//! @p[r=10,m=survival]              // nearest survival player within 10 blocks
//! @r[c=3]                          // three random players
//! @s[scores={kills=5..}]           // the executor, if it has 5+ kills
//! [type=minecraft:pig,dx=4,dz=4]   // pigs in a 4x1x4 box (same as @e[...])
//! @a[hasitem={item=minecraft:torch,location=slot.hotbar}]
//! ```
//!
//! Nothing here fails loudly. Malformed selectors and arguments are logged and
//! skipped; lookups that cannot be resolved reject the affected entities.
//!
//! # Examples
//!
//! ```
//! use entity_selector::memory::{MemoryEntity, MemoryWorld};
//! use entity_selector::{ExecutionContext, Vector3, evaluate};
//!
//! let mut world = MemoryWorld::new();
//! world.spawn(MemoryEntity::new("minecraft:pig").at(1.0, 0.0, 0.0));
//! world.spawn(MemoryEntity::new("minecraft:pig").at(40.0, 0.0, 0.0));
//! world.spawn(MemoryEntity::player("Steve"));
//!
//! let mut ctx = ExecutionContext::new(&world).at(Vector3::ZERO);
//! assert_eq!(evaluate("@e[type=pig,r=5]", &mut ctx).len(), 1);
//! assert_eq!(evaluate("@a", &mut ctx)[0].name, "Steve");
//! ```

mod config;
mod error;
mod eval;
mod host;
mod inventory;
mod item;
pub mod memory;
mod parser;
mod query;
mod range;
mod tokenizer;

pub use config::SelectorConfig;
pub use error::{SelectorError, SelectorResult};
pub use eval::ExecutionContext;
pub use host::{
    EquipmentSlot, ItemStack, Objective, PoolQuery, Scoreboard, ScoreboardIdentity,
    SelectorEntity, WorldServices,
};
pub use inventory::has_items;
pub use item::{ItemCondition, ItemConditionError, parse_item_conditions};
pub use parser::Selector;
pub use query::{
    Coordinate, CountSelector, GameMode, OriginOverride, Query, Rotation, RotationRange,
    ScoreFilter, SelectorSymbol, Vector3,
};
pub use range::{Range, parse_range};
pub use tokenizer::split_arguments;

/// Parse `input` and evaluate it in one step.
///
/// This is the entry point for callers that hold selector text rather than a
/// parsed [`Selector`]. Failures of any kind produce an empty list.
pub fn evaluate<W: WorldServices>(input: &str, ctx: &mut ExecutionContext<'_, W>) -> Vec<W::Entity> {
    Selector::parse(input).evaluate(ctx)
}
