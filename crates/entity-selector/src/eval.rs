//! Selector evaluation against a host world.
//!
//! Evaluation runs in four passes:
//!
//! 1. Build the effective query: the parsed query plus per-symbol defaults
//!    (`@a`/`@p`/`@r` force the player type, `@p` implies `c=1`).
//! 2. Fetch candidates from [`WorldServices::query_pool`], or use the
//!    executor alone for `@s`.
//! 3. Re-check every constraint on every candidate. Host-side filtering is
//!    only an optimization.
//! 4. Order and limit: nearest/farthest N by distance, a random sample for
//!    `@r`, otherwise host order.

use rand::RngCore;
use rand::seq::SliceRandom;
use tracing::{debug, trace};

use crate::config::SelectorConfig;
use crate::error::{SelectorError, SelectorResult};
use crate::host::{PoolQuery, Scoreboard, SelectorEntity, WorldServices};
use crate::inventory::has_items;
use crate::parser::Selector;
use crate::query::{CountSelector, Query, SelectorSymbol, Vector3};

/// Everything an evaluation reads besides the selector itself.
///
/// ```
/// use entity_selector::memory::{MemoryEntity, MemoryWorld};
/// use entity_selector::{ExecutionContext, Selector, Vector3};
///
/// let mut world = MemoryWorld::new();
/// world.spawn(MemoryEntity::player("Steve").at(10.0, 0.0, 0.0));
/// world.spawn(MemoryEntity::player("Alex").at(2.0, 0.0, 0.0));
///
/// let mut ctx = ExecutionContext::new(&world).at(Vector3::ZERO);
/// let nearest = Selector::parse("@p").evaluate(&mut ctx);
/// assert_eq!(nearest[0].name, "Alex");
/// ```
pub struct ExecutionContext<'w, W: WorldServices> {
    world: &'w W,
    origin: Option<Vector3>,
    executor: Option<W::Entity>,
    config: SelectorConfig,
    rng: Option<&'w mut dyn RngCore>,
}

impl<'w, W: WorldServices> ExecutionContext<'w, W> {
    #[must_use]
    pub fn new(world: &'w W) -> Self {
        Self {
            world,
            origin: None,
            executor: None,
            config: SelectorConfig::default(),
            rng: None,
        }
    }

    /// Evaluate from an explicit location.
    #[must_use]
    pub fn at(mut self, origin: Vector3) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Set the entity `@s` refers to.
    #[must_use]
    pub fn executed_by(mut self, executor: W::Entity) -> Self {
        self.executor = Some(executor);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: SelectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `rng` for `@r` sampling instead of the thread-local generator.
    #[must_use]
    pub fn with_rng(mut self, rng: &'w mut dyn RngCore) -> Self {
        self.rng = Some(rng);
        self
    }

    #[must_use]
    pub const fn world(&self) -> &'w W {
        self.world
    }

    #[must_use]
    pub const fn executor(&self) -> Option<&W::Entity> {
        self.executor.as_ref()
    }

    #[must_use]
    pub const fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// The explicit origin, else the executor's position, else zero.
    #[must_use]
    pub fn location(&self) -> Vector3 {
        self.origin
            .or_else(|| self.executor.as_ref().map(SelectorEntity::position))
            .unwrap_or(Vector3::ZERO)
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        match self.rng.as_deref_mut() {
            Some(rng) => items.shuffle(rng),
            None => items.shuffle(&mut rand::thread_rng()),
        }
    }
}

/// How the filtered matches are ordered and limited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    All,
    Closest(usize),
    Farthest(usize),
    Random(usize),
}

impl Selection {
    fn for_query(symbol: SelectorSymbol, query: &Query) -> Self {
        let limit = |n: u32| usize::try_from(n).unwrap_or(usize::MAX);
        match (symbol, query.count) {
            (SelectorSymbol::RandomPlayer, count) => {
                Self::Random(count.map_or(1, |c| limit(c.magnitude())))
            }
            (_, Some(CountSelector::Closest(n))) => Self::Closest(limit(n)),
            (_, Some(CountSelector::Farthest(n))) => Self::Farthest(limit(n)),
            (_, None) => Self::All,
        }
    }
}

impl Selector {
    /// Apply the symbol's defaults to a copy of the parsed query.
    #[must_use]
    pub fn effective_query(&self, config: &SelectorConfig) -> Query {
        let mut query = self.query().clone();
        match self.symbol() {
            SelectorSymbol::Player => {
                query.entity_type = Some(config.player_type.clone());
            }
            SelectorSymbol::NearestPlayer => {
                query.entity_type = Some(config.player_type.clone());
                query.count.get_or_insert(CountSelector::Closest(1));
            }
            SelectorSymbol::RandomPlayer => {
                if !query.constrains_identity() {
                    query.entity_type = Some(config.player_type.clone());
                }
            }
            SelectorSymbol::All | SelectorSymbol::Executor => {}
        }
        query
    }

    /// Evaluate, reporting resolution failures.
    ///
    /// The only hard failure is `@s` without an executor. Per-entity lookup
    /// failures (missing objective, no scoreboard identity) just reject that
    /// entity.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::Resolution`] when the selector is `@s` and the
    /// context has no executor.
    pub fn resolve<W: WorldServices>(
        &self,
        ctx: &mut ExecutionContext<'_, W>,
    ) -> SelectorResult<Vec<W::Entity>> {
        let query = self.effective_query(ctx.config());
        let location = ctx.location();
        let origin = (query.is_spatial() || query.origin.is_some())
            .then(|| query.origin.map_or(location, |o| o.resolve(location)));

        let candidates = if self.symbol() == SelectorSymbol::Executor {
            let executor = ctx
                .executor()
                .cloned()
                .ok_or_else(|| SelectorError::resolution("@s", "no executing entity"))?;
            vec![executor]
        } else {
            ctx.world().query_pool(&PoolQuery {
                query: &query,
                origin,
                config: ctx.config(),
            })
        };
        let pool_size = candidates.len();

        let filter = Filter {
            query: &query,
            origin: origin.unwrap_or(location),
            config: ctx.config(),
            scoreboard: ctx.world().scoreboard(),
        };
        let mut matched: Vec<W::Entity> = candidates
            .into_iter()
            .filter(|entity| filter.accepts(entity))
            .collect();
        let filtered = matched.len();

        let center = origin.unwrap_or(location);
        let by_distance = |a: &W::Entity, b: &W::Entity| {
            a.position()
                .distance(center)
                .total_cmp(&b.position().distance(center))
        };
        match Selection::for_query(self.symbol(), &query) {
            Selection::All => {}
            Selection::Closest(n) => {
                matched.sort_by(by_distance);
                matched.truncate(n);
            }
            Selection::Farthest(n) => {
                matched.sort_by(|a, b| by_distance(b, a));
                matched.truncate(n);
            }
            Selection::Random(n) => {
                ctx.shuffle(&mut matched);
                matched.truncate(n);
            }
        }

        debug!(
            "selector {} matched {} of {} candidates, returning {}",
            self,
            filtered,
            pool_size,
            matched.len()
        );
        Ok(matched)
    }

    /// Evaluate, degrading any resolution failure to an empty result.
    #[must_use]
    pub fn evaluate<W: WorldServices>(&self, ctx: &mut ExecutionContext<'_, W>) -> Vec<W::Entity> {
        self.resolve(ctx).unwrap_or_else(|error| {
            debug!("{}", error);
            Vec::new()
        })
    }
}

/// The per-entity post-filter.
struct Filter<'a> {
    query: &'a Query,
    origin: Vector3,
    config: &'a SelectorConfig,
    scoreboard: &'a dyn Scoreboard,
}

impl Filter<'_> {
    fn accepts<E: SelectorEntity>(&self, entity: &E) -> bool {
        match self.rejection(entity) {
            None => true,
            Some(reason) => {
                trace!("rejected {} ({}): {}", entity.name(), entity.entity_type(), reason);
                false
            }
        }
    }

    fn rejection<E: SelectorEntity>(&self, entity: &E) -> Option<&'static str> {
        if !self.identity_matches(entity) {
            return Some("identity");
        }
        if !self.player_state_matches(entity) {
            return Some("game mode or level");
        }
        if !self.scores_match(entity) {
            return Some("scores");
        }
        if !self.in_volume(entity.position()) {
            return Some("volume");
        }
        if !self.query.distance.is_unbounded()
            && !self.query.distance.contains(entity.position().distance(self.origin))
        {
            return Some("distance");
        }
        if !self.query.rotation.contains(entity.rotation()) {
            return Some("rotation");
        }
        if !has_items(entity, &self.query.has_item, self.config) {
            return Some("hasitem");
        }
        None
    }

    fn identity_matches<E: SelectorEntity>(&self, entity: &E) -> bool {
        let query = self.query;
        let kind = entity.entity_type();
        let name = entity.name();

        query
            .entity_type
            .as_deref()
            .is_none_or(|t| self.config.same_type(t, kind))
            && !query
                .exclude_types
                .iter()
                .any(|t| self.config.same_type(t, kind))
            && query.name.as_deref().is_none_or(|n| n == name)
            && !query.exclude_names.contains(name)
            && query.tags.iter().all(|t| entity.has_tag(t))
            && !query.exclude_tags.iter().any(|t| entity.has_tag(t))
            && query.families.iter().all(|f| entity.is_family(f))
            && !query.exclude_families.iter().any(|f| entity.is_family(f))
    }

    /// Game-mode and level constraints only ever match players.
    fn player_state_matches<E: SelectorEntity>(&self, entity: &E) -> bool {
        let query = self.query;
        if !query.requires_player() {
            return true;
        }
        if !entity.is_player() {
            return false;
        }

        let mode = entity.game_mode();
        query.game_mode.is_none_or(|wanted| mode == Some(wanted))
            && mode.is_none_or(|m| !query.exclude_game_modes.contains(&m))
            && (query.level.is_unbounded()
                || entity.level().is_some_and(|l| query.level.contains(l)))
    }

    fn scores_match<E: SelectorEntity>(&self, entity: &E) -> bool {
        if self.query.scores.is_empty() {
            return true;
        }
        let Some(identity) = entity.scoreboard_identity() else {
            return false;
        };

        self.query.scores.iter().all(|filter| {
            let Some(objective) = self.scoreboard.objective(&filter.objective) else {
                debug!(
                    "{}",
                    SelectorError::resolution(
                        format!("objective {:?}", filter.objective),
                        "no such objective"
                    )
                );
                return false;
            };
            objective
                .score(identity)
                .is_some_and(|score| filter.accepts(score))
        })
    }

    /// Axis-aligned box from `origin` to `origin + volume`, upper bound
    /// exclusive. A zero extent on an axis means one block thick.
    fn in_volume(&self, position: Vector3) -> bool {
        let Some(volume) = self.query.volume else {
            return true;
        };
        let axis = |origin: f64, extent: f64, p: f64| {
            let lo = origin.min(origin + extent);
            let hi = if extent == 0.0 {
                lo + 1.0
            } else {
                origin.max(origin + extent)
            };
            lo <= p && p < hi
        };

        axis(self.origin.x, volume.x, position.x)
            && axis(self.origin.y, volume.y, position.y)
            && axis(self.origin.z, volume.z, position.z)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::host::{EquipmentSlot, ItemStack};
    use crate::memory::{MemoryEntity, MemoryWorld};
    use crate::query::GameMode;

    fn names(entities: &[Arc<MemoryEntity>]) -> Vec<&str> {
        entities.iter().map(|e| e.name.as_str()).collect()
    }

    fn line_of_players(count: usize) -> MemoryWorld {
        let mut world = MemoryWorld::new();
        for i in 0..count {
            let x = f64::from(u32::try_from(i).unwrap());
            world.spawn(MemoryEntity::player(format!("p{i}")).at(x, 0.0, 0.0));
        }
        world
    }

    fn eval(world: &MemoryWorld, selector: &str) -> Vec<Arc<MemoryEntity>> {
        let mut ctx = ExecutionContext::new(world).at(Vector3::ZERO);
        Selector::parse(selector).evaluate(&mut ctx)
    }

    #[test]
    fn test_all_preserves_host_order() {
        let mut world = MemoryWorld::new();
        world.spawn(MemoryEntity::new("minecraft:pig").named("b").at(9.0, 0.0, 0.0));
        world.spawn(MemoryEntity::new("minecraft:cow").named("a").at(1.0, 0.0, 0.0));
        assert_eq!(names(&eval(&world, "@e")), ["b", "a"]);
    }

    #[test]
    fn test_players_only() {
        let mut world = MemoryWorld::new();
        world.spawn(MemoryEntity::new("minecraft:pig").named("pig"));
        world.spawn(MemoryEntity::player("Steve"));
        assert_eq!(names(&eval(&world, "@a")), ["Steve"]);
        assert_eq!(names(&eval(&world, "@a[type=minecraft:pig]")), ["Steve"]);
    }

    #[test]
    fn test_nearest_player() {
        let world = line_of_players(5);
        let mut ctx = ExecutionContext::new(&world).at(Vector3::new(3.2, 0.0, 0.0));
        assert_eq!(names(&Selector::parse("@p").evaluate(&mut ctx)), ["p3"]);
        assert_eq!(names(&Selector::parse("@p[c=2]").evaluate(&mut ctx)), ["p3", "p4"]);
        assert_eq!(
            names(&Selector::parse("@p[c=-2]").evaluate(&mut ctx)),
            ["p0", "p1"]
        );
    }

    #[test]
    fn test_count_on_all() {
        let world = line_of_players(5);
        assert_eq!(names(&eval(&world, "@e[c=2]")), ["p0", "p1"]);
        assert_eq!(names(&eval(&world, "@e[c=-1]")), ["p4"]);
        assert_eq!(eval(&world, "@e[c=0]").len(), 5);
    }

    #[test]
    fn test_random_sample_is_distinct() {
        let world = line_of_players(10);
        let mut rng = StdRng::seed_from_u64(7);
        let mut ctx = ExecutionContext::new(&world).with_rng(&mut rng);
        let picked = Selector::parse("@r[c=3]").evaluate(&mut ctx);
        assert_eq!(picked.len(), 3);
        let mut unique = names(&picked);
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_random_keeps_explicit_type() {
        let mut world = MemoryWorld::new();
        world.spawn(MemoryEntity::new("minecraft:pig").named("pig"));
        world.spawn(MemoryEntity::player("Steve"));
        assert_eq!(names(&eval(&world, "@r[type=minecraft:pig]")), ["pig"]);
        assert_eq!(names(&eval(&world, "@r")), ["Steve"]);
    }

    #[test]
    fn test_executor() {
        let mut world = MemoryWorld::new();
        let steve = world.spawn(MemoryEntity::player("Steve").with_tag("builder"));
        world.spawn(MemoryEntity::player("Alex"));

        let mut ctx = ExecutionContext::new(&world);
        let selector = Selector::parse("@s");
        assert!(matches!(
            selector.resolve(&mut ctx),
            Err(SelectorError::Resolution { .. })
        ));
        assert!(selector.evaluate(&mut ctx).is_empty());

        let mut ctx = ExecutionContext::new(&world).executed_by(Arc::clone(&steve));
        assert_eq!(names(&Selector::parse("@s").evaluate(&mut ctx)), ["Steve"]);
        assert_eq!(
            names(&Selector::parse("@s[tag=builder]").evaluate(&mut ctx)),
            ["Steve"]
        );
        assert!(Selector::parse("@s[tag=miner]").evaluate(&mut ctx).is_empty());
    }

    #[test]
    fn test_location_falls_back_to_executor() {
        let mut world = MemoryWorld::new();
        let here = world.spawn(MemoryEntity::player("Here").at(50.0, 0.0, 0.0));
        world.spawn(MemoryEntity::player("Far").at(0.0, 0.0, 0.0));
        world.spawn(MemoryEntity::player("Near").at(52.0, 0.0, 0.0));

        let mut ctx = ExecutionContext::new(&world).executed_by(here);
        assert_eq!(
            names(&Selector::parse("@a[r=5,rm=1]").evaluate(&mut ctx)),
            ["Near"]
        );
    }

    #[test]
    fn test_volume_half_open() {
        let mut world = MemoryWorld::new();
        world.spawn(MemoryEntity::new("minecraft:pig").named("origin").at(0.0, 0.0, 0.0));
        world.spawn(MemoryEntity::new("minecraft:pig").named("edge").at(0.0, 0.0, 2.0));
        world.spawn(MemoryEntity::new("minecraft:pig").named("above").at(0.0, 1.0, 0.0));
        world.spawn(MemoryEntity::new("minecraft:pig").named("inside").at(0.5, 0.5, 1.5));
        assert_eq!(
            names(&eval(&world, "@e[x=0,y=0,z=0,dz=2]")),
            ["origin", "inside"]
        );
    }

    #[test]
    fn test_negative_volume() {
        let mut world = MemoryWorld::new();
        world.spawn(MemoryEntity::new("minecraft:pig").named("behind").at(0.5, 0.5, -2.0));
        world.spawn(MemoryEntity::new("minecraft:pig").named("ahead").at(0.5, 0.5, 1.0));
        assert_eq!(names(&eval(&world, "@e[dz=-3]")), ["behind"]);
    }

    #[test]
    fn test_relative_origin() {
        let mut world = MemoryWorld::new();
        world.spawn(MemoryEntity::new("minecraft:pig").named("a").at(10.0, 64.0, 0.0));
        let mut ctx = ExecutionContext::new(&world).at(Vector3::new(10.0, 60.0, 0.0));
        let selector = Selector::parse("@e[y=~4,r=0.5]");
        assert_eq!(names(&selector.evaluate(&mut ctx)), ["a"]);

        let mut ctx = ExecutionContext::new(&world).at(Vector3::new(10.0, 0.0, 0.0));
        assert!(selector.evaluate(&mut ctx).is_empty());
    }

    #[test]
    fn test_rotation() {
        let mut world = MemoryWorld::new();
        world.spawn(MemoryEntity::player("Up").facing(-80.0, 0.0));
        world.spawn(MemoryEntity::player("Level").facing(0.0, 90.0));
        assert_eq!(names(&eval(&world, "@a[rxm=-10,rx=10]")), ["Level"]);
        assert_eq!(names(&eval(&world, "@a[rym=45]")), ["Level"]);
    }

    #[test]
    fn test_yaw_window_does_not_wrap() {
        let mut world = MemoryWorld::new();
        world.spawn(MemoryEntity::player("South").facing(0.0, 175.0));
        world.spawn(MemoryEntity::player("North").facing(0.0, -175.0));
        assert!(eval(&world, "@a[rym=170,ry=-170]").is_empty());
        assert_eq!(names(&eval(&world, "@a[rym=170,ry=180]")), ["South"]);
    }

    #[test]
    fn test_game_mode_and_level_require_players() {
        let mut world = MemoryWorld::new();
        world.spawn(MemoryEntity::new("minecraft:pig").named("pig"));
        world.spawn(
            MemoryEntity::player("Builder")
                .with_game_mode(GameMode::Creative)
                .with_level(30),
        );
        world.spawn(MemoryEntity::player("Miner").with_level(5));

        assert_eq!(names(&eval(&world, "@e[m=c]")), ["Builder"]);
        assert_eq!(names(&eval(&world, "@e[m=!creative]")), ["Miner"]);
        assert_eq!(names(&eval(&world, "@e[lm=10]")), ["Builder"]);
        assert_eq!(names(&eval(&world, "@e[l=10]")), ["Miner"]);
    }

    #[test]
    fn test_identity_filters() {
        let mut world = MemoryWorld::new();
        world.spawn(
            MemoryEntity::new("minecraft:zombie")
                .named("z")
                .with_family("monster")
                .with_family("undead"),
        );
        world.spawn(
            MemoryEntity::new("minecraft:creeper")
                .named("c")
                .with_family("monster"),
        );
        world.spawn(MemoryEntity::new("minecraft:pig").named("p").with_tag("pet"));

        assert_eq!(names(&eval(&world, "@e[family=monster]")), ["z", "c"]);
        assert_eq!(
            names(&eval(&world, "@e[family=monster,family=!undead]")),
            ["c"]
        );
        assert_eq!(names(&eval(&world, "@e[tag=!pet]")), ["z", "c"]);
        assert_eq!(names(&eval(&world, "@e[name=!z,type=!pig]")), ["c"]);
        assert_eq!(names(&eval(&world, "@e[type=zombie]")), ["z"]);
    }

    #[test]
    fn test_scores() {
        let mut world = MemoryWorld::new();
        let low = world.add_participant("low");
        let high = world.add_participant("high");
        let missing = world.add_participant("missing");
        world.set_score("level", low, 5);
        world.set_score("level", high, 11);
        world.add_objective("unused");

        world.spawn(MemoryEntity::player("low").with_identity(low));
        world.spawn(MemoryEntity::player("high").with_identity(high));
        world.spawn(MemoryEntity::player("missing").with_identity(missing));
        world.spawn(MemoryEntity::player("anonymous"));

        assert_eq!(names(&eval(&world, "@a[scores={level=5..10}]")), ["low"]);
        assert_eq!(names(&eval(&world, "@a[scores={level=!5..10}]")), ["high"]);
        assert!(eval(&world, "@a[scores={nope=0..}]").is_empty());
        assert!(eval(&world, "@a[scores={unused=..}]").is_empty());
    }

    #[test]
    fn test_hasitem_filter() {
        let mut world = MemoryWorld::new();
        world.spawn(
            MemoryEntity::player("Knight").with_equipment(
                EquipmentSlot::Mainhand,
                ItemStack::new("minecraft:iron_sword", 1),
            ),
        );
        world.spawn(MemoryEntity::player("Farmer").with_slot(0, ItemStack::new("minecraft:wheat", 12)));
        assert_eq!(
            names(&eval(
                &world,
                "@a[hasitem={item=minecraft:iron_sword,location=slot.weapon.mainhand}]"
            )),
            ["Knight"]
        );
        assert_eq!(
            names(&eval(&world, "@a[hasitem={item=minecraft:wheat,quantity=10..}]")),
            ["Farmer"]
        );
    }

    #[test]
    fn test_custom_player_type() {
        let mut world = MemoryWorld::new();
        world.spawn(MemoryEntity::new("sim:agent").named("agent"));
        world.spawn(MemoryEntity::player("Steve"));

        let config = SelectorConfig {
            player_type: "sim:agent".to_string(),
            ..SelectorConfig::default()
        };
        let mut ctx = ExecutionContext::new(&world).with_config(config);
        assert_eq!(names(&Selector::parse("@a").evaluate(&mut ctx)), ["agent"]);
    }

    #[test]
    fn test_effective_query() {
        let config = SelectorConfig::default();
        let query = Selector::parse("@p").effective_query(&config);
        assert_eq!(query.entity_type.as_deref(), Some("minecraft:player"));
        assert_eq!(query.count, Some(CountSelector::Closest(1)));

        let query = Selector::parse("@a").effective_query(&config);
        assert_eq!(query.count, None);

        let query = Selector::parse("@r[tag=x]").effective_query(&config);
        assert_eq!(query.entity_type, None);
    }

    #[test]
    fn test_selection_kind() {
        let query = Query::default();
        assert_eq!(
            Selection::for_query(SelectorSymbol::RandomPlayer, &query),
            Selection::Random(1)
        );
        assert_eq!(
            Selection::for_query(SelectorSymbol::All, &query),
            Selection::All
        );
    }
}
