//! # Association expansion policy
//!
//! Building an entity path builds its attribute children. For association attributes the child is
//! itself an entity path, so on a cyclic schema (`User -> UserLoanHistory -> User -> ...`) naive
//! construction never terminates. [`PathInits`] decides, edge by edge, whether the child is built
//! eagerly or left behind a deferred placeholder that expands on first access.
//!
//! ## Decision order
//!
//! For an edge `E` from owner entity `O` to target entity `T`:
//!
//! 1. An override for `"O.E"` (or bare `"E"`) that has not been consumed on this chain wins over
//!    everything else, including the default and the depth budget.
//! 2. `T` already on the current chain (self-references included), or `E` already consumed
//!    on this chain: deferred.
//! 3. Default behaviour is deferred: deferred.
//! 4. Remaining depth budget is zero: deferred.
//! 5. Otherwise eager.
//!
//! An eager child receives [`PathInits::derive`]: the edge (and its override) consumed, one unit of
//! depth spent and `T` pushed on the chain. A deferred placeholder keeps [`PathInits::fresh`] and
//! uses it on first access, so lazy traversal is never starved by the chain that created it.
//!
//! Every override fires at most once per chain and default expansion never re-enters an entity
//! type already on the chain, so eager recursion is bounded even with `max_depth = None`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Depth budget of the default configuration.
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Spelling of an unbounded depth budget in configuration files.
pub const UNBOUNDED: &str = "unbounded";

/// Construction behaviour of one association edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Expansion {
    #[default]
    Eager,
    Deferred,
}

impl Expansion {
    pub const fn as_str(self) -> &'static str {
        match self {
            Expansion::Eager => "eager",
            Expansion::Deferred => "deferred",
        }
    }
}

impl fmt::Display for Expansion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Expansion {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "eager" => Ok(Expansion::Eager),
            "deferred" | "lazy" => Ok(Expansion::Deferred),
            other => Err(format!("unknown expansion '{other}' (expected 'eager' or 'deferred')")),
        }
    }
}

/// Static part of the policy, shared by every value derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitsConfig {
    #[serde(default)]
    pub default: Expansion,
    /// A hop count, or `"unbounded"`.
    #[serde(
        default = "default_max_depth",
        serialize_with = "serialize_depth",
        deserialize_with = "deserialize_depth"
    )]
    pub max_depth: Option<usize>,
    /// Keyed by `"Entity.attribute"` or bare `"attribute"`.
    #[serde(default)]
    pub overrides: BTreeMap<String, Expansion>,
}

fn default_max_depth() -> Option<usize> {
    Some(DEFAULT_MAX_DEPTH)
}

fn serialize_depth<S>(depth: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match depth {
        Some(depth) => serializer.serialize_u64(*depth as u64),
        None => serializer.serialize_str(UNBOUNDED),
    }
}

fn deserialize_depth<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Hops(usize),
        Named(String),
    }

    match Helper::deserialize(deserializer)? {
        Helper::Hops(depth) => Ok(Some(depth)),
        Helper::Named(name) => match name.trim().to_ascii_lowercase().as_str() {
            UNBOUNDED | "none" => Ok(None),
            other => other
                .parse()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid max_depth '{name}'"))),
        },
    }
}

impl Default for InitsConfig {
    fn default() -> Self {
        Self {
            default: Expansion::Eager,
            max_depth: default_max_depth(),
            overrides: BTreeMap::new(),
        }
    }
}

/// Expansion policy plus the traversal state of the chain it was derived along.
#[derive(Debug, Clone)]
pub struct PathInits {
    config: Arc<InitsConfig>,
    remaining: Option<usize>,
    consumed: Vec<Arc<str>>,
    chain: Vec<Arc<str>>,
}

impl Default for PathInits {
    fn default() -> Self {
        Self::new(InitsConfig::default())
    }
}

impl PathInits {
    pub fn new(config: InitsConfig) -> Self {
        Self {
            remaining: config.max_depth,
            config: Arc::new(config),
            consumed: Vec::new(),
            chain: Vec::new(),
        }
    }

    /// Eager expansion up to `depth` association hops.
    pub fn direct(depth: usize) -> Self {
        Self::new(InitsConfig {
            max_depth: Some(depth),
            ..InitsConfig::default()
        })
    }

    /// Every association deferred unless overridden.
    pub fn deferred() -> Self {
        Self::new(InitsConfig {
            default: Expansion::Deferred,
            ..InitsConfig::default()
        })
    }

    pub fn with_default(self, default: Expansion) -> Self {
        self.reconfigure(|config| config.default = default)
    }

    pub fn with_max_depth(self, max_depth: Option<usize>) -> Self {
        self.reconfigure(|config| config.max_depth = max_depth)
    }

    pub fn with_override(self, edge: impl Into<String>, expansion: Expansion) -> Self {
        let edge = edge.into();
        self.reconfigure(|config| {
            config.overrides.insert(edge, expansion);
        })
    }

    fn reconfigure(self, update: impl FnOnce(&mut InitsConfig)) -> Self {
        let mut config = Arc::unwrap_or_clone(self.config);
        update(&mut config);
        Self::new(config)
    }

    #[inline]
    pub fn config(&self) -> &InitsConfig {
        &self.config
    }

    /// Remaining eager hops on this chain; `None` means unbounded.
    #[inline]
    pub fn remaining_depth(&self) -> Option<usize> {
        self.remaining
    }

    /// Entity types under construction along this chain, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &str> {
        self.chain.iter().map(AsRef::as_ref)
    }

    /// Entity whose attributes are currently being built.
    pub fn owner(&self) -> Option<&str> {
        self.chain.last().map(AsRef::as_ref)
    }

    /// Marks `entity` as under construction. Idempotent for the current owner.
    pub fn entering(&self, entity: &str) -> Self {
        let mut next = self.clone();
        if next.owner() != Some(entity) {
            next.chain.push(Arc::from(entity));
        }
        next
    }

    /// Decides how the edge `edge` from the current owner to `target` is built.
    pub fn decide(&self, edge: &str, target: &str) -> Expansion {
        let qualified = self.qualified(edge);
        if let Some(expansion) = self.active_override(&qualified, edge) {
            return expansion;
        }
        let on_chain = self.chain.iter().any(|entity| entity.as_ref() == target);
        if on_chain || self.is_consumed(&qualified) {
            return Expansion::Deferred;
        }
        if self.config.default == Expansion::Deferred {
            return Expansion::Deferred;
        }
        if self.remaining == Some(0) {
            return Expansion::Deferred;
        }
        Expansion::Eager
    }

    /// Policy handed to an eagerly built child across `edge`.
    pub fn derive(&self, edge: &str, target: &str) -> Self {
        let mut next = self.clone();
        next.consumed.push(Arc::from(self.qualified(edge)));
        next.remaining = self.remaining.map(|depth| depth.saturating_sub(1));
        if next.owner() != Some(target) {
            next.chain.push(Arc::from(target));
        }
        next
    }

    /// Same configuration with the traversal state reset, as for a new root.
    pub fn fresh(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            remaining: self.config.max_depth,
            consumed: Vec::new(),
            chain: Vec::new(),
        }
    }

    fn qualified(&self, edge: &str) -> String {
        match self.owner() {
            Some(owner) => format!("{owner}.{edge}"),
            None => edge.to_string(),
        }
    }

    fn is_consumed(&self, qualified: &str) -> bool {
        self.consumed.iter().any(|edge| edge.as_ref() == qualified)
    }

    fn active_override(&self, qualified: &str, edge: &str) -> Option<Expansion> {
        if self.is_consumed(qualified) {
            return None;
        }
        self.config
            .overrides
            .get(qualified)
            .or_else(|| self.config.overrides.get(edge))
            .copied()
    }
}

/// Policies compare by configuration only; traversal state is not part of their identity.
impl PartialEq for PathInits {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_expands_two_hops() {
        let inits = PathInits::default().entering("A");
        assert_eq!(inits.remaining_depth(), Some(2));
        assert_eq!(inits.decide("b", "B"), Expansion::Eager);

        let b = inits.derive("b", "B");
        assert_eq!(b.remaining_depth(), Some(1));
        assert_eq!(b.owner(), Some("B"));
        assert_eq!(b.decide("c", "C"), Expansion::Eager);

        let c = b.derive("c", "C");
        assert_eq!(c.decide("d", "D"), Expansion::Deferred);
    }

    #[test]
    fn entity_on_chain_is_deferred() {
        let user = PathInits::direct(10).entering("User");
        assert_eq!(user.decide("manager", "User"), Expansion::Deferred);

        let loan = user.derive("loans", "Loan");
        assert_eq!(loan.decide("user", "User"), Expansion::Deferred);
        assert_eq!(loan.decide("book", "Book"), Expansion::Eager);
    }

    #[test]
    fn override_beats_default_and_depth() {
        let inits = PathInits::direct(0)
            .with_override("User.manager", Expansion::Eager)
            .entering("User");
        assert_eq!(inits.decide("manager", "User"), Expansion::Eager);
        assert_eq!(inits.decide("friends", "Person"), Expansion::Deferred);

        let deferred = PathInits::deferred()
            .with_override("friends", Expansion::Eager)
            .entering("User");
        assert_eq!(deferred.decide("friends", "Person"), Expansion::Eager);

        let vetoed = PathInits::direct(5)
            .with_override("loans", Expansion::Deferred)
            .entering("User");
        assert_eq!(vetoed.decide("loans", "Loan"), Expansion::Deferred);
    }

    #[test]
    fn override_is_consumed_along_the_chain() {
        let inits = PathInits::deferred()
            .with_override("Node.next", Expansion::Eager)
            .entering("Node");
        assert_eq!(inits.decide("next", "Node"), Expansion::Eager);
        let child = inits.derive("next", "Node");
        assert_eq!(child.owner(), Some("Node"));
        assert_eq!(child.decide("next", "Node"), Expansion::Deferred);
    }

    #[test]
    fn unknown_override_is_ignored() {
        let inits = PathInits::default()
            .with_override("Nope.missing", Expansion::Eager)
            .entering("A");
        assert_eq!(inits.decide("b", "B"), Expansion::Eager);
        assert_eq!(inits.decide("self_ref", "A"), Expansion::Deferred);
    }

    #[test]
    fn fresh_restores_budget_and_clears_chain() {
        let spent = PathInits::direct(1)
            .with_override("A.b", Expansion::Eager)
            .entering("A")
            .derive("b", "B");
        assert_eq!(spent.remaining_depth(), Some(0));

        let fresh = spent.fresh();
        assert_eq!(fresh.remaining_depth(), Some(1));
        assert_eq!(fresh.chain().count(), 0);
        assert_eq!(fresh.entering("A").decide("b", "B"), Expansion::Eager);
        assert_eq!(fresh, spent);
    }

    #[test]
    fn unbounded_depth_still_stops_on_cycles() {
        let inits = PathInits::direct(0).with_max_depth(None).entering("A");
        let b = inits.derive("b", "B");
        let c = b.derive("c", "C");
        assert_eq!(c.remaining_depth(), None);
        assert_eq!(c.decide("a", "A"), Expansion::Deferred);
        assert_eq!(c.decide("d", "D"), Expansion::Eager);
    }

    #[test]
    fn config_deserializes_from_toml() {
        let config: InitsConfig = toml::from_str(
            r#"
            default = "deferred"
            max_depth = 3

            [overrides]
            "User.user_loan_histories" = "eager"
            "#,
        )
        .unwrap();
        assert_eq!(config.default, Expansion::Deferred);
        assert_eq!(config.max_depth, Some(3));
        assert_eq!(config.overrides.get("User.user_loan_histories"), Some(&Expansion::Eager));

        let defaults: InitsConfig = toml::from_str("").unwrap();
        assert_eq!(defaults, InitsConfig::default());
        assert_eq!("lazy".parse::<Expansion>().unwrap(), Expansion::Deferred);
    }

    #[test]
    fn unbounded_depth_round_trips_through_toml() {
        let config = InitsConfig {
            max_depth: None,
            ..InitsConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("max_depth = \"unbounded\""));
        let reloaded: InitsConfig = toml::from_str(&text).unwrap();
        assert_eq!(reloaded.max_depth, None);

        let text = toml::to_string(&InitsConfig::default()).unwrap();
        let bounded: InitsConfig = toml::from_str(&text).unwrap();
        assert_eq!(bounded.max_depth, Some(DEFAULT_MAX_DEPTH));

        let named: InitsConfig = toml::from_str(r#"max_depth = "none""#).unwrap();
        assert_eq!(named.max_depth, None);
        assert!(toml::from_str::<InitsConfig>(r#"max_depth = "deep""#).is_err());
    }
}
