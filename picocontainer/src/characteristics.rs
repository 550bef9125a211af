//! Per-registration properties controlling which [behaviors](crate::behavior) decorate a
//! component adapter.
//!
//! Behavior factories consume the characteristics they understand. Whatever is left after
//! decoration makes the registration fail, so typos in configuration don't go unnoticed.

use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// Default name of the guard component.
pub const DEFAULT_GUARD: &str = "guard";

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Characteristic {
    /// Store and reuse the first instance.
    Cache,
    NoCache,
    /// Store and reuse one instance per thread.
    ThreadCache,
    /// Make the component available only via its aliases.
    HideImpl,
    NoHideImpl,
    /// Serialize instance creation.
    Lock,
    NoLock,
    /// Instantiate when the container starts.
    Automatic,
    /// Require the named guard component to be resolvable before creating an instance.
    Guard(String),
    /// Ignore default characteristics of the container.
    None,
}

impl Characteristic {
    /// [Characteristic::Guard] with the default guard name.
    pub fn guard() -> Self {
        Self::Guard(DEFAULT_GUARD.to_string())
    }

    // Characteristics sharing a slot override each other.
    fn slot(&self) -> u8 {
        match self {
            Self::Cache | Self::NoCache | Self::ThreadCache => 0,
            Self::HideImpl | Self::NoHideImpl => 1,
            Self::Lock | Self::NoLock => 2,
            Self::Automatic => 3,
            Self::Guard(_) => 4,
            Self::None => 5,
        }
    }
}

impl Display for Characteristic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cache => f.write_str("cache"),
            Self::NoCache => f.write_str("no-cache"),
            Self::ThreadCache => f.write_str("thread-cache"),
            Self::HideImpl => f.write_str("hide-impl"),
            Self::NoHideImpl => f.write_str("no-hide-impl"),
            Self::Lock => f.write_str("lock"),
            Self::NoLock => f.write_str("no-lock"),
            Self::Automatic => f.write_str("automatic"),
            Self::Guard(guard) => write!(f, "guard({guard})"),
            Self::None => f.write_str("none"),
        }
    }
}

/// A set of [Characteristic]s with at most one entry per kind.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Characteristics(Vec<Characteristic>);

impl Characteristics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a characteristic, replacing any conflicting one (e.g. `Cache` replaces `NoCache`).
    pub fn with(mut self, characteristic: Characteristic) -> Self {
        self.insert(characteristic);
        self
    }

    pub fn insert(&mut self, characteristic: Characteristic) {
        let slot = characteristic.slot();
        self.0.retain(|existing| existing.slot() != slot);
        self.0.push(characteristic);
    }

    /// Returns a copy of this set overridden by given characteristics.
    pub fn merge(&self, overrides: &Characteristics) -> Self {
        overrides
            .0
            .iter()
            .cloned()
            .fold(self.clone(), |merged, characteristic| {
                merged.with(characteristic)
            })
    }

    #[inline]
    pub fn contains(&self, characteristic: &Characteristic) -> bool {
        self.0.contains(characteristic)
    }

    /// Removes (consumes) a characteristic, returning if it was present.
    pub fn remove(&mut self, characteristic: &Characteristic) -> bool {
        let count = self.0.len();
        self.0.retain(|existing| existing != characteristic);
        count != self.0.len()
    }

    /// Consumes a guard characteristic, returning the guard name.
    pub fn take_guard(&mut self) -> Option<String> {
        let position = self
            .0
            .iter()
            .position(|characteristic| matches!(characteristic, Characteristic::Guard(_)))?;

        match self.0.remove(position) {
            Characteristic::Guard(guard) => Some(guard),
            _ => None,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Characteristic> {
        self.0.iter()
    }
}

impl Display for Characteristics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.iter().join(", "))
    }
}

impl From<Characteristic> for Characteristics {
    fn from(value: Characteristic) -> Self {
        Self(vec![value])
    }
}

impl FromIterator<Characteristic> for Characteristics {
    fn from_iter<T: IntoIterator<Item = Characteristic>>(iter: T) -> Self {
        iter.into_iter().fold(Self::default(), Self::with)
    }
}

impl<const N: usize> From<[Characteristic; N]> for Characteristics {
    fn from(value: [Characteristic; N]) -> Self {
        value.into_iter().collect()
    }
}
