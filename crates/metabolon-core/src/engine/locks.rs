use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A class of state mutation that can be switched off independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockCategory {
    Molecules,
    Enzymes,
    Genes,
    Reactions,
    Mutations,
    Evolution,
}

impl LockCategory {
    pub const ALL: [LockCategory; 6] = [
        LockCategory::Molecules,
        LockCategory::Enzymes,
        LockCategory::Genes,
        LockCategory::Reactions,
        LockCategory::Mutations,
        LockCategory::Evolution,
    ];

    #[inline]
    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LockCategory::Molecules => "molecules",
            LockCategory::Enzymes => "enzymes",
            LockCategory::Genes => "genes",
            LockCategory::Reactions => "reactions",
            LockCategory::Mutations => "mutations",
            LockCategory::Evolution => "evolution",
        }
    }
}

impl fmt::Display for LockCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown lock category '{}' (expected one of: molecules, enzymes, genes, reactions, mutations, evolution)",
            self.0
        )
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for LockCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LockCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Set of locked categories. A locked category produces empty results from its
/// calculator while the rest of the tick keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryLocks {
    bits: u8,
}

impl CategoryLocks {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        let mut locks = Self::default();
        for category in LockCategory::ALL {
            locks.bits |= category.bit();
        }
        locks
    }

    /// Every category locked except `category`.
    pub fn isolating(category: LockCategory) -> Self {
        let mut locks = Self::all();
        locks.bits &= !category.bit();
        locks
    }

    #[inline]
    pub fn is_locked(&self, category: LockCategory) -> bool {
        self.bits & category.bit() != 0
    }

    /// Returns `true` when the state actually changed.
    pub fn set(&mut self, category: LockCategory, locked: bool) -> bool {
        let before = self.bits;
        if locked {
            self.bits |= category.bit();
        } else {
            self.bits &= !category.bit();
        }
        before != self.bits
    }

    pub fn locked(&self) -> impl Iterator<Item = LockCategory> + '_ {
        LockCategory::ALL
            .into_iter()
            .filter(move |c| self.is_locked(*c))
    }
}

pub type LockObserver = Box<dyn Fn(LockCategory, bool) + Send + Sync>;

/// Notifies a registered observer whenever a lock changes.
#[derive(Default)]
pub struct LockNotifier {
    observer: Option<LockObserver>,
}

impl LockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(observer: LockObserver) -> Self {
        Self {
            observer: Some(observer),
        }
    }

    #[inline]
    pub fn notify(&self, category: LockCategory, locked: bool) {
        if let Some(cb) = &self.observer {
            cb(category, locked);
        }
    }
}
