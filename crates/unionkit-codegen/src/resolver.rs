//! Per-framework eligibility decisions.
//!
//! The decision for each framework depends only on the declaration's facts,
//! never on the outcome for another framework.

use crate::markers::MarkerFacts;
use crate::types::{Framework, PerFramework};
use std::fmt;

/// Why a (type, framework) pair produces no fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The type has no usable factory marker.
    NotEligible,
    /// The factory marker's `UseForSerialization` excludes the framework.
    FrameworkNotEnabled,
    /// The type already carries the framework's wiring marker.
    AlreadyWired,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::NotEligible => "not eligible",
            SkipReason::FrameworkNotEnabled => "framework not enabled",
            SkipReason::AlreadyWired => "already wired",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Eligible,
    Skipped(SkipReason),
}

impl Decision {
    pub fn is_eligible(self) -> bool {
        self == Decision::Eligible
    }
}

/// Decide a single framework.
pub fn decide(facts: &MarkerFacts, framework: Framework) -> Decision {
    let Some(factory) = &facts.factory else {
        return Decision::Skipped(SkipReason::NotEligible);
    };
    if !factory.enabled_frameworks.contains(framework.flag()) {
        Decision::Skipped(SkipReason::FrameworkNotEnabled)
    } else if facts.wiring.is_wired(framework) {
        Decision::Skipped(SkipReason::AlreadyWired)
    } else {
        Decision::Eligible
    }
}

/// Decide every framework.
pub fn resolve(facts: &MarkerFacts) -> PerFramework<Decision> {
    PerFramework::from_fn(|framework| decide(facts, framework))
}
