//! Ordered retrieval fallbacks
//!
//! Each step names what to query and when it runs, judged against the
//! number of candidates collected so far. The retriever walks the chain
//! top to bottom.

use std::fmt;

use crate::models::SourceTier;

/// When a step is allowed to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Always,
    /// Collected fewer than `min_results`
    BelowMinimum,
    /// Collected fewer than `target_results`
    BelowTarget,
    /// Nothing collected at all
    Empty,
}

impl Gate {
    pub fn allows(self, collected: usize, min_results: usize, target_results: usize) -> bool {
        match self {
            Self::Always => true,
            Self::BelowMinimum => collected < min_results,
            Self::BelowTarget => collected < target_results,
            Self::Empty => collected == 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Every source of one tier, site-restricted, chunked by tier concurrency
    Tier(SourceTier),
    /// Plain query text against each distinct provider until one returns results
    Unrestricted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    pub kind: StrategyKind,
    pub gate: Gate,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            StrategyKind::Tier(tier) => write!(f, "{tier} tier"),
            StrategyKind::Unrestricted => f.write_str("unrestricted query"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackChain {
    steps: Vec<Strategy>,
}

impl Default for FallbackChain {
    fn default() -> Self {
        Self {
            steps: vec![
                Strategy {
                    kind: StrategyKind::Tier(SourceTier::Primary),
                    gate: Gate::Always,
                },
                Strategy {
                    kind: StrategyKind::Tier(SourceTier::Secondary),
                    gate: Gate::BelowMinimum,
                },
                Strategy {
                    kind: StrategyKind::Tier(SourceTier::Tertiary),
                    gate: Gate::BelowTarget,
                },
                Strategy {
                    kind: StrategyKind::Unrestricted,
                    gate: Gate::Empty,
                },
            ],
        }
    }
}

impl FallbackChain {
    pub fn new(steps: Vec<Strategy>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Strategy] {
        &self.steps
    }
}
