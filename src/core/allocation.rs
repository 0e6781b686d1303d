//! User-entered allocation percentages and their validation.

use crate::core::fund::Symbol;
use anyhow::{Context, Result, anyhow, bail};
use std::collections::BTreeMap;

/// Default allowed distance from 100%, in percentage points.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

// Slack for binary representation error, e.g. 100.01 - 100.0 > 0.01 in f64.
const FLOAT_SLACK: f64 = 1e-9;

/// Percent per catalog symbol. Every symbol is always present.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationInput {
    percents: BTreeMap<Symbol, f64>,
}

impl AllocationInput {
    /// An allocation with every fund at 0%.
    pub fn empty() -> Self {
        Self {
            percents: Symbol::ALL.into_iter().map(|s| (s, 0.0)).collect(),
        }
    }

    /// Builds an allocation from the given entries; symbols not listed are 0%.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Symbol, f64)>,
    {
        let mut input = Self::empty();
        for (symbol, percent) in entries {
            input.set(symbol, percent)?;
        }
        Ok(input)
    }

    pub fn set(&mut self, symbol: Symbol, percent: f64) -> Result<()> {
        check_percent(symbol, percent)?;
        self.percents.insert(symbol, percent);
        Ok(())
    }

    pub fn get(&self, symbol: Symbol) -> f64 {
        self.percents.get(&symbol).copied().unwrap_or(0.0)
    }

    /// Iterates in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, f64)> + '_ {
        self.percents.iter().map(|(s, p)| (*s, *p))
    }

    pub fn total(&self) -> f64 {
        self.percents.values().sum()
    }
}

impl Default for AllocationInput {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationCheck {
    pub total: f64,
    pub is_valid: bool,
}

/// Sums the percentages and checks the total is 100 within `tolerance`.
pub fn validate(allocations: &AllocationInput, tolerance: f64) -> AllocationCheck {
    let total = allocations.total();
    AllocationCheck {
        total,
        is_valid: (total - 100.0).abs() <= tolerance + FLOAT_SLACK,
    }
}

/// Parses a `SYMBOL=PERCENT` assignment, e.g. `BND=35` or `vfidx = 12.5`.
pub fn parse_assignment(text: &str) -> Result<(Symbol, f64)> {
    let (symbol, percent) = text
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected SYMBOL=PERCENT, got '{}'", text.trim()))?;
    let symbol: Symbol = symbol.parse()?;
    let percent: f64 = percent
        .trim()
        .trim_end_matches('%')
        .parse()
        .with_context(|| format!("Invalid percentage for {symbol}: '{}'", percent.trim()))?;
    check_percent(symbol, percent)?;
    Ok((symbol, percent))
}

fn check_percent(symbol: Symbol, percent: f64) -> Result<()> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        bail!("Allocation for {symbol} must be between 0 and 100, got {percent}");
    }
    Ok(())
}
