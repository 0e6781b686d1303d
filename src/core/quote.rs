//! Market data abstractions and core types

use crate::core::fund::Symbol;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteSource {
    Live,
    /// Live price with a yield substituted by the fallback policy.
    Partial,
    Fallback,
}

impl Display for QuoteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                QuoteSource::Live => "live",
                QuoteSource::Partial => "partial",
                QuoteSource::Fallback => "fallback",
            }
        )
    }
}

/// Current price and yield for a bond fund. Values are kept unrounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondQuote {
    pub symbol: Symbol,
    pub price: f64,
    /// Percent, e.g. `4.2` for 4.2%. `None` when the source had no yield.
    pub yield_pct: Option<f64>,
    /// Percent, when the source reports one.
    pub expense_ratio: Option<f64>,
    pub as_of: Option<DateTime<Utc>>,
    pub source: QuoteSource,
}

/// What to substitute when a quote cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// The fund's documented reference price and yield.
    #[default]
    Reference,
    /// Zero price and zero yield.
    Zero,
}

impl FallbackPolicy {
    pub fn quote_for(&self, symbol: Symbol) -> BondQuote {
        let info = symbol.info();
        let (price, expense_ratio) = match self {
            FallbackPolicy::Reference => (info.reference_price, Some(info.reference_expense_ratio)),
            FallbackPolicy::Zero => (0.0, None),
        };
        BondQuote {
            symbol,
            price,
            yield_pct: Some(self.yield_for(symbol)),
            expense_ratio,
            as_of: None,
            source: QuoteSource::Fallback,
        }
    }

    pub fn yield_for(&self, symbol: Symbol) -> f64 {
        match self {
            FallbackPolicy::Reference => symbol.info().reference_yield,
            FallbackPolicy::Zero => 0.0,
        }
    }

    /// Fills a missing yield on a fetched quote and marks it `Partial`.
    pub fn complete(&self, mut quote: BondQuote) -> BondQuote {
        if quote.yield_pct.is_none() {
            quote.yield_pct = Some(self.yield_for(quote.symbol));
            quote.source = QuoteSource::Partial;
        }
        quote
    }
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self, symbol: Symbol) -> Result<BondQuote>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_fallback_uses_catalog_values() {
        let quote = FallbackPolicy::Reference.quote_for(Symbol::BNDX);
        assert_eq!(quote.price, 48.75);
        assert_eq!(quote.yield_pct, Some(3.8));
        assert_eq!(quote.expense_ratio, Some(0.07));
        assert_eq!(quote.source, QuoteSource::Fallback);
    }

    #[test]
    fn test_zero_fallback() {
        let quote = FallbackPolicy::Zero.quote_for(Symbol::BND);
        assert_eq!(quote.price, 0.0);
        assert_eq!(quote.yield_pct, Some(0.0));
        assert!(quote.expense_ratio.is_none());
    }

    #[test]
    fn test_complete_fills_missing_yield_per_policy() {
        let fetched = BondQuote {
            symbol: Symbol::BND,
            price: 72.31,
            yield_pct: None,
            expense_ratio: None,
            as_of: None,
            source: QuoteSource::Live,
        };

        let zero = FallbackPolicy::Zero.complete(fetched.clone());
        assert_eq!(zero.price, 72.31);
        assert_eq!(zero.yield_pct, Some(0.0));
        assert_eq!(zero.source, QuoteSource::Partial);

        let reference = FallbackPolicy::Reference.complete(fetched.clone());
        assert_eq!(reference.yield_pct, Some(4.2));
        assert_eq!(reference.source, QuoteSource::Partial);

        let full = BondQuote {
            yield_pct: Some(3.85),
            ..fetched
        };
        assert_eq!(FallbackPolicy::Zero.complete(full.clone()), full);
    }

    #[test]
    fn test_fallback_policy_deserialization() {
        let policy: FallbackPolicy = serde_yaml::from_str("zero").unwrap();
        assert_eq!(policy, FallbackPolicy::Zero);
        let policy: FallbackPolicy = serde_yaml::from_str("reference").unwrap();
        assert_eq!(policy, FallbackPolicy::Reference);
    }
}
