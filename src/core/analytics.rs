//! Joins allocations with quotes and estimates portfolio income.
use crate::core::allocation::{self, AllocationCheck, AllocationInput};
use crate::core::fund::Symbol;
use crate::core::quote::{BondQuote, FallbackPolicy, QuoteSource};
use anyhow::Result;
use std::collections::HashMap;
use tracing::{debug, warn};

/// One fund's share of the investment, priced with its quote.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRow {
    pub symbol: Symbol,
    pub percent: f64,
    pub dollar_amount: f64,
    pub price: f64,
    pub yield_pct: f64,
    pub estimated_annual_income: f64,
    pub source: QuoteSource,
    pub fetch_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PortfolioSummary {
    pub total_percent: f64,
    pub weighted_yield: f64,
    pub total_estimated_annual_income: f64,
}

/// Everything the presentation layer needs for one render.
#[derive(Debug, Clone)]
pub struct AllocationReport {
    pub investment_amount: f64,
    pub check: AllocationCheck,
    pub rows: Vec<AllocationRow>,
    pub summary: PortfolioSummary,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ReportSettings {
    pub tolerance: f64,
    pub fallback: FallbackPolicy,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            tolerance: allocation::DEFAULT_TOLERANCE,
            fallback: FallbackPolicy::default(),
        }
    }
}

/// Builds one row per fund with a non-zero allocation, in catalog order.
///
/// A missing or failed quote is replaced by the `fallback` quote for that fund
/// and the failure message is kept on the row. A fetched quote without a yield
/// keeps its price and takes the `fallback` yield.
pub fn build_rows(
    allocations: &AllocationInput,
    quotes: &HashMap<Symbol, Result<BondQuote>>,
    total_investment: f64,
    fallback: FallbackPolicy,
) -> Vec<AllocationRow> {
    allocations
        .iter()
        .filter(|(_, percent)| *percent > 0.0)
        .map(|(symbol, percent)| {
            let (quote, fetch_error) = match quotes.get(&symbol) {
                Some(Ok(quote)) if quote.yield_pct.is_none() => {
                    debug!("No yield in quote for {}, applying {:?}", symbol, fallback);
                    (
                        fallback.complete(quote.clone()),
                        Some(format!("Yield not available for {symbol}")),
                    )
                }
                Some(Ok(quote)) => (quote.clone(), None),
                Some(Err(e)) => {
                    debug!("Quote fetch error for {}: {}", symbol, e);
                    (fallback.quote_for(symbol), Some(e.to_string()))
                }
                None => {
                    debug!("Quote for {} not found in fetched results", symbol);
                    (
                        fallback.quote_for(symbol),
                        Some(format!("Quote not available for {symbol}")),
                    )
                }
            };

            let dollar_amount = total_investment * percent / 100.0;
            let yield_pct = quote.yield_pct.unwrap_or_default();
            AllocationRow {
                symbol,
                percent,
                dollar_amount,
                price: quote.price,
                yield_pct,
                estimated_annual_income: dollar_amount * yield_pct / 100.0,
                source: quote.source,
                fetch_error,
            }
        })
        .collect()
}

/// Aggregates rows into portfolio totals. Yield is weighted by the entered
/// percentages as-is, without renormalising to 100%.
pub fn summarize(rows: &[AllocationRow]) -> PortfolioSummary {
    rows.iter()
        .fold(PortfolioSummary::default(), |acc, row| PortfolioSummary {
            total_percent: acc.total_percent + row.percent,
            weighted_yield: acc.weighted_yield + row.percent / 100.0 * row.yield_pct,
            total_estimated_annual_income: acc.total_estimated_annual_income
                + row.estimated_annual_income,
        })
}

/// Runs validation, row building and summarising for one set of inputs.
pub fn compute_report(
    allocations: &AllocationInput,
    quotes: &HashMap<Symbol, Result<BondQuote>>,
    total_investment: f64,
    settings: &ReportSettings,
) -> AllocationReport {
    let check = allocation::validate(allocations, settings.tolerance);
    let warning = if check.is_valid {
        None
    } else {
        let message = format!("Total allocation is {:.2}%, expected 100%", check.total);
        warn!(total = check.total, "{}", message);
        Some(message)
    };

    let rows = build_rows(allocations, quotes, total_investment, settings.fallback);
    let summary = summarize(&rows);
    debug!(?summary, rows = rows.len(), "Computed allocation report");

    AllocationReport {
        investment_amount: total_investment,
        check,
        rows,
        summary,
        warning,
    }
}

/// A fund's position on the maturity ladder.
#[derive(Debug, Clone, PartialEq)]
pub struct MaturityBucket {
    pub symbol: Symbol,
    pub maturity_range: &'static str,
    pub midpoint: f64,
    pub percent: f64,
    pub dollar_amount: f64,
    pub estimated_annual_income: f64,
}

/// Orders the report rows from shortest to longest maturity.
pub fn maturity_profile(rows: &[AllocationRow]) -> Vec<MaturityBucket> {
    let mut buckets: Vec<MaturityBucket> = rows
        .iter()
        .map(|row| {
            let info = row.symbol.info();
            MaturityBucket {
                symbol: row.symbol,
                maturity_range: info.maturity_range,
                midpoint: info.maturity_midpoint(),
                percent: row.percent,
                dollar_amount: row.dollar_amount,
                estimated_annual_income: row.estimated_annual_income,
            }
        })
        .collect();
    buckets.sort_by(|a, b| a.midpoint.total_cmp(&b.midpoint));
    buckets
}
