//! Core business logic abstractions

pub mod allocation;
pub mod analytics;
pub mod cache;
pub mod config;
pub mod fund;
pub mod log;
pub mod quote;

// Re-export main types for cleaner imports
pub use allocation::{AllocationCheck, AllocationInput};
pub use analytics::{AllocationReport, AllocationRow, PortfolioSummary, ReportSettings};
pub use fund::Symbol;
pub use quote::{BondQuote, FallbackPolicy, QuoteProvider, QuoteSource};
