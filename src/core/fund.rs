//! The fixed catalog of bond funds the planner allocates across.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Symbol {
    #[serde(alias = "bnd")]
    BND,
    #[serde(alias = "bndx")]
    BNDX,
    #[serde(alias = "vfidx")]
    VFIDX,
    #[serde(alias = "vfsux")]
    VFSUX,
    #[serde(alias = "vgus")]
    VGUS,
    #[serde(alias = "vbil")]
    VBIL,
}

impl Symbol {
    /// All catalog symbols in display order.
    pub const ALL: [Symbol; 6] = [
        Symbol::BND,
        Symbol::BNDX,
        Symbol::VFIDX,
        Symbol::VFSUX,
        Symbol::VGUS,
        Symbol::VBIL,
    ];

    pub fn ticker(&self) -> &'static str {
        match self {
            Symbol::BND => "BND",
            Symbol::BNDX => "BNDX",
            Symbol::VFIDX => "VFIDX",
            Symbol::VFSUX => "VFSUX",
            Symbol::VGUS => "VGUS",
            Symbol::VBIL => "VBIL",
        }
    }

    /// Static reference data for this fund.
    pub fn info(&self) -> &'static FundInfo {
        match self {
            Symbol::BND => &BND_INFO,
            Symbol::BNDX => &BNDX_INFO,
            Symbol::VFIDX => &VFIDX_INFO,
            Symbol::VFSUX => &VFSUX_INFO,
            Symbol::VGUS => &VGUS_INFO,
            Symbol::VBIL => &VBIL_INFO,
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ticker())
    }
}

impl FromStr for Symbol {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        Symbol::ALL
            .into_iter()
            .find(|sym| sym.ticker() == wanted)
            .ok_or_else(|| anyhow!("Unknown bond fund symbol: {}", s.trim()))
    }
}

/// Reference data for a fund. The price, yield and expense ratio are the
/// documented values used when live data is unavailable.
#[derive(Debug)]
pub struct FundInfo {
    pub name: &'static str,
    /// Range of average maturity in years, e.g. `"7-8"`.
    pub maturity_range: &'static str,
    pub credit_quality: &'static str,
    pub reference_price: f64,
    /// Percent, e.g. `4.2` for 4.2%.
    pub reference_yield: f64,
    /// Percent, e.g. `0.03` for 0.03%.
    pub reference_expense_ratio: f64,
}

impl FundInfo {
    /// Midpoint of the maturity range in years. A single value is its own
    /// midpoint; an unparsable range sorts as zero.
    pub fn maturity_midpoint(&self) -> f64 {
        let bounds: Vec<f64> = self
            .maturity_range
            .split('-')
            .filter_map(|part| part.trim().parse::<f64>().ok())
            .collect();
        match bounds.as_slice() {
            [low, high] => (low + high) / 2.0,
            [single] => *single,
            _ => 0.0,
        }
    }
}

static BND_INFO: FundInfo = FundInfo {
    name: "Vanguard Total Bond Market ETF",
    maturity_range: "7-8",
    credit_quality: "Mixed Investment Grade",
    reference_price: 72.50,
    reference_yield: 4.2,
    reference_expense_ratio: 0.03,
};

static BNDX_INFO: FundInfo = FundInfo {
    name: "Vanguard Total International Bond ETF",
    maturity_range: "8-9",
    credit_quality: "Mixed Investment Grade",
    reference_price: 48.75,
    reference_yield: 3.8,
    reference_expense_ratio: 0.07,
};

static VFIDX_INFO: FundInfo = FundInfo {
    name: "Vanguard Intermediate-Term Investment-Grade Fund",
    maturity_range: "5-6",
    credit_quality: "Investment Grade",
    reference_price: 9.40,
    reference_yield: 4.8,
    reference_expense_ratio: 0.10,
};

static VFSUX_INFO: FundInfo = FundInfo {
    name: "Vanguard Short-Term Investment-Grade Fund",
    maturity_range: "2-3",
    credit_quality: "Investment Grade",
    reference_price: 9.60,
    reference_yield: 4.5,
    reference_expense_ratio: 0.10,
};

static VGUS_INFO: FundInfo = FundInfo {
    name: "Vanguard Ultra-Short Treasury ETF",
    maturity_range: "0-1",
    credit_quality: "U.S. Treasury",
    reference_price: 60.25,
    reference_yield: 4.3,
    reference_expense_ratio: 0.07,
};

static VBIL_INFO: FundInfo = FundInfo {
    name: "Vanguard Ultra-Short Treasury Bills ETF",
    maturity_range: "0-0.25",
    credit_quality: "U.S. Treasury Bills",
    reference_price: 50.80,
    reference_yield: 4.0,
    reference_expense_ratio: 0.07,
};
