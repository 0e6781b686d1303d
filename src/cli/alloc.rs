use super::ui;
use crate::core::allocation::{self, AllocationInput};
use crate::core::analytics::{self, AllocationReport, ReportSettings};
use crate::core::config::{AppConfig, check_investment_amount};
use crate::core::{QuoteProvider, QuoteSource, Symbol};
use anyhow::Result;
use comfy_table::Cell;

/// Amount and percentages for one report, after CLI overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocRequest {
    pub investment_amount: f64,
    pub allocation: AllocationInput,
}

impl AllocRequest {
    /// Starts from the config and applies `--amount` and `SYM=PCT` overrides.
    pub fn from_config(
        config: &AppConfig,
        amount: Option<f64>,
        assignments: &[String],
    ) -> Result<Self> {
        let investment_amount = amount.unwrap_or(config.investment_amount);
        check_investment_amount(investment_amount)?;

        let mut allocation = config.allocation_input()?;
        for assignment in assignments {
            let (symbol, percent) = allocation::parse_assignment(assignment)?;
            allocation.set(symbol, percent)?;
        }

        Ok(Self {
            investment_amount,
            allocation,
        })
    }
}

impl AllocationReport {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Fund"),
            ui::header_cell("Allocation (%)"),
            ui::header_cell("Amount"),
            ui::header_cell("Price ($)"),
            ui::header_cell("Yield (%)"),
            ui::header_cell("Est. Annual Income"),
            ui::header_cell("Data"),
        ]);

        for row in &self.rows {
            table.add_row(vec![
                Cell::new(row.symbol),
                ui::number_cell(format!("{:.2}", row.percent)),
                ui::number_cell(ui::format_currency(row.dollar_amount)),
                ui::number_cell(format!("{:.2}", row.price)),
                ui::number_cell(format!("{:.2}", row.yield_pct)),
                ui::number_cell(ui::format_currency(row.estimated_annual_income)),
                ui::source_cell(row.source),
            ]);
        }

        let mut output = format!(
            "Allocation for {}\n\n",
            ui::style_text(
                &ui::format_currency(self.investment_amount),
                ui::StyleType::Title
            )
        );

        if self.rows.is_empty() {
            output.push_str(&ui::style_text(
                "No funds have a non-zero allocation.",
                ui::StyleType::Subtle,
            ));
        } else {
            output.push_str(&table.to_string());
        }

        if let Some(warning) = &self.warning {
            output.push_str(&format!(
                "\n\n{} {}",
                ui::style_text("Warning:", ui::StyleType::Warning),
                warning
            ));
        }

        let fallbacks: Vec<String> = self
            .rows
            .iter()
            .filter(|r| r.source != QuoteSource::Live)
            .map(|r| r.symbol.to_string())
            .collect();
        if !fallbacks.is_empty() {
            output.push_str(&format!(
                "\n\n{}",
                ui::style_text(
                    &format!(
                        "Live data unavailable for {}; fallback values used.",
                        fallbacks.join(", ")
                    ),
                    ui::StyleType::Subtle
                )
            ));
        }

        output.push_str(&format!(
            "\n\n{} {}\n{} {}\n{} {}",
            ui::style_text("Total Allocation:", ui::StyleType::TotalLabel),
            format!("{:.2}%", self.summary.total_percent),
            ui::style_text("Estimated Annual Yield:", ui::StyleType::TotalLabel),
            ui::style_text(
                &format!("{:.2}%", self.summary.weighted_yield),
                ui::StyleType::TotalValue
            ),
            ui::style_text("Estimated Annual Income:", ui::StyleType::TotalLabel),
            ui::style_text(
                &ui::format_currency(self.summary.total_estimated_annual_income),
                ui::StyleType::TotalValue
            ),
        ));

        output
    }

    /// The detail table followed by the maturity profile, when any fund is
    /// allocated.
    pub fn display_full(&self) -> String {
        let mut output = self.display_as_table();
        if !self.rows.is_empty() {
            output.push_str(&format!(
                "\n\n{}\n{}",
                ui::separator(),
                self.display_maturity_profile()
            ));
        }
        output
    }

    /// Funds ordered from shortest to longest maturity.
    pub fn display_maturity_profile(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Fund"),
            ui::header_cell("Maturity (years)"),
            ui::header_cell("Allocation"),
            ui::header_cell("Amount"),
            ui::header_cell("Est. Annual Income"),
        ]);

        for bucket in analytics::maturity_profile(&self.rows) {
            table.add_row(vec![
                Cell::new(bucket.symbol),
                ui::number_cell(bucket.maturity_range.to_string()),
                ui::format_percentage_cell(bucket.percent),
                ui::number_cell(ui::format_currency(bucket.dollar_amount)),
                ui::number_cell(ui::format_currency(bucket.estimated_annual_income)),
            ]);
        }

        format!(
            "{}\n\n{table}",
            ui::style_text("Maturity Profile", ui::StyleType::Title)
        )
    }
}

/// Fetches quotes for the funds in `request` and computes the report.
pub async fn build_report(
    request: &AllocRequest,
    provider: &(dyn QuoteProvider + Send + Sync),
    settings: &ReportSettings,
    show_progress: bool,
) -> AllocationReport {
    let symbols: Vec<Symbol> = request
        .allocation
        .iter()
        .filter(|(_, percent)| *percent > 0.0)
        .map(|(symbol, _)| symbol)
        .collect();
    let quotes = super::fetch_quotes(provider, &symbols, show_progress).await;
    analytics::compute_report(
        &request.allocation,
        &quotes,
        request.investment_amount,
        settings,
    )
}

pub async fn run(
    request: &AllocRequest,
    provider: &(dyn QuoteProvider + Send + Sync),
    settings: &ReportSettings,
) -> Result<()> {
    let report = build_report(request, provider, settings, true).await;
    println!("{}", report.display_full());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::test_utils::MockQuoteProvider;
    use crate::core::FallbackPolicy;

    fn example_request() -> AllocRequest {
        AllocRequest {
            investment_amount: 1_000_000.0,
            allocation: AllocationInput::from_entries([
                (Symbol::BND, 35.0),
                (Symbol::BNDX, 30.0),
                (Symbol::VFIDX, 20.0),
                (Symbol::VFSUX, 15.0),
            ])
            .unwrap(),
        }
    }

    #[test]
    fn test_request_applies_overrides() {
        let config: AppConfig =
            serde_yaml::from_str("investment_amount: 5000\nallocations:\n  BND: 100\n").unwrap();
        let request = AllocRequest::from_config(
            &config,
            Some(20_000.0),
            &["BND=60".to_string(), "vbil=40".to_string()],
        )
        .unwrap();
        assert_eq!(request.investment_amount, 20_000.0);
        assert_eq!(request.allocation.get(Symbol::BND), 60.0);
        assert_eq!(request.allocation.get(Symbol::VBIL), 40.0);

        let request = AllocRequest::from_config(&config, None, &[]).unwrap();
        assert_eq!(request.investment_amount, 5_000.0);
    }

    #[test]
    fn test_request_rejects_bad_input() {
        let config = AppConfig::default();
        assert!(AllocRequest::from_config(&config, Some(0.0), &[]).is_err());
        assert!(AllocRequest::from_config(&config, None, &["BND".to_string()]).is_err());
        assert!(AllocRequest::from_config(&config, None, &["BND=101".to_string()]).is_err());
    }

    #[tokio::test]
    async fn test_build_report_only_fetches_allocated_funds() {
        let provider = MockQuoteProvider::new(&[
            (Symbol::BND, 4.0),
            (Symbol::BNDX, 3.5),
            (Symbol::VFIDX, 3.0),
            (Symbol::VFSUX, 2.5),
        ]);
        let report =
            build_report(&example_request(), &provider, &ReportSettings::default(), false).await;

        assert_eq!(provider.call_count(), 4);
        assert_eq!(report.rows.len(), 4);
        assert!((report.summary.weighted_yield - 3.425).abs() < 1e-9);
        assert!((report.summary.total_estimated_annual_income - 34_250.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_report_display_marks_fallback_and_warning() {
        let provider = MockQuoteProvider::new(&[(Symbol::BND, 4.0)]);
        let settings = ReportSettings {
            tolerance: 0.01,
            fallback: FallbackPolicy::Reference,
        };
        let request = AllocRequest {
            investment_amount: 10_000.0,
            allocation: AllocationInput::from_entries([(Symbol::BND, 50.0), (Symbol::VGUS, 40.0)])
                .unwrap(),
        };

        let report = build_report(&request, &provider, &settings, false).await;
        let output = console::strip_ansi_codes(&report.display_as_table()).to_string();

        assert!(output.contains("Total allocation is 90.00%, expected 100%"));
        assert!(output.contains("Live data unavailable for VGUS"));
        assert!(output.contains("fallback"));
        assert!(!output.contains("VBIL"));

        let full = console::strip_ansi_codes(&report.display_full()).to_string();
        assert!(full.starts_with(&output));
        assert!(full.contains("Maturity Profile"));

        let profile = console::strip_ansi_codes(&report.display_maturity_profile()).to_string();
        let vgus = profile.find("VGUS").unwrap();
        let bnd = profile.find("BND").unwrap();
        assert!(vgus < bnd, "shorter maturity should come first");
    }

    #[tokio::test]
    async fn test_run_with_mock_provider() {
        let provider = MockQuoteProvider::new(&[(Symbol::BND, 4.0)]);
        let result = run(&example_request(), &provider, &ReportSettings::default()).await;
        assert!(result.is_ok());
    }
}
