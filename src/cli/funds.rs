use super::ui;
use crate::core::{BondQuote, FallbackPolicy, QuoteProvider, Symbol};
use anyhow::Result;
use comfy_table::Cell;
use std::collections::HashMap;
use tracing::debug;

/// Builds the fund information table. Funds whose quote failed, or came
/// back without a yield, show the `fallback` values.
pub fn display_funds_table(
    quotes: &HashMap<Symbol, Result<BondQuote>>,
    fallback: FallbackPolicy,
) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Fund"),
        ui::header_cell("Name"),
        ui::header_cell("Maturity (years)"),
        ui::header_cell("Credit Quality"),
        ui::header_cell("Price ($)"),
        ui::header_cell("Expense Ratio (%)"),
        ui::header_cell("Yield (%)"),
        ui::header_cell("Data"),
    ]);

    for symbol in Symbol::ALL {
        let info = symbol.info();
        let quote = match quotes.get(&symbol) {
            Some(Ok(quote)) => fallback.complete(quote.clone()),
            Some(Err(e)) => {
                debug!("Showing fallback for {}: {}", symbol, e);
                fallback.quote_for(symbol)
            }
            None => fallback.quote_for(symbol),
        };

        table.add_row(vec![
            Cell::new(symbol),
            Cell::new(info.name),
            ui::number_cell(info.maturity_range.to_string()),
            Cell::new(info.credit_quality),
            ui::number_cell(format!("{:.2}", quote.price)),
            ui::format_optional_cell(quote.expense_ratio, |er| format!("{er:.2}")),
            ui::number_cell(format!("{:.2}", quote.yield_pct.unwrap_or_default())),
            ui::source_cell(quote.source),
        ]);
    }

    format!(
        "{}\n\n{table}",
        ui::style_text("Current Bond Fund Information", ui::StyleType::Title)
    )
}

pub async fn run(
    provider: &(dyn QuoteProvider + Send + Sync),
    fallback: FallbackPolicy,
) -> Result<()> {
    let quotes = super::fetch_quotes(provider, &Symbol::ALL, true).await;
    println!("{}", display_funds_table(&quotes, fallback));
    Ok(())
}
