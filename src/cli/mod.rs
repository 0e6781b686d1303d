pub mod alloc;
pub mod funds;
pub mod interactive;
pub mod setup;
pub mod ui;

use crate::core::{BondQuote, QuoteProvider, Symbol};
use anyhow::Result;
use futures::future::join_all;
use std::collections::HashMap;

/// Fetches quotes for `symbols` concurrently. Failures are kept per symbol so
/// the caller can substitute fallbacks.
pub async fn fetch_quotes(
    provider: &(dyn QuoteProvider + Send + Sync),
    symbols: &[Symbol],
    show_progress: bool,
) -> HashMap<Symbol, Result<BondQuote>> {
    let pb = show_progress.then(|| {
        let pb = ui::new_progress_bar(symbols.len() as u64, true);
        pb.set_message("Fetching bond fund data...");
        pb
    });

    let quote_futures = symbols.iter().map(|symbol| {
        let pb_clone = pb.clone();
        async move {
            let res = provider.fetch_quote(*symbol).await;
            if let Some(pb) = pb_clone {
                pb.inc(1);
            }
            (*symbol, res)
        }
    });

    let quotes = join_all(quote_futures).await.into_iter().collect();
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    quotes
}

#[cfg(test)]
pub(crate) mod test_utils {
    use crate::core::{BondQuote, QuoteProvider, QuoteSource, Symbol};
    use anyhow::anyhow;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves fixed yields; symbols without an entry fail.
    pub struct MockQuoteProvider {
        yields: HashMap<Symbol, f64>,
        pub calls: AtomicUsize,
    }

    impl MockQuoteProvider {
        pub fn new(yields: &[(Symbol, f64)]) -> Self {
            Self {
                yields: yields.iter().copied().collect(),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl QuoteProvider for MockQuoteProvider {
        async fn fetch_quote(&self, symbol: Symbol) -> anyhow::Result<BondQuote> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let yield_pct = self
                .yields
                .get(&symbol)
                .copied()
                .ok_or_else(|| anyhow!("No price data found for symbol: {symbol}"))?;
            Ok(BondQuote {
                symbol,
                price: 10.0,
                yield_pct: Some(yield_pct),
                expense_ratio: None,
                as_of: None,
                source: QuoteSource::Live,
            })
        }
    }
}
