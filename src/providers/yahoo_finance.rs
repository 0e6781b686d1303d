use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::core::cache::Cache;
use crate::core::fund::Symbol;
use crate::core::quote::{BondQuote, QuoteProvider, QuoteSource};

/// Fetches fund quotes from the Yahoo Finance chart and quote summary APIs.
///
/// The price comes from the chart endpoint and is required. Yield and
/// expense ratio come from the quote summary; when that call fails or a field
/// is absent, the field is left empty for the fallback policy to fill.
pub struct YahooQuoteProvider {
    base_url: String,
    client: reqwest::Client,
    cache: Arc<Cache<Symbol, BondQuote>>,
}

impl YahooQuoteProvider {
    pub fn new(base_url: &str, cache: Arc<Cache<Symbol, BondQuote>>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("bondalloc/0.1")
            .build()?;
        Ok(YahooQuoteProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            cache,
        })
    }

    async fn fetch_chart(&self, symbol: Symbol) -> Result<ChartMeta> {
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range=1d",
            self.base_url, symbol
        );
        debug!("Requesting price data from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {}", e, symbol))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;
        let data: ChartResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse price response for {}: {}", symbol, e))?;

        data.chart
            .result
            .into_iter()
            .next()
            .map(|item| item.meta)
            .ok_or_else(|| anyhow!("No price data found for symbol: {}", symbol))
    }

    async fn fetch_summary(&self, symbol: Symbol) -> Result<SummaryItem> {
        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules=summaryDetail,fundProfile",
            self.base_url, symbol
        );
        debug!("Requesting yield data from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {}", e, symbol))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let data = response.json::<SummaryResponse>().await?;
        data.quote_summary
            .result
            .and_then(|items| items.into_iter().next())
            .ok_or_else(|| anyhow!("No summary data found for symbol: {}", symbol))
    }
}

#[derive(Deserialize, Debug)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Vec<ChartItem>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    meta: ChartMeta,
}

#[derive(Deserialize, Debug)]
struct ChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: f64,
    #[serde(alias = "regularMarketTime")]
    regular_market_time: Option<i64>,
}

#[derive(Deserialize, Debug)]
struct SummaryResponse {
    #[serde(alias = "quoteSummary")]
    quote_summary: SummaryResult,
}

#[derive(Deserialize, Debug)]
struct SummaryResult {
    result: Option<Vec<SummaryItem>>,
}

#[derive(Deserialize, Debug, Default)]
struct SummaryItem {
    #[serde(alias = "summaryDetail")]
    summary_detail: Option<SummaryDetail>,
    #[serde(alias = "fundProfile")]
    fund_profile: Option<FundProfile>,
}

#[derive(Deserialize, Debug)]
struct SummaryDetail {
    #[serde(rename = "yield")]
    yield_value: Option<RawValue>,
}

#[derive(Deserialize, Debug)]
struct FundProfile {
    #[serde(alias = "feesExpensesInvestment")]
    fees_expenses_investment: Option<FeesExpenses>,
}

#[derive(Deserialize, Debug)]
struct FeesExpenses {
    #[serde(alias = "annualReportExpenseRatio")]
    annual_report_expense_ratio: Option<RawValue>,
}

#[derive(Deserialize, Debug)]
struct RawValue {
    raw: Option<f64>,
}

impl SummaryItem {
    /// Yield as a percent.
    fn yield_pct(&self) -> Option<f64> {
        self.summary_detail
            .as_ref()
            .and_then(|d| d.yield_value.as_ref())
            .and_then(|v| v.raw)
            .map(|fraction| fraction * 100.0)
    }

    /// Expense ratio as a percent.
    fn expense_ratio(&self) -> Option<f64> {
        self.fund_profile
            .as_ref()
            .and_then(|p| p.fees_expenses_investment.as_ref())
            .and_then(|f| f.annual_report_expense_ratio.as_ref())
            .and_then(|v| v.raw)
            .map(|fraction| fraction * 100.0)
    }
}

fn to_datetime(ts: Option<i64>) -> Option<DateTime<Utc>> {
    ts.and_then(|ts| Utc.timestamp_opt(ts, 0).single())
}

#[async_trait]
impl QuoteProvider for YahooQuoteProvider {
    #[instrument(
        name = "YahooQuoteFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_quote(&self, symbol: Symbol) -> Result<BondQuote> {
        if let Some(cached) = self.cache.get(&symbol).await {
            return Ok(cached);
        }

        let meta = self.fetch_chart(symbol).await?;

        let summary = match self.fetch_summary(symbol).await {
            Ok(summary) => summary,
            Err(e) => {
                debug!("Yield lookup failed for {}: {}", symbol, e);
                SummaryItem::default()
            }
        };

        let quote = BondQuote {
            symbol,
            price: meta.regular_market_price,
            yield_pct: summary.yield_pct(),
            expense_ratio: summary.expense_ratio(),
            as_of: to_datetime(meta.regular_market_time),
            source: QuoteSource::Live,
        };
        debug!(?quote, "Fetched quote");

        self.cache.put(symbol, quote.clone()).await;
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_chart(server: &MockServer, symbol: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/v8/finance/chart/{symbol}")))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    async fn mount_summary(server: &MockServer, symbol: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/v10/finance/quoteSummary/{symbol}")))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    fn provider(server: &MockServer) -> YahooQuoteProvider {
        YahooQuoteProvider::new(&server.uri(), Arc::new(Cache::new())).unwrap()
    }

    const CHART_BND: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "regularMarketPrice": 72.31,
                    "regularMarketTime": 1760716800,
                    "currency": "USD"
                }
            }]
        }
    }"#;

    const SUMMARY_BND: &str = r#"{
        "quoteSummary": {
            "result": [{
                "summaryDetail": { "yield": { "raw": 0.0385, "fmt": "3.85%" } },
                "fundProfile": {
                    "feesExpensesInvestment": {
                        "annualReportExpenseRatio": { "raw": 0.0003 }
                    }
                }
            }],
            "error": null
        }
    }"#;

    #[tokio::test]
    async fn test_successful_quote_fetch() {
        let server = MockServer::start().await;
        mount_chart(&server, "BND", 200, CHART_BND).await;
        mount_summary(&server, "BND", 200, SUMMARY_BND).await;

        let quote = provider(&server).fetch_quote(Symbol::BND).await.unwrap();
        assert_eq!(quote.symbol, Symbol::BND);
        assert_eq!(quote.price, 72.31);
        assert!((quote.yield_pct.unwrap() - 3.85).abs() < 1e-9);
        assert!((quote.expense_ratio.unwrap() - 0.03).abs() < 1e-9);
        assert_eq!(quote.as_of.unwrap().timestamp(), 1760716800);
        assert_eq!(quote.source, QuoteSource::Live);
    }

    #[tokio::test]
    async fn test_summary_failure_keeps_price_without_yield() {
        let server = MockServer::start().await;
        mount_chart(&server, "BND", 200, CHART_BND).await;
        mount_summary(&server, "BND", 401, "Unauthorized").await;

        let quote = provider(&server).fetch_quote(Symbol::BND).await.unwrap();
        assert_eq!(quote.price, 72.31);
        assert!(quote.yield_pct.is_none());
        assert!(quote.expense_ratio.is_none());
    }

    #[tokio::test]
    async fn test_summary_without_yield_leaves_it_empty() {
        let server = MockServer::start().await;
        mount_chart(&server, "BNDX", 200, CHART_BND).await;
        mount_summary(
            &server,
            "BNDX",
            200,
            r#"{"quoteSummary": {"result": [{"summaryDetail": {}}]}}"#,
        )
        .await;

        let quote = provider(&server).fetch_quote(Symbol::BNDX).await.unwrap();
        assert_eq!(quote.price, 72.31);
        assert!(quote.yield_pct.is_none());
        assert!(quote.expense_ratio.is_none());
    }

    #[tokio::test]
    async fn test_no_price_result_data() {
        let server = MockServer::start().await;
        mount_chart(&server, "VGUS", 200, r#"{"chart": {"result": []}}"#).await;

        let result = provider(&server).fetch_quote(Symbol::VGUS).await;
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "No price data found for symbol: VGUS"
        );
    }

    #[tokio::test]
    async fn test_chart_http_error() {
        let server = MockServer::start().await;
        mount_chart(&server, "VBIL", 500, "").await;

        let result = provider(&server).fetch_quote(Symbol::VBIL).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error for symbol: VBIL"
        );
    }

    #[tokio::test]
    async fn test_chart_malformed_response() {
        let server = MockServer::start().await;
        mount_chart(&server, "VFIDX", 200, r#"{"chart": {"results": []}}"#).await;

        let result = provider(&server).fetch_quote(Symbol::VFIDX).await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse price response for VFIDX")
        );
    }

    #[tokio::test]
    async fn test_cached_quote_skips_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/BND"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CHART_BND))
            .expect(1)
            .mount(&server)
            .await;
        mount_summary(&server, "BND", 200, SUMMARY_BND).await;

        let provider = provider(&server);
        let first = provider.fetch_quote(Symbol::BND).await.unwrap();
        let second = provider.fetch_quote(Symbol::BND).await.unwrap();
        assert_eq!(first, second);
        // `expect(1)` is verified when the server drops
    }
}
