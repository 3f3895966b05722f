//! Yahoo Finance HTTP client.
//!
//! Prices come from the chart endpoint, statements from the
//! fundamentals-timeseries endpoint. Unknown tickers surface as an error
//! object embedded in the payload rather than a bare status code, so both
//! paths inspect the body before trusting the HTTP status.

use crate::error::MarketError;
use crate::provider::MarketData;
use crate::types::{FinancialInfo, PriceHistory, PricePoint, StatementTable};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use serde_json::Value as JsonValue;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

// Yahoo rejects requests without a browser-looking agent string.
const USER_AGENT_VALUE: &str = "Mozilla/5.0 (compatible; FinSight/0.1)";

/// How far back to request statement history.
const STATEMENT_LOOKBACK_DAYS: i64 = 5 * 365;

/// Annual line items requested per statement.
const INCOME_STATEMENT_TYPES: &[&str] = &[
    "annualTotalRevenue",
    "annualGrossProfit",
    "annualOperatingIncome",
    "annualPretaxIncome",
    "annualNetIncome",
    "annualBasicEPS",
    "annualDilutedEPS",
];

const BALANCE_SHEET_TYPES: &[&str] = &[
    "annualTotalAssets",
    "annualCurrentAssets",
    "annualTotalLiabilitiesNetMinorityInterest",
    "annualCurrentLiabilities",
    "annualStockholdersEquity",
    "annualCashAndCashEquivalents",
];

const CASH_FLOW_TYPES: &[&str] = &[
    "annualOperatingCashFlow",
    "annualInvestingCashFlow",
    "annualFinancingCashFlow",
    "annualCapitalExpenditure",
    "annualFreeCashFlow",
];

/// Market data provider backed by the public Yahoo Finance API.
#[derive(Debug, Clone)]
pub struct YahooFinanceClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooFinanceClient {
    /// Creates a client against the public endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Uses a shared HTTP client.
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    async fn get_json(
        &self,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<JsonValue, MarketError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .send()
            .await
            .map_err(|e| MarketError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| MarketError::RequestFailed {
                reason: e.to_string(),
            })?;

        match serde_json::from_str(&text) {
            Ok(payload) => Ok(payload),
            Err(_) if !status.is_success() => Err(MarketError::UpstreamRejected {
                status: status.as_u16(),
                message: text.chars().take(200).collect(),
            }),
            Err(e) => Err(MarketError::ResponseParseFailed {
                reason: e.to_string(),
            }),
        }
    }

    async fn fetch_chart(
        &self,
        ticker: &str,
        range: &str,
        interval: &str,
    ) -> Result<ChartResult, MarketError> {
        let url = format!("{}/v8/finance/chart/{ticker}", self.base_url);
        let payload = self
            .get_json(url, &[("range", range), ("interval", interval)])
            .await?;
        parse_chart(ticker, &payload)
    }

    async fn fetch_statement(
        &self,
        ticker: &str,
        types: &[&str],
    ) -> Result<StatementTable, MarketError> {
        let url = format!(
            "{}/ws/fundamentals-timeseries/v1/finance/timeseries/{ticker}",
            self.base_url
        );
        let now = Utc::now();
        let period1 = (now - Duration::days(STATEMENT_LOOKBACK_DAYS))
            .timestamp()
            .to_string();
        let period2 = now.timestamp().to_string();
        let type_list = types.join(",");

        let payload = self
            .get_json(
                url,
                &[
                    ("symbol", ticker),
                    ("type", type_list.as_str()),
                    ("period1", period1.as_str()),
                    ("period2", period2.as_str()),
                ],
            )
            .await?;
        parse_timeseries(ticker, &payload)
    }
}

#[async_trait]
impl MarketData for YahooFinanceClient {
    async fn financial_info(&self, ticker: &str) -> Result<FinancialInfo, MarketError> {
        // The chart metadata is the cheapest source of the company name.
        let chart = self.fetch_chart(ticker, "1d", "1d").await?;

        let income_statement = self.fetch_statement(ticker, INCOME_STATEMENT_TYPES).await?;
        let balance_sheet = self.fetch_statement(ticker, BALANCE_SHEET_TYPES).await?;
        let cash_flow = self.fetch_statement(ticker, CASH_FLOW_TYPES).await?;

        Ok(FinancialInfo {
            company_name: chart.company_name,
            income_statement,
            balance_sheet,
            cash_flow,
        })
    }

    async fn price_history(
        &self,
        ticker: &str,
        period: &str,
        interval: &str,
    ) -> Result<PriceHistory, MarketError> {
        let chart = self.fetch_chart(ticker, period, interval).await?;

        Ok(PriceHistory {
            company_name: chart.company_name,
            current_price: chart.current_price,
            series: chart.series,
        })
    }
}

/// The pieces of a chart payload the assistant cares about.
#[derive(Debug, Clone)]
struct ChartResult {
    company_name: String,
    current_price: Option<f64>,
    series: Vec<PricePoint>,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

fn parse_chart(ticker: &str, payload: &JsonValue) -> Result<ChartResult, MarketError> {
    let envelope: ChartEnvelope =
        serde_json::from_value(payload.clone()).map_err(|e| MarketError::ResponseParseFailed {
            reason: e.to_string(),
        })?;

    if let Some(error) = envelope.chart.error {
        if error.code == "Not Found" {
            return Err(MarketError::UnknownTicker {
                ticker: ticker.to_string(),
            });
        }
        return Err(MarketError::UpstreamRejected {
            status: 200,
            message: format!("{}: {}", error.code, error.description),
        });
    }

    let data = envelope
        .chart
        .result
        .and_then(|mut results| {
            if results.is_empty() {
                None
            } else {
                Some(results.remove(0))
            }
        })
        .ok_or_else(|| MarketError::ResponseParseFailed {
            reason: "chart payload carried neither result nor error".to_string(),
        })?;

    let company_name = data
        .meta
        .long_name
        .or(data.meta.short_name)
        .unwrap_or_else(|| ticker.to_string());

    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

    let series = data
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &epoch)| {
            let timestamp = DateTime::<Utc>::from_timestamp(epoch, 0)?;
            Some(PricePoint {
                timestamp,
                open: value_at(&quote.open, i),
                high: value_at(&quote.high, i),
                low: value_at(&quote.low, i),
                close: value_at(&quote.close, i),
                volume: value_at(&quote.volume, i),
            })
        })
        .collect();

    Ok(ChartResult {
        company_name,
        current_price: data.meta.regular_market_price,
        series,
    })
}

fn value_at<T: Copy>(values: &[Option<T>], index: usize) -> Option<T> {
    values.get(index).copied().flatten()
}

fn parse_timeseries(ticker: &str, payload: &JsonValue) -> Result<StatementTable, MarketError> {
    let body = &payload["timeseries"];

    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        let code = error["code"].as_str().unwrap_or_default();
        if code == "Not Found" {
            return Err(MarketError::UnknownTicker {
                ticker: ticker.to_string(),
            });
        }
        return Err(MarketError::UpstreamRejected {
            status: 200,
            message: error.to_string(),
        });
    }

    let results = body["result"]
        .as_array()
        .ok_or_else(|| MarketError::ResponseParseFailed {
            reason: "timeseries payload carried no result array".to_string(),
        })?;

    let mut table = StatementTable::new();

    for entry in results {
        let Some(type_name) = entry["meta"]["type"][0].as_str() else {
            continue;
        };
        let line_item = type_name.strip_prefix("annual").unwrap_or(type_name);

        let Some(values) = entry[type_name].as_array() else {
            continue;
        };

        for value in values {
            let Some(as_of) = value["asOfDate"].as_str() else {
                continue;
            };
            let Ok(period_end) = as_of.parse::<NaiveDate>() else {
                continue;
            };
            let raw = value["reportedValue"]["raw"].as_f64();
            table.insert(period_end, line_item, raw);
        }
    }

    Ok(table)
}
