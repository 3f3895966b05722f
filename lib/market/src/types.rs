//! Domain types for retrieved financial data.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A financial statement: line-item values keyed by period-end date.
///
/// Serializes as a date-keyed object, one entry per reporting period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementTable {
    /// Line items per period-end date.
    #[serde(flatten)]
    pub periods: BTreeMap<NaiveDate, BTreeMap<String, Option<f64>>>,
}

impl StatementTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one line-item value for a period.
    pub fn insert(&mut self, period_end: NaiveDate, line_item: impl Into<String>, value: Option<f64>) {
        self.periods
            .entry(period_end)
            .or_default()
            .insert(line_item.into(), value);
    }

    /// Returns whether the table holds no periods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// Company identity plus the three financial statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialInfo {
    /// The company's full name, falling back to the ticker when unknown.
    pub company_name: String,
    /// Income statement by period.
    pub income_statement: StatementTable,
    /// Balance sheet by period.
    pub balance_sheet: StatementTable,
    /// Cash flow statement by period.
    pub cash_flow: StatementTable,
}

/// One sampled point of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Sample time.
    pub timestamp: DateTime<Utc>,
    /// Opening price, if quoted for the interval.
    pub open: Option<f64>,
    /// High price.
    pub high: Option<f64>,
    /// Low price.
    pub low: Option<f64>,
    /// Closing price.
    pub close: Option<f64>,
    /// Traded volume.
    pub volume: Option<u64>,
}

/// Company identity, current price, and a historical series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    /// The company's full name, falling back to the ticker when unknown.
    pub company_name: String,
    /// The most recent market price, when the source reports one.
    pub current_price: Option<f64>,
    /// Historical prices over the requested period and interval.
    pub series: Vec<PricePoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn statement_table_groups_by_period() {
        let mut table = StatementTable::new();
        table.insert(date(2024, 9, 28), "TotalRevenue", Some(391_035_000_000.0));
        table.insert(date(2024, 9, 28), "NetIncome", Some(93_736_000_000.0));
        table.insert(date(2023, 9, 30), "TotalRevenue", Some(383_285_000_000.0));

        assert_eq!(table.periods.len(), 2);
        assert_eq!(
            table.periods[&date(2024, 9, 28)].len(),
            2,
            "two line items in fiscal 2024"
        );
    }

    #[test]
    fn statement_table_serializes_date_keyed() {
        let mut table = StatementTable::new();
        table.insert(date(2024, 9, 28), "TotalRevenue", Some(1.0));

        let json = serde_json::to_value(&table).expect("serialize");
        assert_eq!(json["2024-09-28"]["TotalRevenue"], 1.0);
    }

    #[test]
    fn financial_info_roundtrip() {
        let mut income = StatementTable::new();
        income.insert(date(2024, 9, 28), "TotalRevenue", Some(2.0));

        let info = FinancialInfo {
            company_name: "Apple Inc.".to_string(),
            income_statement: income,
            balance_sheet: StatementTable::new(),
            cash_flow: StatementTable::new(),
        };

        let json = serde_json::to_string(&info).expect("serialize");
        let parsed: FinancialInfo = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(info, parsed);
    }
}
