//! The two retrieval tools offered to the model.
//!
//! The declarations are a stable contract: renaming a tool or changing its
//! required parameters breaks selection dispatch. The model's choice is
//! parsed into a closed variant, so an undeclared name has nowhere to hide.

use crate::error::ContractViolation;
use finsight_ai::{FunctionCall, ParameterType, ToolDeclaration, ToolParameter};

/// Name of the financial-statements tool.
pub const FINANCIAL_INFO_TOOL: &str = "get_financial_info";

/// Name of the stock-price tool.
pub const STOCK_PRICE_TOOL: &str = "get_stock_price";

const TICKER_DESCRIPTION: &str = "Stock ticker symbol of a publicly traded company (e.g., \
     'NVDA' for NVIDIA, 'AAPL' for Apple Inc., 'MSFT' for Microsoft). Must be a valid ticker \
     symbol listed on major stock exchanges.";

/// Builds the two fixed tool declarations.
///
/// Called once at startup; the catalog never changes afterwards.
#[must_use]
pub fn declarations() -> Vec<ToolDeclaration> {
    let financial_info = ToolDeclaration::new(
        FINANCIAL_INFO_TOOL,
        "Retrieve the financial data such as income statements, balance sheets and cashflow \
         using the ticker symbol.",
    )
    .with_parameter(ToolParameter::required(
        "ticker",
        ParameterType::String,
        TICKER_DESCRIPTION,
    ));

    let stock_price = ToolDeclaration::new(
        STOCK_PRICE_TOOL,
        "Retrieve the current and historical stock price of a publicly traded company using a \
         company's ticker symbol.",
    )
    .with_parameter(ToolParameter::required(
        "ticker",
        ParameterType::String,
        TICKER_DESCRIPTION,
    ))
    .with_parameter(ToolParameter::required(
        "period",
        ParameterType::String,
        "The period of the stock price to retrieve. Can be '1d', '5d', '2wk', '5wk', '1mo', \
         '3mo', '6mo', 'ytd', '1y', '2y', '5y', '10y', 'max'.",
    ))
    .with_parameter(ToolParameter::required(
        "interval",
        ParameterType::String,
        "The interval of the stock price to retrieve. Can be '1m', '2m', '5m', '15m', '30m', \
         '60m', '90m', '1h', '1d', '5d', '1wk', '1mo', '3mo'.",
    ));

    vec![financial_info, stock_price]
}

/// The model's concrete selection of exactly one declared tool.
///
/// Argument values are carried as the model produced them; no validation of
/// ticker, period, or interval happens before retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    /// Fetch the three financial statements for a company.
    FinancialInfo { ticker: String },
    /// Fetch current and historical prices for a company.
    StockPrice {
        ticker: String,
        period: String,
        interval: String,
    },
}

impl ToolInvocation {
    /// Parses the model's function call into the closed variant.
    ///
    /// # Errors
    ///
    /// Returns a [`ContractViolation`] when the call names an undeclared
    /// tool or omits a required argument.
    pub fn from_call(call: &FunctionCall) -> Result<Self, ContractViolation> {
        match call.name.as_str() {
            FINANCIAL_INFO_TOOL => Ok(Self::FinancialInfo {
                ticker: required_string(call, FINANCIAL_INFO_TOOL, "ticker")?,
            }),
            STOCK_PRICE_TOOL => Ok(Self::StockPrice {
                ticker: required_string(call, STOCK_PRICE_TOOL, "ticker")?,
                period: required_string(call, STOCK_PRICE_TOOL, "period")?,
                interval: required_string(call, STOCK_PRICE_TOOL, "interval")?,
            }),
            other => Err(ContractViolation::UndeclaredTool {
                name: other.to_string(),
            }),
        }
    }

    /// The declared name of the selected tool.
    #[must_use]
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::FinancialInfo { .. } => FINANCIAL_INFO_TOOL,
            Self::StockPrice { .. } => STOCK_PRICE_TOOL,
        }
    }
}

fn required_string(
    call: &FunctionCall,
    tool: &'static str,
    key: &str,
) -> Result<String, ContractViolation> {
    call.args
        .get(key)
        .and_then(|value| value.as_str())
        .map(str::to_owned)
        .ok_or_else(|| ContractViolation::MalformedArguments {
            tool,
            reason: format!("missing required string argument '{key}'"),
        })
}
