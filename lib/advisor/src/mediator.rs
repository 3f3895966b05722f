//! The two-round tool-calling protocol.
//!
//! Round 1 submits the prompt with both tool declarations under a required
//! tool choice, so a prose-only response can never reach dispatch. The
//! selected retrieval runs exactly once, its result is appended to the
//! exchange as the response to that specific call, and Round 2, now
//! unconstrained but under the advisory persona, asks the model for the
//! final prose. The raw tool payload is never shown to the end user.

use crate::error::{AdvisorError, ContractViolation};
use crate::tools::{ToolInvocation, declarations};
use finsight_ai::{ChatModel, ChatRequest, Exchange, ToolChoice, ToolDeclaration, Turn};
use finsight_market::MarketData;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;

const SYSTEM_INSTRUCTION: &str = "You are an AI financial assistant integrated into a Telegram \
     app. Your job is to provide accurate, professional, and insightful responses to users. \
     Your goal is to help users make smarter financial decisions by providing reliable, \
     easy-to-understand insights based on real data and sound financial logic. Maintain a \
     professional and engaging tone in your responses. Do NOT respond to non-financial topics \
     and inform users that you are not able to answer that question.";

/// Mediates between a free-text query and the two structured retrievals.
#[derive(Clone)]
pub struct Mediator {
    model: Arc<dyn ChatModel>,
    market: Arc<dyn MarketData>,
    tools: Vec<ToolDeclaration>,
}

impl Mediator {
    /// Creates a mediator over the given model and market data provider.
    #[must_use]
    pub fn new(model: Arc<dyn ChatModel>, market: Arc<dyn MarketData>) -> Self {
        Self {
            model,
            market,
            tools: declarations(),
        }
    }

    /// Answers one query, invoking exactly one retrieval tool.
    ///
    /// # Errors
    ///
    /// Returns a typed [`AdvisorError`] per failure category: contract
    /// violations, model-round failures, retrieval failures. Nothing is
    /// retried.
    pub async fn answer(&self, prompt: &str) -> Result<String, AdvisorError> {
        // Round 1: tool selection under a required choice.
        let exchange = Exchange::opening(prompt);
        let selection_request = ChatRequest::new(exchange.clone())
            .with_tools(self.tools.clone(), ToolChoice::Required);
        let selection = self.model.generate(&selection_request).await?;

        let call = selection
            .turn
            .function_call()
            .ok_or(ContractViolation::MissingToolCall)?
            .clone();
        let invocation = ToolInvocation::from_call(&call)?;

        // Dispatch: run the one selected retrieval.
        let result = self.execute(&invocation).await?;

        // Round 2: echo the selection turn verbatim, wrap the result as the
        // response to that call, and ask for prose under the persona.
        let exchange = exchange
            .push(selection.turn)
            .push(Turn::function_response(invocation.tool_name(), result));
        let synthesis_request =
            ChatRequest::new(exchange).with_system_instruction(SYSTEM_INSTRUCTION);
        let synthesis = self.model.generate(&synthesis_request).await?;

        synthesis
            .turn
            .text()
            .filter(|text| !text.trim().is_empty())
            .ok_or(AdvisorError::EmptyAnswer)
    }

    async fn execute(&self, invocation: &ToolInvocation) -> Result<JsonValue, AdvisorError> {
        let payload = match invocation {
            ToolInvocation::FinancialInfo { ticker } => {
                let info = self.market.financial_info(ticker).await?;
                serde_json::to_value(info)
            }
            ToolInvocation::StockPrice {
                ticker,
                period,
                interval,
            } => {
                let history = self.market.price_history(ticker, period, interval).await?;
                serde_json::to_value(history)
            }
        }
        .map_err(|e| AdvisorError::ResultEncoding {
            reason: e.to_string(),
        })?;

        Ok(json!({ "result": payload }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{FINANCIAL_INFO_TOOL, STOCK_PRICE_TOOL};
    use async_trait::async_trait;
    use finsight_ai::{
        ChatResponse, FunctionCall, LlmError, Part, Role, TokenUsage,
    };
    use finsight_market::{FinancialInfo, MarketError, PriceHistory, PricePoint, StatementTable};
    use serde_json::json;
    use std::sync::Mutex;

    /// Scripted model: pops canned responses and records every request.
    struct ScriptedModel {
        responses: Mutex<Vec<Result<ChatResponse, LlmError>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedModel {
        fn new(responses: Vec<Result<ChatResponse, LlmError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn generate(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
            self.requests.lock().expect("lock").push(request.clone());
            let mut responses = self.responses.lock().expect("lock");
            assert!(!responses.is_empty(), "model called more times than scripted");
            responses.remove(0)
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    /// Canned market data that counts retrievals.
    #[derive(Default)]
    struct CannedMarket {
        financial_calls: Mutex<Vec<String>>,
        price_calls: Mutex<Vec<(String, String, String)>>,
        fail_with: Option<MarketError>,
    }

    #[async_trait]
    impl MarketData for CannedMarket {
        async fn financial_info(&self, ticker: &str) -> Result<FinancialInfo, MarketError> {
            self.financial_calls
                .lock()
                .expect("lock")
                .push(ticker.to_string());
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            Ok(FinancialInfo {
                company_name: "Microsoft Corporation".to_string(),
                income_statement: StatementTable::new(),
                balance_sheet: StatementTable::new(),
                cash_flow: StatementTable::new(),
            })
        }

        async fn price_history(
            &self,
            ticker: &str,
            period: &str,
            interval: &str,
        ) -> Result<PriceHistory, MarketError> {
            self.price_calls.lock().expect("lock").push((
                ticker.to_string(),
                period.to_string(),
                interval.to_string(),
            ));
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            Ok(PriceHistory {
                company_name: "Apple Inc.".to_string(),
                current_price: Some(212.5),
                series: vec![PricePoint {
                    timestamp: chrono::DateTime::from_timestamp(1_700_000_000, 0)
                        .expect("timestamp"),
                    open: Some(189.1),
                    high: Some(191.0),
                    low: Some(188.4),
                    close: Some(190.2),
                    volume: Some(52_000_000),
                }],
            })
        }
    }

    fn tool_selection_turn(name: &str, args: JsonValue) -> ChatResponse {
        ChatResponse {
            turn: Turn {
                role: Role::Model,
                parts: vec![Part::FunctionCall(FunctionCall {
                    name: name.to_string(),
                    args,
                })],
            },
            usage: TokenUsage::default(),
            model: "scripted".to_string(),
        }
    }

    fn prose_turn(text: &str) -> ChatResponse {
        ChatResponse {
            turn: Turn::model(text),
            usage: TokenUsage::default(),
            model: "scripted".to_string(),
        }
    }

    fn mediator_with(
        responses: Vec<Result<ChatResponse, LlmError>>,
        market: CannedMarket,
    ) -> (Mediator, Arc<ScriptedModel>, Arc<CannedMarket>) {
        let model = Arc::new(ScriptedModel::new(responses));
        let market = Arc::new(market);
        (
            Mediator::new(model.clone(), market.clone()),
            model,
            market,
        )
    }

    #[tokio::test]
    async fn answers_a_price_question_in_two_rounds() {
        let (mediator, model, market) = mediator_with(
            vec![
                Ok(tool_selection_turn(
                    STOCK_PRICE_TOOL,
                    json!({"ticker": "AAPL", "period": "1mo", "interval": "1d"}),
                )),
                Ok(prose_turn("Apple traded around $190 over the last month.")),
            ],
            CannedMarket::default(),
        );

        let answer = mediator
            .answer("What is Apple's current stock price over the last month?")
            .await
            .expect("answer");

        assert_eq!(answer, "Apple traded around $190 over the last month.");
        assert_eq!(
            *market.price_calls.lock().expect("lock"),
            vec![("AAPL".to_string(), "1mo".to_string(), "1d".to_string())]
        );

        let requests = model.requests();
        assert_eq!(requests.len(), 2);

        // Round 1 carries both declarations under the required choice.
        assert_eq!(requests[0].tools.len(), 2);
        assert_eq!(requests[0].tool_choice, ToolChoice::Required);
        assert!(requests[0].system_instruction.is_none());

        // Round 2 is unconstrained, under the persona.
        assert!(requests[1].tools.is_empty());
        assert_eq!(requests[1].tool_choice, ToolChoice::None);
        assert!(requests[1].system_instruction.is_some());
    }

    #[tokio::test]
    async fn round_two_sees_exactly_three_prior_turns() {
        let prompt = "How has NVDA moved this year?";
        let selection = tool_selection_turn(
            STOCK_PRICE_TOOL,
            json!({"ticker": "NVDA", "period": "ytd", "interval": "1wk"}),
        );
        let (mediator, model, _market) = mediator_with(
            vec![Ok(selection.clone()), Ok(prose_turn("NVDA is up sharply."))],
            CannedMarket::default(),
        );

        mediator.answer(prompt).await.expect("answer");

        let round_two = &model.requests()[1];
        let turns = round_two.exchange.turns();
        assert_eq!(turns.len(), 3, "prompt, echoed selection, tool result");

        assert_eq!(turns[0], Turn::user(prompt));
        assert_eq!(turns[1], selection.turn, "selection turn echoed verbatim");

        assert_eq!(turns[2].role, Role::User);
        let Part::FunctionResponse(response) = &turns[2].parts[0] else {
            panic!("third turn must carry the tool result");
        };
        assert_eq!(response.name, STOCK_PRICE_TOOL);
        assert_eq!(response.response["result"]["company_name"], "Apple Inc.");
    }

    #[tokio::test]
    async fn dispatches_statement_questions_to_financial_info() {
        let (mediator, _model, market) = mediator_with(
            vec![
                Ok(tool_selection_turn(
                    FINANCIAL_INFO_TOOL,
                    json!({"ticker": "MSFT"}),
                )),
                Ok(prose_turn("Microsoft's revenue keeps growing.")),
            ],
            CannedMarket::default(),
        );

        mediator
            .answer("How do Microsoft's financials look?")
            .await
            .expect("answer");

        assert_eq!(
            *market.financial_calls.lock().expect("lock"),
            vec!["MSFT".to_string()]
        );
        assert!(market.price_calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn undeclared_tool_fails_before_round_two() {
        let (mediator, model, market) = mediator_with(
            vec![Ok(tool_selection_turn("get_weather", json!({})))],
            CannedMarket::default(),
        );

        let err = mediator.answer("What's the weather?").await.unwrap_err();

        assert_eq!(
            err,
            AdvisorError::Contract(ContractViolation::UndeclaredTool {
                name: "get_weather".to_string()
            })
        );
        assert_eq!(model.requests().len(), 1, "round 2 never runs");
        assert!(market.financial_calls.lock().expect("lock").is_empty());
        assert!(market.price_calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn prose_only_selection_is_a_contract_violation() {
        let (mediator, model, _market) = mediator_with(
            vec![Ok(prose_turn("AAPL is a technology company."))],
            CannedMarket::default(),
        );

        let err = mediator.answer("Tell me about AAPL").await.unwrap_err();

        assert_eq!(
            err,
            AdvisorError::Contract(ContractViolation::MissingToolCall)
        );
        assert_eq!(model.requests().len(), 1);
    }

    #[tokio::test]
    async fn retrieval_failure_propagates_without_round_two() {
        let market = CannedMarket {
            fail_with: Some(MarketError::UnknownTicker {
                ticker: "XYZXYZ".to_string(),
            }),
            ..CannedMarket::default()
        };
        let (mediator, model, _market) = mediator_with(
            vec![Ok(tool_selection_turn(
                FINANCIAL_INFO_TOOL,
                json!({"ticker": "XYZXYZ"}),
            ))],
            market,
        );

        let err = mediator.answer("Financials for XYZXYZ?").await.unwrap_err();

        assert_eq!(
            err,
            AdvisorError::Retrieval(MarketError::UnknownTicker {
                ticker: "XYZXYZ".to_string()
            })
        );
        assert_eq!(model.requests().len(), 1);
    }

    #[tokio::test]
    async fn model_failure_in_round_one_propagates() {
        let (mediator, _model, market) = mediator_with(
            vec![Err(LlmError::UpstreamRejected {
                status: 503,
                message: "overloaded".to_string(),
            })],
            CannedMarket::default(),
        );

        let err = mediator.answer("AAPL?").await.unwrap_err();

        assert!(matches!(err, AdvisorError::Model(_)));
        assert!(market.price_calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn blank_synthesis_is_an_empty_answer() {
        let (mediator, _model, _market) = mediator_with(
            vec![
                Ok(tool_selection_turn(
                    FINANCIAL_INFO_TOOL,
                    json!({"ticker": "MSFT"}),
                )),
                Ok(prose_turn("   ")),
            ],
            CannedMarket::default(),
        );

        let err = mediator.answer("MSFT financials?").await.unwrap_err();
        assert_eq!(err, AdvisorError::EmptyAnswer);
    }
}
