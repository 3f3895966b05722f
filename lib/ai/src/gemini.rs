//! Gemini REST backend.
//!
//! Talks to the `generateContent` endpoint of the Gemini API, translating
//! between the crate's exchange types and the provider's wire format. Tool
//! constraints map onto the API's function-calling config: a required
//! selection is sent as mode `ANY`.

use crate::backend::{ChatModel, ChatRequest, ChatResponse, TokenUsage, ToolChoice};
use crate::error::LlmError;
use crate::exchange::{FunctionCall, FunctionResponse, Part, Role, Turn};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Chat model backed by the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiModel {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiModel {
    /// Creates a backend for the given model with the default endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            api_key: api_key.into(),
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

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn build_body(&self, request: &ChatRequest) -> GenerateContentRequest {
        let contents = request
            .exchange
            .turns()
            .iter()
            .map(content_from_turn)
            .collect();

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(vec![WireTool {
                function_declarations: request
                    .tools
                    .iter()
                    .map(|tool| WireFunctionDeclaration {
                        name: tool.name.clone(),
                        description: tool.description.clone(),
                        parameters: tool.parameter_schema(),
                    })
                    .collect(),
            }])
        };

        let tool_config = match request.tool_choice {
            ToolChoice::Required => Some(WireToolConfig {
                function_calling_config: WireFunctionCallingConfig {
                    mode: "ANY".to_string(),
                },
            }),
            ToolChoice::None => None,
        };

        let system_instruction =
            request
                .system_instruction
                .as_ref()
                .map(|text| WireSystemInstruction {
                    parts: vec![WireSystemPart { text: text.clone() }],
                });

        GenerateContentRequest {
            contents,
            tools,
            tool_config,
            system_instruction,
        }
    }
}

#[async_trait]
impl ChatModel for GeminiModel {
    async fn generate(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let body = self.build_body(request);

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::UpstreamRejected {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::ResponseParseFailed {
                    reason: e.to_string(),
                })?;

        let turn = first_candidate_turn(parsed.candidates)?;
        let usage = parsed
            .usage_metadata
            .map(|usage| TokenUsage {
                input_tokens: usage.prompt_token_count,
                output_tokens: usage.candidates_token_count,
            })
            .unwrap_or_default();

        Ok(ChatResponse {
            turn,
            usage,
            model: self.model.clone(),
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn first_candidate_turn(candidates: Vec<Candidate>) -> Result<Turn, LlmError> {
    let content = candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .ok_or(LlmError::EmptyResponse)?;

    if content.parts.is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    Ok(Turn {
        role: Role::Model,
        parts: content.parts.into_iter().map(part_from_wire).collect(),
    })
}

fn content_from_turn(turn: &Turn) -> WireContent {
    let role = match turn.role {
        Role::User => "user",
        Role::Model => "model",
    };

    WireContent {
        role: role.to_string(),
        parts: turn.parts.iter().map(part_to_wire).collect(),
    }
}

fn part_to_wire(part: &Part) -> WirePart {
    match part {
        Part::Text(text) => WirePart::Text { text: text.clone() },
        Part::FunctionCall(call) => WirePart::FunctionCall {
            function_call: WireFunctionCall {
                name: call.name.clone(),
                args: call.args.clone(),
            },
        },
        Part::FunctionResponse(response) => WirePart::FunctionResponse {
            function_response: WireFunctionResponse {
                name: response.name.clone(),
                response: response.response.clone(),
            },
        },
    }
}

fn part_from_wire(part: WirePart) -> Part {
    match part {
        WirePart::Text { text } => Part::Text(text),
        WirePart::FunctionCall { function_call } => Part::FunctionCall(FunctionCall {
            name: function_call.name,
            args: function_call.args,
        }),
        WirePart::FunctionResponse { function_response } => {
            Part::FunctionResponse(FunctionResponse {
                name: function_response.name,
                response: function_response.response,
            })
        }
    }
}

// Wire format (camelCase JSON as the API expects).

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<WireToolConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireSystemInstruction>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    role: String,
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum WirePart {
    Text {
        text: String,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: WireFunctionCall,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: WireFunctionResponse,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    args: JsonValue,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionResponse {
    name: String,
    response: JsonValue,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireTool {
    function_declarations: Vec<WireFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct WireFunctionDeclaration {
    name: String,
    description: String,
    parameters: JsonValue,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireToolConfig {
    function_calling_config: WireFunctionCallingConfig,
}

#[derive(Debug, Serialize)]
struct WireFunctionCallingConfig {
    mode: String,
}

#[derive(Debug, Serialize)]
struct WireSystemInstruction {
    parts: Vec<WireSystemPart>,
}

#[derive(Debug, Serialize)]
struct WireSystemPart {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<WirePart>,
    #[allow(dead_code)]
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::Exchange;
    use crate::tool::{ParameterType, ToolDeclaration, ToolParameter};
    use serde_json::json;

    fn price_tool() -> ToolDeclaration {
        ToolDeclaration::new("get_stock_price", "Retrieve stock prices.").with_parameter(
            ToolParameter::required("ticker", ParameterType::String, "Ticker symbol."),
        )
    }

    #[test]
    fn required_choice_serializes_as_mode_any() {
        let model = GeminiModel::new("key", "gemini-2.0-flash");
        let request = ChatRequest::new(Exchange::opening("NVDA earnings?"))
            .with_tools(vec![price_tool()], ToolChoice::Required);

        let body = serde_json::to_value(model.build_body(&request)).expect("serialize");

        assert_eq!(
            body["toolConfig"]["functionCallingConfig"]["mode"],
            "ANY"
        );
        assert_eq!(
            body["tools"][0]["functionDeclarations"][0]["name"],
            "get_stock_price"
        );
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "NVDA earnings?");
    }

    #[test]
    fn unconstrained_request_carries_no_tool_keys() {
        let model = GeminiModel::new("key", "gemini-2.0-flash");
        let request = ChatRequest::new(Exchange::opening("Summarize."))
            .with_system_instruction("You are a financial assistant.");

        let body = serde_json::to_value(model.build_body(&request)).expect("serialize");

        assert!(body.get("tools").is_none());
        assert!(body.get("toolConfig").is_none());
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "You are a financial assistant."
        );
    }

    #[test]
    fn function_response_turn_serializes_on_the_user_side() {
        let model = GeminiModel::new("key", "gemini-2.0-flash");
        let exchange = Exchange::opening("AAPL?")
            .push(Turn::function_response("get_stock_price", json!({"price": 212.5})));
        let request = ChatRequest::new(exchange);

        let body = serde_json::to_value(model.build_body(&request)).expect("serialize");

        assert_eq!(body["contents"][1]["role"], "user");
        assert_eq!(
            body["contents"][1]["parts"][0]["functionResponse"]["name"],
            "get_stock_price"
        );
    }

    #[test]
    fn parses_a_function_call_candidate() {
        let raw = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{
                        "functionCall": {
                            "name": "get_stock_price",
                            "args": {"ticker": "AAPL", "period": "1mo", "interval": "1d"}
                        }
                    }]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 42, "candidatesTokenCount": 7}
        });

        let parsed: GenerateContentResponse = serde_json::from_value(raw).expect("deserialize");
        let turn = first_candidate_turn(parsed.candidates).expect("turn");

        let call = turn.function_call().expect("function call");
        assert_eq!(call.name, "get_stock_price");
        assert_eq!(call.args["ticker"], "AAPL");
    }

    #[test]
    fn parses_a_prose_candidate() {
        let raw = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "Apple closed higher today."}]
                }
            }]
        });

        let parsed: GenerateContentResponse = serde_json::from_value(raw).expect("deserialize");
        let turn = first_candidate_turn(parsed.candidates).expect("turn");

        assert_eq!(turn.text().as_deref(), Some("Apple closed higher today."));
    }

    #[test]
    fn empty_candidates_are_an_error() {
        let parsed: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": []})).expect("deserialize");
        let err = first_candidate_turn(parsed.candidates).unwrap_err();
        assert_eq!(err, LlmError::EmptyResponse);
    }
}
