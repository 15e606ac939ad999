use serde_json::{Value, json};

use crate::error::OpenAiError;
use crate::types::{
    ChatMessage, ChatRequest, Completion, GenerationParams, TokenUsage, ToolCall, ToolChoice,
    ToolDefinition,
};

fn message_to_json(msg: &ChatMessage) -> Value {
    json!({
        "role": msg.role.as_str(),
        "content": msg.content
    })
}

fn tool_definition_to_json(tool: &ToolDefinition) -> Value {
    let mut function = json!({
        "name": tool.name,
        "parameters": tool.parameters
    });
    if let Some(desc) = &tool.description {
        function["description"] = json!(desc);
    }
    json!({
        "type": "function",
        "function": function
    })
}

fn tool_choice_to_json(choice: &ToolChoice) -> Value {
    match choice {
        ToolChoice::Specific { name } => json!({
            "type": "function",
            "function": { "name": name }
        }),
    }
}

fn apply_generation_params(body: &mut Value, params: &GenerationParams) {
    if let Some(temp) = params.temperature {
        body["temperature"] = json!(temp);
    }
    if let Some(top_p) = params.top_p {
        body["top_p"] = json!(top_p);
    }
    if let Some(max_tokens) = params.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    if let Some(seed) = params.seed {
        body["seed"] = json!(seed);
    }
}

/// Builds the full chat-completions request body.
pub fn build_request_body(request: &ChatRequest) -> Value {
    let messages: Vec<Value> = request.messages.iter().map(message_to_json).collect();

    let mut body = json!({
        "model": request.model,
        "messages": messages
    });

    if let Some(params) = &request.params {
        apply_generation_params(&mut body, params);
    }

    if !request.tools.is_empty() {
        body["tools"] = Value::Array(request.tools.iter().map(tool_definition_to_json).collect());
    }

    if let Some(choice) = &request.tool_choice {
        body["tool_choice"] = tool_choice_to_json(choice);
    }

    body
}

/// Parses the first choice of a chat-completions response.
pub fn parse_response(response: &Value) -> Result<Completion, OpenAiError> {
    let choice = response
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| OpenAiError::Malformed("No choices in response".to_string()))?;

    let msg = choice
        .get("message")
        .ok_or_else(|| OpenAiError::Malformed("No message in choice".to_string()))?;

    let text = match msg.get("content") {
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Array(parts)) => {
            let joined: String = parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect();
            Some(joined)
        }
        _ => None,
    };

    let mut tool_calls = Vec::new();
    if let Some(calls) = msg.get("tool_calls").and_then(Value::as_array) {
        for call in calls {
            let function = call
                .get("function")
                .ok_or_else(|| OpenAiError::Malformed("No function in tool_call".to_string()))?;
            let name = function
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            let arguments = function
                .get("arguments")
                .and_then(Value::as_str)
                .unwrap_or("{}")
                .to_string();

            tool_calls.push(ToolCall { name, arguments });
        }
    }

    // Older servers answer a forced function with `function_call` instead.
    if let Some(function) = msg.get("function_call") {
        if let Some(name) = function.get("name").and_then(Value::as_str) {
            tool_calls.push(ToolCall {
                name: name.to_string(),
                arguments: function
                    .get("arguments")
                    .and_then(Value::as_str)
                    .unwrap_or("{}")
                    .to_string(),
            });
        }
    }

    let model = response
        .get("model")
        .and_then(Value::as_str)
        .map(String::from);

    let finish_reason = choice
        .get("finish_reason")
        .and_then(Value::as_str)
        .map(String::from);

    let usage = response.get("usage").map(|u| TokenUsage {
        input_tokens: u.get("prompt_tokens").and_then(Value::as_u64),
        output_tokens: u.get("completion_tokens").and_then(Value::as_u64),
    });

    Ok(Completion {
        text,
        tool_calls,
        model,
        finish_reason,
        usage,
    })
}

/// Parses the arguments of the first call to `name`.
pub fn function_arguments(completion: &Completion, name: &str) -> Result<Value, OpenAiError> {
    let call = completion
        .tool_calls
        .iter()
        .find(|c| c.name == name)
        .ok_or_else(|| OpenAiError::MissingFunctionCall(name.to_string()))?;
    Ok(serde_json::from_str(&call.arguments)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forced_call_request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage::user("歯ブラシ")],
            params: Some(GenerationParams {
                temperature: Some(0.0),
                ..Default::default()
            }),
            tools: vec![ToolDefinition {
                name: "sort_task".to_string(),
                description: Some("classify".to_string()),
                parameters: json!({"type": "object"}),
            }],
            tool_choice: Some(ToolChoice::Specific {
                name: "sort_task".to_string(),
            }),
        }
    }

    #[test]
    fn test_build_request_body_plain() {
        let request = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage::system("今を...")],
            params: None,
            tools: vec![],
            tool_choice: None,
        };
        let body = build_request_body(&request);

        assert_eq!(
            body,
            json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "system", "content": "今を..."}]
            })
        );
    }

    #[test]
    fn test_build_request_body_forced_function() {
        let body = build_request_body(&forced_call_request());

        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["temperature"], 0.0);
        assert!(body.get("seed").is_none());
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "sort_task");
        assert_eq!(body["tools"][0]["function"]["description"], "classify");
        assert_eq!(
            body["tool_choice"],
            json!({"type": "function", "function": {"name": "sort_task"}})
        );
    }

    #[test]
    fn test_parse_response_text() {
        let response = json!({
            "model": "gpt-4o-mini",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "2024-06-09 00:00:00+09:00"
                },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 10,
                "completion_tokens": 5
            }
        });

        let completion = parse_response(&response).unwrap();
        assert_eq!(completion.text.as_deref(), Some("2024-06-09 00:00:00+09:00"));
        assert!(completion.tool_calls.is_empty());
        assert_eq!(completion.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(completion.finish_reason.as_deref(), Some("stop"));
        assert_eq!(completion.usage.unwrap().output_tokens, Some(5));
    }

    #[test]
    fn test_parse_response_tool_call() {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_123",
                        "type": "function",
                        "function": {
                            "name": "sort_task",
                            "arguments": "{\"category\": \"買物\", \"confidence\": 90}"
                        }
                    }]
                },
                "finish_reason": "stop"
            }]
        });

        let completion = parse_response(&response).unwrap();
        assert_eq!(completion.text, None);
        assert_eq!(completion.tool_calls[0].name, "sort_task");
        assert_eq!(
            function_arguments(&completion, "sort_task").unwrap(),
            json!({"category": "買物", "confidence": 90})
        );
    }

    #[test]
    fn test_parse_response_legacy_function_call() {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "function_call": {
                        "name": "create_schedule",
                        "arguments": "{\"title\": \"法事\"}"
                    }
                }
            }]
        });

        let completion = parse_response(&response).unwrap();
        assert_eq!(
            function_arguments(&completion, "create_schedule").unwrap(),
            json!({"title": "法事"})
        );
    }

    #[test]
    fn test_function_arguments_errors() {
        let completion = Completion {
            tool_calls: vec![ToolCall {
                name: "sort_task".to_string(),
                arguments: "{not json".to_string(),
            }],
            ..Default::default()
        };

        assert!(matches!(
            function_arguments(&completion, "create_schedule"),
            Err(OpenAiError::MissingFunctionCall(name)) if name == "create_schedule"
        ));
        assert!(matches!(
            function_arguments(&completion, "sort_task"),
            Err(OpenAiError::Json(_))
        ));
    }

    #[test]
    fn test_parse_response_without_choices() {
        assert!(matches!(
            parse_response(&json!({"choices": []})),
            Err(OpenAiError::Malformed(_))
        ));
    }
}
