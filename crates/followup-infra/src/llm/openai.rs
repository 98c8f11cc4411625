//! OpenAiCompletionClient -- concrete [`CompletionClient`] over the OpenAI
//! Chat Completions API.
//!
//! Suggestions are short, so the request pins a small completion budget and
//! a moderate temperature. The API key lives inside the async-openai client
//! and this type does not derive `Debug`, so it cannot leak through logs.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::Instrument;

use followup_core::llm::CompletionClient;
use followup_observe::genai_attrs;
use followup_types::error::LlmError;

/// Completion token budget. Suggestions are a few short bullets.
const MAX_COMPLETION_TOKENS: u32 = 128;

/// Sampling temperature for suggestion generation.
const TEMPERATURE: f32 = 0.6;

/// OpenAI-backed completion client.
pub struct OpenAiCompletionClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiCompletionClient {
    pub fn new(api_key: &SecretString, model: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key.expose_secret());
        Self {
            client: Client::with_config(config),
            model,
        }
    }

    fn build_request(&self, system: &str, user: &str) -> CreateChatCompletionRequest {
        let messages = vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(system.to_string()),
                ..Default::default()
            }),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(user.to_string()),
                ..Default::default()
            }),
        ];

        CreateChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_completion_tokens: Some(MAX_COMPLETION_TOKENS),
            temperature: Some(TEMPERATURE),
            ..Default::default()
        }
    }
}

impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let request = self.build_request(system, user);

        // Span fields follow the OTel GenAI semantic conventions.
        let span = tracing::info_span!(
            "llm_complete",
            gen_ai.operation.name = genai_attrs::OP_CHAT,
            gen_ai.provider.name = "openai",
            gen_ai.request.model = %self.model,
            gen_ai.request.temperature = TEMPERATURE as f64,
            gen_ai.request.max_tokens = MAX_COMPLETION_TOKENS,
        );

        async {
            let response = self
                .client
                .chat()
                .create(request)
                .await
                .map_err(map_openai_error)?;

            let content = response
                .choices
                .first()
                .and_then(|c| c.message.content.clone())
                .unwrap_or_default();

            if content.trim().is_empty() {
                return Err(LlmError::EmptyCompletion);
            }
            Ok(content)
        }
        .instrument(span)
        .await
    }
}

/// Map an `async_openai::error::OpenAIError` to an [`LlmError`].
fn map_openai_error(err: async_openai::error::OpenAIError) -> LlmError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::Reqwest(_) => LlmError::Transport(err.to_string()),
        OpenAIError::ApiError(api_err) => LlmError::Api(api_err.message.clone()),
        _ => LlmError::Api(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let client =
            OpenAiCompletionClient::new(&SecretString::from("sk-test"), "gpt-4o-mini".to_string());
        let request = client.build_request("be helpful", "what next?");

        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.max_completion_tokens, Some(MAX_COMPLETION_TOKENS));
        assert_eq!(request.temperature, Some(TEMPERATURE));
        assert_eq!(request.messages.len(), 2);
        assert!(matches!(
            request.messages[0],
            ChatCompletionRequestMessage::System(_)
        ));
        assert!(matches!(
            request.messages[1],
            ChatCompletionRequestMessage::User(_)
        ));
    }
}
