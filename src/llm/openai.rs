use std::time::Duration;

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    },
};

use super::{GenerateRequest, GenerateResponse, Provider};

const GOOGLE_OPENAI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// The SDK retries 5xx and 429 responses by default. A zero elapsed-time
/// budget limits every call to one attempt.
fn single_attempt_client(config: OpenAIConfig) -> Client<OpenAIConfig> {
    let backoff = backoff::ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build();
    Client::with_config(config).with_backoff(backoff)
}

/// Chat-completion provider for any OpenAI-compatible endpoint: OpenAI
/// itself, Gemini through Google's compatibility layer, or a local Ollama.
pub struct OpenAIProvider {
    client: Client<OpenAIConfig>,
    provider_name: String,
    server_address: String,
    server_port: u16,
}

impl OpenAIProvider {
    pub fn new(api_key: &str) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: single_attempt_client(config),
            provider_name: "openai".to_string(),
            server_address: "api.openai.com".to_string(),
            server_port: 443,
        }
    }

    pub fn new_google(api_key: &str) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(GOOGLE_OPENAI_BASE);
        Self {
            client: single_attempt_client(config),
            provider_name: "google".to_string(),
            server_address: "generativelanguage.googleapis.com".to_string(),
            server_port: 443,
        }
    }

    pub fn new_ollama(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let config = OpenAIConfig::new()
            .with_api_key("ollama")
            .with_api_base(format!("{base_url}/v1"));
        let (server_address, server_port) = host_and_port(base_url, 11434);
        Self {
            client: single_attempt_client(config),
            provider_name: "ollama".to_string(),
            server_address,
            server_port,
        }
    }
}

fn host_and_port(base_url: &str, default_port: u16) -> (String, u16) {
    let authority = base_url
        .split_once("://")
        .map_or(base_url, |(_, rest)| rest)
        .split('/')
        .next()
        .unwrap_or_default();

    match authority.rsplit_once(':') {
        Some((host, port)) => (host.to_string(), port.parse().unwrap_or(default_port)),
        None => (authority.to_string(), default_port),
    }
}

#[async_trait::async_trait]
impl Provider for OpenAIProvider {
    async fn generate(&self, req: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        let mut messages = Vec::with_capacity(2);
        if !req.system.is_empty() {
            messages.push(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(req.system.clone()),
                    name: None,
                },
            ));
        }
        messages.push(ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(req.prompt.clone()),
                name: None,
            },
        ));

        #[allow(deprecated)]
        let request = CreateChatCompletionRequest {
            model: req.model.clone(),
            messages,
            temperature: Some(req.temperature),
            max_completion_tokens: Some(req.max_tokens),
            ..Default::default()
        };

        let response = self.client.chat().create(request).await?;

        let choice = response.choices.first();

        let content = match choice.and_then(|c| c.message.content.as_deref()) {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => anyhow::bail!("{} returned an empty completion", self.provider_name),
        };

        let finish_reason = choice
            .and_then(|c| c.finish_reason)
            .map(|r| format!("{r:?}").to_lowercase())
            .unwrap_or_default();

        let (input_tokens, output_tokens) = match &response.usage {
            Some(usage) => (usage.prompt_tokens, usage.completion_tokens),
            None => (0, 0),
        };

        Ok(GenerateResponse {
            content,
            model: response.model,
            input_tokens,
            output_tokens,
            finish_reason,
        })
    }

    fn name(&self) -> &str {
        &self.provider_name
    }

    fn server(&self) -> (&str, u16) {
        (&self.server_address, self.server_port)
    }
}
