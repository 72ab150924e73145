use crate::llm::{GenerateRequest, LlmClient};

#[derive(Debug, Clone)]
pub struct SynthesisSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

pub const SYNTHESIS_FAILURE_PREFIX: &str = "Unable to generate relocation insights";

pub fn build_prompt(city: &str, weather_summary: &str, gdp_summary: &str) -> String {
    format!(
        "Provide detailed relocation insights for {city}:\n\
        - Consider the following weather context: {weather_summary}.\n\
        - Economic context: {gdp_summary}.\n\
        - Include cultural aspects, job opportunities, and challenges for expats."
    )
}

/// Asks the model for the relocation narrative and returns its text
/// verbatim. A failed call yields a user-visible error message instead.
#[tracing::instrument(
    name = "pipeline_stage generate",
    skip(llm_client, settings, weather_summary, gdp_summary),
    fields(
        pipeline.stage = "generate",
        insights.length,
        insights.failed,
    )
)]
pub async fn generate(
    llm_client: &LlmClient,
    settings: &SynthesisSettings,
    city: &str,
    weather_summary: &str,
    gdp_summary: &str,
) -> String {
    let request = GenerateRequest {
        model: settings.model.clone(),
        system: String::new(),
        prompt: build_prompt(city, weather_summary, gdp_summary),
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
        stage: "generate".to_string(),
    };

    let span = tracing::Span::current();

    match llm_client.generate(&request).await {
        Ok(resp) => {
            span.record("insights.length", resp.content.len());
            span.record("insights.failed", false);
            resp.content
        }
        Err(err) => {
            span.record("insights.failed", true);
            tracing::error!(
                provider = %llm_client.provider_name(),
                error = %err,
                "Insight synthesis failed"
            );
            format!("{SYNTHESIS_FAILURE_PREFIX}: {err}")
        }
    }
}
