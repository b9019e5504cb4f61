use std::env;
use std::path::PathBuf;

/// Connection settings for an OpenAI compatible chat completion API.
#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_hostname: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub client_secret_path: PathBuf,
    pub token_path: PathBuf,
    pub calendar_id: String,
    pub calendar_api_url: String,
    pub llm: LlmConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let client_secret_path = env::var("MEET_SCHEDULER_CLIENT_SECRET_PATH")
            .unwrap_or_else(|_| "./test.json".to_string());
        let token_path =
            env::var("MEET_SCHEDULER_TOKEN_PATH").unwrap_or_else(|_| "./token.json".to_string());
        let calendar_id =
            env::var("MEET_SCHEDULER_CALENDAR_ID").unwrap_or_else(|_| "primary".to_string());
        let calendar_api_url = env::var("MEET_SCHEDULER_CALENDAR_API_URL")
            .unwrap_or_else(|_| "https://www.googleapis.com/calendar/v3".to_string());
        let api_hostname = env::var("MEET_SCHEDULER_LLM_HOST")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());
        let api_key =
            env::var("OPENAI_API_KEY").unwrap_or_else(|_| "thiswontworkforopenai".to_string());
        let model =
            env::var("MEET_SCHEDULER_LLM_MODEL").unwrap_or_else(|_| "gpt-4-turbo".to_string());
        let temperature = env::var("MEET_SCHEDULER_LLM_TEMPERATURE")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(0.3);

        Self {
            client_secret_path: PathBuf::from(client_secret_path),
            token_path: PathBuf::from(token_path),
            calendar_id,
            calendar_api_url,
            llm: LlmConfig {
                api_hostname,
                api_key,
                model,
                temperature,
            },
        }
    }
}
