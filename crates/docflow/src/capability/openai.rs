//! OpenAI-backed summarizer, speech, image and decision capabilities.
//!
//! One blocking client serves all four; each call is a single HTTP request
//! with the configured timeout. Non-2xx responses surface as
//! [`CapabilityError::Api`] with the response body attached.

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::blocking::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{DecisionOracle, ImageGenerator, SpeechSynthesizer, Summarizer};
use crate::config::OpenAiConfig;
use crate::error::CapabilityError;
use crate::sanitize::{truncate_for_log, LOG_TEXT_LIMIT};

const PLANNER_SYSTEM_PROMPT: &str = "You are a workflow planner. Return ONLY the action name as a single word. Do not include any explanations or additional text.";

const SUMMARY_SYSTEM_PROMPT: &str = "Summarize the document in 3-4 bullet points.";

const PLANNER_TEMPERATURE: f32 = 0.1;

pub struct OpenAiClient {
    http: Client,
    api_key: SecretString,
    config: OpenAiConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    n: u32,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
}

impl OpenAiClient {
    /// Resolves the API key and builds the HTTP client.
    pub fn from_config(config: &OpenAiConfig) -> Result<Self, CapabilityError> {
        let api_key = config
            .key_source()
            .resolve()
            .map_err(|e| CapabilityError::Credentials(e.to_string()))?;
        Self::new(api_key, config.clone())
    }

    pub fn new(api_key: SecretString, config: OpenAiConfig) -> Result<Self, CapabilityError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CapabilityError::Transport {
                endpoint: config.base_url.clone(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            api_key,
            config,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    fn post<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<Response, CapabilityError> {
        let url = self.url(endpoint);
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(body)
            .send()
            .map_err(|e| CapabilityError::Transport {
                endpoint: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::warn!(%url, status = status.as_u16(), "OpenAI request rejected");
            return Err(CapabilityError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    fn chat(
        &self,
        system: &str,
        user: &str,
        temperature: Option<f32>,
    ) -> Result<String, CapabilityError> {
        let request = ChatRequest {
            model: &self.config.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature,
        };

        let parsed: ChatResponse = self
            .post("chat/completions", &request)?
            .json()
            .map_err(|e| CapabilityError::MalformedResponse(e.to_string()))?;
        first_choice(parsed)
    }

    fn binary(response: Response) -> Result<Vec<u8>, CapabilityError> {
        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| CapabilityError::MalformedResponse(e.to_string()))
    }
}

fn first_choice(response: ChatResponse) -> Result<String, CapabilityError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| CapabilityError::MalformedResponse("No choices in response".to_string()))
}

fn decode_image(response: ImageResponse) -> Result<Vec<u8>, CapabilityError> {
    let encoded = response
        .data
        .into_iter()
        .next()
        .and_then(|d| d.b64_json)
        .ok_or_else(|| CapabilityError::MalformedResponse("No image data in response".to_string()))?;

    STANDARD
        .decode(encoded.trim())
        .map_err(|e| CapabilityError::MalformedResponse(format!("Invalid base64 image: {}", e)))
}

impl Summarizer for OpenAiClient {
    fn summarize(&self, text: &str) -> Result<String, CapabilityError> {
        self.chat(SUMMARY_SYSTEM_PROMPT, text, None)
    }
}

impl DecisionOracle for OpenAiClient {
    fn decide(&self, status_summary: &str) -> Result<String, CapabilityError> {
        let reply = self.chat(PLANNER_SYSTEM_PROMPT, status_summary, Some(PLANNER_TEMPERATURE))?;
        tracing::debug!(reply = %truncate_for_log(&reply, LOG_TEXT_LIMIT), "Oracle replied");
        Ok(reply)
    }
}

impl SpeechSynthesizer for OpenAiClient {
    fn synthesize_speech(&self, text: &str) -> Result<Vec<u8>, CapabilityError> {
        let request = SpeechRequest {
            model: &self.config.tts_model,
            voice: &self.config.voice,
            input: text,
            response_format: "mp3",
        };
        let audio = Self::binary(self.post("audio/speech", &request)?)?;
        if audio.is_empty() {
            return Err(CapabilityError::MalformedResponse(
                "Empty audio response".to_string(),
            ));
        }
        Ok(audio)
    }
}

impl ImageGenerator for OpenAiClient {
    fn generate_image(&self, prompt: &str) -> Result<Vec<u8>, CapabilityError> {
        let request = ImageRequest {
            model: &self.config.image_model,
            prompt,
            size: &self.config.image_size,
            n: 1,
            response_format: "b64_json",
        };
        let parsed: ImageResponse = self
            .post("images/generations", &request)?
            .json()
            .map_err(|e| CapabilityError::MalformedResponse(e.to_string()))?;
        decode_image(parsed)
    }
}
