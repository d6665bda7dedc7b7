// Eleven Labs API Client
// Text-to-speech for the pipeline's voice-over step

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::pipeline::services::{BoxError, VoiceSynthesizer};

/// Fixed narration settings used for every voice-over.
pub const NARRATION_STABILITY: f64 = 0.5;
pub const NARRATION_SIMILARITY_BOOST: f64 = 0.75;

#[derive(Clone)]
pub struct ElevenLabsClient {
    api_key: String,
    client: Client,
    base_url: String,
}

#[derive(Serialize, Debug)]
pub struct TextToSpeechRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_settings: Option<VoiceSettings>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct VoiceSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_boost: Option<f64>,
}

impl VoiceSettings {
    pub fn narration() -> Self {
        Self {
            stability: Some(NARRATION_STABILITY),
            similarity_boost: Some(NARRATION_SIMILARITY_BOOST),
        }
    }
}

impl ElevenLabsClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: Client::new(),
            base_url: "https://api.elevenlabs.io/v1".to_string(),
        }
    }

    /// Generate speech from text using a specific voice
    pub async fn text_to_speech(
        &self,
        text: &str,
        voice_id: &str,
        model_id: Option<&str>,
        voice_settings: Option<VoiceSettings>,
    ) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/text-to-speech/{}", self.base_url, voice_id);

        let request_body = TextToSpeechRequest {
            text: text.to_string(),
            model_id: model_id.map(|s| s.to_string()),
            voice_settings,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(format!("Eleven Labs TTS API error ({}): {}", status, error_text).into());
        }

        let audio_bytes = response.bytes().await?;
        Ok(audio_bytes.to_vec())
    }
}

/// One configured voice reading every script with the narration settings.
#[derive(Clone)]
pub struct NarrationVoice {
    client: ElevenLabsClient,
    voice_id: String,
}

impl NarrationVoice {
    pub fn new(client: ElevenLabsClient, voice_id: String) -> Self {
        Self { client, voice_id }
    }
}

#[async_trait]
impl VoiceSynthesizer for NarrationVoice {
    async fn synthesize(&self, script: &str) -> Result<Vec<u8>, BoxError> {
        let audio = self
            .client
            .text_to_speech(script, &self.voice_id, None, Some(VoiceSettings::narration()))
            .await?;
        tracing::info!(voice_id = %self.voice_id, bytes = audio.len(), "🎙️ Voice-over synthesized");
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narration_request_body() {
        let body = TextToSpeechRequest {
            text: "Hello everyone".to_string(),
            model_id: None,
            voice_settings: Some(VoiceSettings::narration()),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "text": "Hello everyone",
                "voice_settings": { "stability": 0.5, "similarity_boost": 0.75 }
            })
        );
    }
}
