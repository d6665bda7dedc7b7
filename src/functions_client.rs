// Client for the hosted captioning and rendering functions

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::pipeline::services::{BoxError, CaptionGenerator, VideoRenderer};

#[derive(Serialize, Debug)]
pub struct CaptionRequest<'a> {
    pub video_id: i64,
    pub audio_url: &'a str,
    pub script: &'a str,
}

#[derive(Deserialize, Debug)]
pub struct CaptionResponse {
    pub captions: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RenderRequest {
    pub video_id: i64,
    pub template_id: i32,
}

#[derive(Deserialize, Debug)]
pub struct RenderResponse {
    pub video_url: Option<String>,
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct FunctionsClient {
    client: Client,
    base_url: String,
    auth_key: Option<String>,
}

impl FunctionsClient {
    pub fn new(base_url: &str, auth_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_key,
        }
    }

    pub fn function_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    async fn invoke<B, R>(&self, url: &str, label: &str, body: &B) -> Result<R, BoxError>
    where
        B: Serialize + ?Sized + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(key) = &self.auth_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(format!("{} function error ({}): {}", label, status, error_text).into());
        }

        Ok(response.json::<R>().await?)
    }
}

#[async_trait]
impl CaptionGenerator for FunctionsClient {
    async fn generate_captions(
        &self,
        video_id: i64,
        audio_url: &str,
        script: &str,
    ) -> Result<serde_json::Value, BoxError> {
        let url = self.function_url("generate-captions");
        let body = CaptionRequest {
            video_id,
            audio_url,
            script,
        };
        let response: CaptionResponse = self.invoke(&url, "Caption", &body).await?;
        response
            .captions
            .filter(|c| !c.is_null())
            .ok_or_else(|| "Caption function returned no captions".into())
    }
}

/// Renderer reached over HTTP, normally the render-video function.
#[derive(Clone)]
pub struct RemoteRenderer {
    functions: FunctionsClient,
    url: String,
}

impl RemoteRenderer {
    pub fn new(functions: FunctionsClient, url: String) -> Self {
        Self { functions, url }
    }
}

#[async_trait]
impl VideoRenderer for RemoteRenderer {
    async fn render(&self, video_id: i64, template_id: i32) -> Result<String, BoxError> {
        let body = RenderRequest {
            video_id,
            template_id,
        };
        let response: RenderResponse = self.functions.invoke(&self.url, "Render", &body).await?;
        match (response.video_url, response.error) {
            (Some(url), _) if !url.is_empty() => Ok(url),
            (_, Some(error)) => Err(error.into()),
            _ => Err("Render function returned no video_url".into()),
        }
    }
}
