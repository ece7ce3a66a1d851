//! HTTP collaborator speaking the REST surface served by [`crate::server`].

use async_trait::async_trait;
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::Collaborator;
use crate::construct::LanguageSpecification;
use crate::error::{LangforgeError, Result};
use crate::protocol::{
    archive_name, Ack, Archive, ErrorBody, GenerateRequest, GenerationResult,
    SpecificationSummary,
};
use crate::settings::Settings;

#[derive(Debug, Clone)]
pub struct HttpCollaborator {
    http: reqwest::Client,
    base: Url,
}

impl HttpCollaborator {
    pub fn new(http: reqwest::Client, base: &str) -> Result<Self> {
        let base = Url::parse(base)
            .map_err(|e| LangforgeError::Config(format!("invalid api url '{base}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(LangforgeError::Config(format!("api url '{base}' cannot be a base")));
        }
        Ok(Self { http, base })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Self::new(http, &settings.api_url)
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| LangforgeError::Config(format!("api url '{}' cannot be a base", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Passes successful responses through and turns everything else into the
/// matching error, keeping the service's own detail text.
async fn checked(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.detail)
        .unwrap_or(text);
    debug!(status = status.as_u16(), %detail, "collaborator refused request");
    if status == StatusCode::NOT_FOUND {
        return Err(LangforgeError::NotFound(detail));
    }
    Err(LangforgeError::Collaborator {
        code: status.as_u16(),
        message: detail,
    })
}

async fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
    Ok(checked(response).await?.json::<T>().await?)
}

#[async_trait]
impl Collaborator for HttpCollaborator {
    async fn save(&self, spec: &LanguageSpecification) -> Result<Ack> {
        let url = self.endpoint(&["api", "languages"])?;
        json(self.http.post(url).json(spec).send().await?).await
    }

    async fn fetch(&self, name: &str) -> Result<LanguageSpecification> {
        let url = self.endpoint(&["api", "languages", name])?;
        json(self.http.get(url).send().await?).await
    }

    async fn list(&self) -> Result<Vec<SpecificationSummary>> {
        let url = self.endpoint(&["api", "languages"])?;
        json(self.http.get(url).send().await?).await
    }

    async fn update(&self, name: &str, spec: &LanguageSpecification) -> Result<Ack> {
        let url = self.endpoint(&["api", "languages", name])?;
        json(self.http.put(url).json(spec).send().await?).await
    }

    async fn delete(&self, name: &str) -> Result<Ack> {
        let url = self.endpoint(&["api", "languages", name])?;
        json(self.http.delete(url).send().await?).await
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerationResult> {
        let url = self.endpoint(&["api", "generate"])?;
        json(self.http.post(url).json(request).send().await?).await
    }

    async fn download(&self, language_name: &str) -> Result<Archive> {
        let url = self.endpoint(&["api", "download", language_name])?;
        let response = checked(self.http.get(url).send().await?).await?;
        let bytes = response.bytes().await?;
        Ok(Archive {
            file_name: archive_name(language_name),
            bytes: bytes.to_vec(),
        })
    }
}
