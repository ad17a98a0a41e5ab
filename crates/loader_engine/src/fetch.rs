use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use futures_util::StreamExt;
use loader_core::FragmentPayload;
use loader_logging::{loader_debug, loader_warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use url::form_urlencoded;

use crate::{ClientSettings, ContentError, ContentRequest};

#[async_trait::async_trait]
pub trait ContentClient: Send + Sync {
    async fn load(&self, request: &ContentRequest) -> Result<FragmentPayload, ContentError>;
}

/// Talks to the content service over a form-encoded POST.
#[derive(Debug, Clone)]
pub struct ReqwestContentClient {
    settings: ClientSettings,
}

impl ReqwestContentClient {
    pub fn new(settings: ClientSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, ContentError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|err| ContentError::Network(err.to_string()))
    }

    /// Form body for one request. `page_path` travels base64-encoded.
    pub fn form_body(&self, token: &str, request: &ContentRequest) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("action", &self.settings.action)
            .append_pair(
                "page_path",
                &BASE64_STANDARD.encode(request.fragment_path.as_bytes()),
            )
            .append_pair("current_page", &request.document_path)
            .append_pair("nonce", token)
            .finish()
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, ContentError> {
        let max_bytes = self.settings.max_bytes;
        if response
            .content_length()
            .is_some_and(|len| len > max_bytes)
        {
            return Err(ContentError::TooLarge { max_bytes });
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(ContentError::TooLarge { max_bytes });
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl ContentClient for ReqwestContentClient {
    async fn load(&self, request: &ContentRequest) -> Result<FragmentPayload, ContentError> {
        let token = self
            .settings
            .token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or(ContentError::MissingToken)?;
        let endpoint = reqwest::Url::parse(&self.settings.endpoint)
            .map_err(|err| ContentError::InvalidEndpoint(err.to_string()))?;
        let client = self.build_client()?;

        loader_debug!(
            "POST {} for fragment '{}' from '{}'",
            endpoint,
            request.fragment_path,
            request.document_path
        );
        let response = client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ACCEPT, "application/json")
            .body(self.form_body(token, request))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let body = self.read_body(response).await?;
        parse_envelope(status, &body, &request.fragment_path)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Default, Deserialize)]
struct SuccessData {
    #[serde(default, deserialize_with = "lenient_string")]
    content: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    featured_img: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_string")]
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorData {
    #[serde(default, deserialize_with = "lenient_string")]
    message: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    code: Option<String>,
}

/// Turns a service answer into a payload or a classified error.
pub fn parse_envelope(
    status: u16,
    body: &[u8],
    fragment_path: &str,
) -> Result<FragmentPayload, ContentError> {
    let envelope: Envelope = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        Err(err) if (200..300).contains(&status) => {
            return Err(ContentError::Malformed(err.to_string()));
        }
        Err(_) => return Err(ContentError::HttpStatus(status)),
    };

    if !envelope.success {
        let data = ErrorData::deserialize(&envelope.data).unwrap_or_default();
        loader_warn!(
            "Service rejected '{}': status {} code {:?}",
            fragment_path,
            status,
            data.code
        );
        return Err(ContentError::Rejected {
            status,
            code: data.code,
            message: data.message.unwrap_or_default(),
        });
    }

    let data = SuccessData::deserialize(&envelope.data)
        .map_err(|err| ContentError::Malformed(err.to_string()))?;
    let content = data.content.unwrap_or_default();
    if content.trim().is_empty() {
        return Err(ContentError::EmptyContent);
    }

    Ok(FragmentPayload {
        content,
        title: data.title,
        featured_image_url: data.featured_img,
        source_id: data.id,
        fragment_path: data.path.unwrap_or_else(|| fragment_path.to_string()),
    })
}

/// Strings pass through; numbers are stringified; `false`, `null` and `""` mean absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) if !text.is_empty() => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    })
}

fn map_reqwest_error(err: reqwest::Error) -> ContentError {
    if err.is_timeout() {
        return ContentError::Timeout;
    }
    ContentError::Network(err.to_string())
}
