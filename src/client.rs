use std::env;
use std::time::{Duration, Instant};

use futures::Stream;
use futures::stream::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use url::Url;

use crate::backend::{Fragment, FragmentStream, InferenceBackend, InferenceRequest};
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::sse::process_sse;
use crate::types::{GenerateContentRequest, GenerateContentResponse, Model};

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variables consulted, in order, when no key is passed in.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

const MISSING_KEY: &str = "API key is missing. Use /key to connect one or set GEMINI_API_KEY.";

/// Client for the Gemini API.
#[derive(Debug, Clone)]
pub struct Gemini {
    api_key: Option<String>,
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
}

impl Gemini {
    /// Create a new Gemini client.
    ///
    /// The API key can be provided directly or read from the environment
    /// (see [`API_KEY_ENV_VARS`]).  A missing key is not an error here; it is
    /// reported by [`InferenceBackend::has_credential`] and by the first
    /// request.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = api_key
            .or_else(api_key_from_env)
            .filter(|key| !key.trim().is_empty());

        let mut base_url = Url::parse(base_url.as_deref().unwrap_or(DEFAULT_API_URL))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
        })
    }

    /// Replaces the credential.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        let key = api_key.into();
        self.api_key = if key.trim().is_empty() {
            None
        } else {
            Some(key.trim().to_string())
        };
    }

    /// The endpoint for `method` on `model`.
    fn endpoint(&self, model: &Model, method: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join(&format!("models/{}:{}", model.as_str(), method))?;
        if method == "streamGenerateContent" {
            url.query_pairs_mut().append_pair("alt", "sse");
        }
        Ok(url)
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::authentication(MISSING_KEY))?;
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key).map_err(|_| {
                Error::authentication("API key contains characters not allowed in a header")
            })?,
        );
        Ok(headers)
    }

    fn request_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            message: Option<String>,
            status: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.error);
        let status = detail.as_ref().and_then(|d| d.status.clone());
        let message = detail
            .and_then(|d| d.message)
            .unwrap_or_else(|| error_body.clone());

        error_for_status(status_code, status, message, retry_after)
    }

    /// Send a request and get a stream of response chunks.
    pub async fn stream(
        &self,
        model: &Model,
        request: &GenerateContentRequest,
    ) -> Result<impl Stream<Item = Result<GenerateContentResponse>> + Send + use<>> {
        let url = self.endpoint(model, "streamGenerateContent")?;
        let headers = self.default_headers()?;

        CLIENT_REQUESTS.click();
        let start = Instant::now();
        tracing::debug!(%model, turns = request.contents.len(), "starting stream");

        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                CLIENT_REQUEST_ERRORS.click();
                self.request_error(e)
            })?;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            let err = Self::process_error_response(response).await;
            tracing::warn!(%model, error = %err, "stream request rejected");
            return Err(err);
        }

        Ok(process_sse(response.bytes_stream()))
    }
}

#[async_trait::async_trait]
impl InferenceBackend for Gemini {
    async fn stream_generate(&self, request: InferenceRequest) -> Result<FragmentStream> {
        let wire = request.to_generate_content();
        let chunks = self.stream(&request.model, &wire).await?;
        Ok(Box::pin(chunks.map(|chunk| {
            let chunk = chunk?;
            if let Some(reason) = chunk.block_reason() {
                return Err(Error::bad_request(format!("prompt blocked: {reason}")));
            }
            Ok(Fragment::from(chunk))
        })))
    }

    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn set_credential(&mut self, key: &str) {
        self.set_api_key(key);
    }
}

fn api_key_from_env() -> Option<String> {
    API_KEY_ENV_VARS
        .iter()
        .find_map(|name| env::var(name).ok())
        .filter(|key| !key.trim().is_empty())
}

/// Map an HTTP status code onto the appropriate error variant.
fn error_for_status(
    status_code: u16,
    status: Option<String>,
    message: String,
    retry_after: Option<u64>,
) -> Error {
    match status_code {
        400 if message.contains("API key not valid") || message.contains("API_KEY_INVALID") => {
            Error::authentication(message)
        }
        400 => Error::bad_request(message),
        401 => Error::authentication(message),
        403 => Error::permission(message),
        404 => Error::not_found(message),
        408 => Error::timeout(message, None),
        429 => Error::rate_limit(message, retry_after),
        500 => Error::internal_server(message),
        502..=504 => Error::service_unavailable(message, retry_after),
        _ => Error::api(status_code, status, message),
    }
}
