//! HTTP utilities for REST API calls

use super::auth::AuthToken;
use crate::error::{Error, Result};
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Client, ClientBuilder, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

const USER_AGENT: &str = concat!("cortex-sdk/", env!("CARGO_PKG_VERSION"));

/// Sanitize response body for logging
/// Truncates long responses and drops control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// HTTP client wrapper for API calls
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        Self::from_builder(Client::builder().user_agent(USER_AGENT))
    }

    /// Build the reqwest client from a configured builder
    pub fn from_builder(builder: ClientBuilder) -> Result<Self> {
        let client = builder.build().map_err(|source| Error::Client { source })?;
        Ok(Self { client })
    }

    /// Wrap an existing reqwest client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// GET a resource and return the raw body text
    pub async fn get_text(&self, url: &Url, token: &AuthToken) -> Result<String> {
        tracing::debug!("GET {}", url);

        let request = self
            .client
            .get(url.clone())
            .header(token.header_name(), token.header_value());

        self.send(url, request).await
    }

    /// GET a resource and decode the body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url, token: &AuthToken) -> Result<T> {
        let body = self.get_text(url, token).await?;
        decode(url, &body)
    }

    /// POST a form-encoded body and decode the JSON response
    pub async fn post_form<F, T>(&self, url: &Url, form: &F) -> Result<T>
    where
        F: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!("POST {}", url);

        let request = self.client.post(url.clone()).form(form);
        let body = self.send(url, request).await?;
        decode(url, &body)
    }

    async fn send(&self, url: &Url, request: RequestBuilder) -> Result<String> {
        let response = request
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|source| Error::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| Error::Transport {
            url: url.to_string(),
            source,
        })?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(Error::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(body)
    }
}

fn decode<T: DeserializeOwned>(url: &Url, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| {
        tracing::error!("Unexpected response body: {}", sanitize_for_log(body));
        Error::Decode {
            url: url.to_string(),
            source,
        }
    })
}

/// Format an SDK error for display
/// Security: Sanitizes error messages to avoid leaking API details
pub fn format_api_error(error: &Error) -> String {
    if let Some(status) = error.status() {
        return match status.as_u16() {
            401 => "Authentication failed. Check your credentials or run 'cortex auth'.".to_string(),
            403 => "Permission denied for this resource.".to_string(),
            404 => "Resource not found.".to_string(),
            429 => "Rate limit exceeded. Please try again later.".to_string(),
            400 => "Invalid request. Check your parameters.".to_string(),
            500 | 502 | 503 => "Service temporarily unavailable. Please try again.".to_string(),
            _ => format!("Request failed with status {}.", status.as_u16()),
        };
    }

    match error {
        Error::Transport { .. } => {
            "Request failed. Check your network connection and try again.".to_string()
        }
        Error::Configuration { reason, .. } => format!("Invalid result configuration: {}", reason),
        Error::Extraction { field, expression, .. } => {
            format!("Response has no value for '{}' at {}", field, expression)
        }
        other => {
            // Truncate long error messages and remove potential sensitive data
            let message = other.to_string();
            let sanitized = message
                .chars()
                .filter(|c| c.is_ascii_graphic() || *c == ' ')
                .take(80)
                .collect::<String>();

            if sanitized.len() < message.len() {
                format!("{}...", sanitized)
            } else {
                sanitized
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonpath::PathError;
    use reqwest::StatusCode;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(sanitized.ends_with("[truncated, 500 bytes total]"));
    }

    #[test]
    fn test_sanitize_respects_char_boundaries() {
        let body = "é".repeat(150);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("[truncated, 300 bytes total]"));
    }

    #[test]
    fn test_sanitize_strips_control_characters() {
        assert_eq!(sanitize_for_log("line\r\nbreak\u{1b}"), "linebreak");
    }

    #[test]
    fn test_format_status_errors() {
        let err = Error::Status {
            url: "https://api.example.com/profiles/default".to_string(),
            status: StatusCode::NOT_FOUND,
        };
        assert_eq!(format_api_error(&err), "Resource not found.");

        let err = Error::Status {
            url: "https://api.example.com".to_string(),
            status: StatusCode::IM_A_TEAPOT,
        };
        assert_eq!(format_api_error(&err), "Request failed with status 418.");
    }

    #[test]
    fn test_format_extraction_error() {
        let err = Error::Extraction {
            field: "total".to_string(),
            expression: "$.total".to_string(),
            source: PathError::NotFound {
                expression: "$.total".to_string(),
            },
        };
        assert_eq!(format_api_error(&err), "Response has no value for 'total' at $.total");
    }

    #[test]
    fn test_builder_failure_is_client_error() {
        let result = HttpClient::from_builder(Client::builder().user_agent("bad\nagent"));
        let Err(err) = result else {
            panic!("expected builder failure");
        };
        assert!(matches!(err, Error::Client { .. }));
        assert!(!err.is_transport());
        assert!(err.to_string().starts_with("Failed to build HTTP client: "));
    }
}
