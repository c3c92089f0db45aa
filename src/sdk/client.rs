//! Client SDK
//!
//! Entry point combining authentication, HTTP and zoom mapping.

use super::auth::{AccessTokenResponse, AuthToken, Credentials, HeaderScheme};
use super::http::HttpClient;
use crate::error::{Error, Result};
use crate::zoom::descriptor::Construction;
use crate::zoom::{mapper, request, Resource, ResultSpec};
use serde_json::Value;
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

/// Main API client
#[derive(Clone)]
pub struct ClientSdk {
    http: HttpClient,
    base_url: Option<Url>,
    header_scheme: HeaderScheme,
}

impl ClientSdk {
    /// Create a new client with the default header scheme and no base URL
    pub fn new() -> Result<Self> {
        Ok(Self::with_http(HttpClient::new()?))
    }

    pub fn with_http(http: HttpClient) -> Self {
        Self {
            http,
            base_url: None,
            header_scheme: HeaderScheme::default(),
        }
    }

    /// Resolve relative addresses against `base_url`
    pub fn with_base_url(mut self, mut base_url: Url) -> Self {
        // Url::join drops the last path segment unless it ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        self.base_url = Some(base_url);
        self
    }

    /// Header used for tokens returned by [`auth`](Self::auth)
    pub fn with_header_scheme(mut self, header_scheme: HeaderScheme) -> Self {
        self.header_scheme = header_scheme;
        self
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Absolute URL for `address`
    pub fn resolve(&self, address: &str) -> Result<Url> {
        let invalid = |source| Error::InvalidUrl {
            url: address.to_string(),
            source,
        };
        match (Url::parse(address), &self.base_url) {
            (Ok(url), _) => Ok(url),
            (Err(url::ParseError::RelativeUrlWithoutBase), Some(base)) => {
                base.join(address).map_err(invalid)
            }
            (Err(source), _) => Err(invalid(source)),
        }
    }

    /// Fetch `address` as a `T`, zooming when `T` asks for it
    pub async fn get<T: Resource>(&self, address: &str, token: &AuthToken) -> Result<T> {
        let spec = T::describe()?;
        self.fetch(address, token, &spec).await
    }

    /// Fetch several addresses as `T` concurrently; fails on the first error
    pub async fn get_many<T, I, S>(&self, addresses: I, token: &AuthToken) -> Result<Vec<T>>
    where
        T: Resource,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let spec = T::describe()?;
        let addresses: Vec<S> = addresses.into_iter().collect();
        let fetches = addresses
            .iter()
            .map(|address| self.fetch(address.as_ref(), token, &spec));
        futures::future::try_join_all(fetches).await
    }

    /// Fetch `address` according to an already described `spec`
    pub async fn fetch<T>(&self, address: &str, token: &AuthToken, spec: &ResultSpec<T>) -> Result<T> {
        let request_id = Uuid::new_v4();
        let span = tracing::debug_span!("fetch", %request_id, result = spec.type_name());

        async move {
            let url = self.resolve(address)?;

            if !spec.is_zoomed() {
                let Construction::Decode(decode) = spec.construction() else {
                    return Err(Error::Instantiation {
                        type_name: spec.type_name(),
                        reason: "result has neither zoom steps nor a decoder".to_string(),
                    });
                };
                let body = self.http.get_text(&url, token).await?;
                return decode(&body).map_err(|source| Error::Decode {
                    url: url.to_string(),
                    source,
                });
            }

            let zoom_url = request::with_zoom(&url, spec.zoom_steps());
            let document: Value = self.http.get_json(&zoom_url, token).await?;
            let result = mapper::map(spec, &document)?;
            tracing::debug!("Mapped {} fields from {}", spec.bindings().len(), zoom_url);
            Ok(result)
        }
        .instrument(span)
        .await
    }

    /// Exchange `credentials` for a token at `token_url`
    pub async fn auth(&self, token_url: &str, credentials: &Credentials) -> Result<AuthToken> {
        let url = self.resolve(token_url)?;
        let response: AccessTokenResponse = self.http.post_form(&url, credentials).await?;

        tracing::info!(
            "Authenticated with role {:?} in scope {}",
            credentials.role(),
            credentials.scope()
        );

        Ok(self.header_scheme.token(&response.access_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ClientSdk {
        ClientSdk::with_http(HttpClient::with_client(reqwest::Client::new()))
    }

    #[test]
    fn test_resolve_absolute_address() {
        let url = client().resolve("https://api.example.com/orders/42").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/orders/42");
    }

    #[test]
    fn test_resolve_relative_against_base() {
        let base = Url::parse("https://api.example.com/cortex").unwrap();
        let client = client().with_base_url(base);
        assert_eq!(client.base_url().unwrap().as_str(), "https://api.example.com/cortex/");

        let url = client.resolve("carts/mobee/default").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/cortex/carts/mobee/default");
    }

    #[test]
    fn test_relative_without_base_is_invalid() {
        let err = client().resolve("carts/mobee/default").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidUrl {
                source: url::ParseError::RelativeUrlWithoutBase,
                ..
            }
        ));
    }
}
