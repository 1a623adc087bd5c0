//! HTTP client adapter for the plugin administration endpoints.
//!
//! [`PluginApi`] is the seam between controllers and the network: it
//! returns raw [`Envelope`]s and leaves success-code interpretation to the
//! [`ResponseHandler`](crate::envelope::ResponseHandler). Transport failures
//! and non-envelope HTTP errors are the only `Err` results.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::AdminConfig;
use crate::envelope::Envelope;
use crate::error::{AdminError, Result};
use crate::types::{Plugin, UpdateCheck, UpdateMap};

pub const LIST_PATH: &str = "/admin/plugin/list";
pub const CHECK_ONE_PATH: &str = "/admin/plugin/updates/check_one";
pub const CHECK_ALL_PATH: &str = "/admin/plugin/updates/check";
pub const UPDATE_PATH: &str = "/admin/plugin/update";
pub const UNINSTALL_PATH: &str = "/admin/plugin/uninstall";
pub const INSTALL_PATH: &str = "/admin/plugin/install";
pub const UPLOAD_PATH: &str = "/admin/plugin/upload";

/// Backend operations used by the plugin console.
#[async_trait]
pub trait PluginApi: Send + Sync {
    /// `GET /admin/plugin/list`
    async fn list(&self) -> Result<Envelope<Vec<Plugin>>>;

    /// `POST /admin/plugin/updates/check_one`
    async fn check_one(&self, id: &str) -> Result<Envelope<UpdateCheck>>;

    /// `GET /admin/plugin/updates/check`
    async fn check_all(&self) -> Result<Envelope<UpdateMap>>;

    /// `POST /admin/plugin/update`
    async fn update(&self, id: &str) -> Result<Envelope<Plugin>>;

    /// `POST /admin/plugin/uninstall`
    async fn uninstall(&self, id: &str) -> Result<Envelope<String>>;

    /// `POST /admin/plugin/install`
    async fn install(&self, source: &str) -> Result<Envelope<Plugin>>;

    /// `POST /admin/plugin/upload`, multipart field `file`.
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<Envelope<Plugin>>;
}

/// `reqwest`-backed [`PluginApi`].
#[derive(Debug, Clone)]
pub struct HttpPluginApi {
    base_url: String,
    token: Option<String>,
    success_code: i64,
    http: reqwest::Client,
}

impl HttpPluginApi {
    /// Build a client from configuration.
    pub fn new(config: &AdminConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            token: config.token.clone().filter(|t| !t.is_empty()),
            success_code: config.success_code,
            http,
        })
    }

    /// Build a client for `base_url` with default settings.
    pub fn with_url(base_url: impl Into<String>) -> Result<Self> {
        let config = AdminConfig {
            base_url: base_url.into(),
            ..AdminConfig::default()
        };
        Self::new(&config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.header(reqwest::header::AUTHORIZATION, token.as_str()),
            None => req,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>> {
        tracing::debug!(path, "GET");
        let response = self.authorize(self.http.get(self.url(path))).send().await?;
        self.decode(path, response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<Envelope<T>> {
        tracing::debug!(path, "POST");
        let response = self
            .authorize(self.http.post(self.url(path)))
            .json(&body)
            .send()
            .await?;
        self.decode(path, response).await
    }

    /// Read an envelope from `response`.
    ///
    /// OpenList reports most failures inside a 200 envelope, so the body is
    /// tried first; only a non-2xx status without a parsable envelope becomes
    /// [`AdminError::Http`]. Undecodable `data` is an error only in a success
    /// envelope.
    async fn decode<T: DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<Envelope<T>> {
        let status = response.status();
        let body = response.bytes().await?;

        match serde_json::from_slice::<Envelope<serde_json::Value>>(&body) {
            Ok(raw) => {
                let succeeded = status.is_success() && raw.code == self.success_code;
                let data = match raw.data {
                    None | Some(serde_json::Value::Null) => None,
                    Some(value) => match serde_json::from_value::<T>(value) {
                        Ok(v) => Some(v),
                        // Failure envelopes may carry data of any shape.
                        Err(_) if !succeeded => None,
                        Err(e) => {
                            tracing::debug!(path, error = %e, code = raw.code, "undecodable data");
                            return Err(e.into());
                        }
                    },
                };
                Ok(Envelope {
                    code: raw.code,
                    message: raw.message,
                    data,
                })
            }
            Err(_) if !status.is_success() => Err(AdminError::Http {
                status: status.as_u16(),
                path: path.to_owned(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl PluginApi for HttpPluginApi {
    async fn list(&self) -> Result<Envelope<Vec<Plugin>>> {
        self.get(LIST_PATH).await
    }

    async fn check_one(&self, id: &str) -> Result<Envelope<UpdateCheck>> {
        self.post_json(CHECK_ONE_PATH, json!({ "id": id })).await
    }

    async fn check_all(&self) -> Result<Envelope<UpdateMap>> {
        self.get(CHECK_ALL_PATH).await
    }

    async fn update(&self, id: &str) -> Result<Envelope<Plugin>> {
        self.post_json(UPDATE_PATH, json!({ "id": id })).await
    }

    async fn uninstall(&self, id: &str) -> Result<Envelope<String>> {
        self.post_json(UNINSTALL_PATH, json!({ "id": id })).await
    }

    async fn install(&self, source: &str) -> Result<Envelope<Plugin>> {
        self.post_json(INSTALL_PATH, json!({ "source": source }))
            .await
    }

    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<Envelope<Plugin>> {
        tracing::debug!(path = UPLOAD_PATH, file = %file_name, size = bytes.len(), "POST multipart");
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_owned());
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .authorize(self.http.post(self.url(UPLOAD_PATH)))
            .multipart(form)
            .send()
            .await?;
        self.decode(UPLOAD_PATH, response).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let api = HttpPluginApi::with_url("http://localhost:5244/api/").unwrap();
        assert_eq!(api.base_url(), "http://localhost:5244/api");
        assert_eq!(api.url(LIST_PATH), "http://localhost:5244/api/admin/plugin/list");
    }

    #[test]
    fn empty_token_is_ignored() {
        let config = AdminConfig {
            token: Some(String::new()),
            ..AdminConfig::default()
        };
        let api = HttpPluginApi::new(&config).unwrap();
        assert!(api.token.is_none());
    }
}
