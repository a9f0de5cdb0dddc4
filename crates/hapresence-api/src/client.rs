// Hand-crafted async HTTP client for the Home Assistant REST API.
//
// Base path: /api/
// Auth: Authorization: Bearer <long-lived access token>

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::transport::{TransportConfig, check_destination};
use crate::types::{ApiStatus, EntityState};

/// Async client for a single Home Assistant instance.
///
/// Holds the bearer token as a sensitive default header. Home Assistant
/// treats anything other than HTTP 200 as a failed call, so response
/// handling demands exactly 200 — no redirect or 2xx leniency.
pub struct HaClient {
    http: reqwest::Client,
    base_url: Url,
    allow_local: bool,
}

impl HaClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL, access token, and transport config.
    ///
    /// Injects `Authorization: Bearer …` and `Content-Type` as default
    /// headers on every request.
    pub fn new(
        base_url: &str,
        token: &secrecy::SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth_value =
            HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())).map_err(|e| {
                Error::Tls(format!("invalid access token header value: {e}"))
            })?;
        auth_value.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth_value);
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self {
            http,
            base_url,
            allow_local: transport.allow_local,
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers
    /// and accepts local destinations).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            allow_local: true,
        })
    }

    /// Parse the base URL and ensure it ends with `/api/` exactly once.
    ///
    /// Accepts `http://ha.local:8123`, with or without a trailing slash
    /// or an already-present `/api` suffix.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;

        let path = url.path().trim_end_matches('/').to_owned();
        if path.ends_with("/api") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/"));
        }

        Ok(url)
    }

    /// The normalized base URL (always ends in `/api/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── HTTP plumbing ────────────────────────────────────────────────

    /// Join a relative path (e.g. `"states"`) onto the base URL.
    fn url(&self, path: &str) -> Url {
        // base_url always ends with `/api/`, so joining `states` works.
        self.base_url
            .join(path)
            .expect("path should be valid relative URL")
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path);
        check_destination(&url, self.allow_local)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await.map_err(Error::request)?;
        Self::handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::Status {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview = body_preview(&body);
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// `GET /api/` — liveness probe. 200 means the API is up and the
    /// token was accepted; the body is informative only and an
    /// undecodable one does not fail the probe.
    pub async fn ping(&self) -> Result<ApiStatus, Error> {
        let url = self.url("");
        check_destination(&url, self.allow_local)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await.map_err(Error::request)?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::Status {
                status: status.as_u16(),
            });
        }

        Ok(resp.json().await.unwrap_or_default())
    }

    /// `GET /api/states` — every entity state the instance tracks, in
    /// upstream order.
    pub async fn states(&self) -> Result<Vec<EntityState>, Error> {
        self.get("states").await
    }
}

/// First 200 bytes of the body, truncated on a char boundary so
/// multibyte text never splits the slice.
fn body_preview(body: &str) -> &str {
    let mut cut = body.len().min(200);
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    &body[..cut]
}
