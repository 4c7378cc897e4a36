use attohttpc::{Method, RequestBuilder};
use log::{debug, warn};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// Why an API call produced no usable body.
#[derive(Error, Debug)]
pub enum RequestFailure {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] attohttpc::Error),
}

/// Authenticated JSON client for the provider API.
///
/// The bearer token is owned by the client, so every request it issues is
/// authenticated the same way.
pub struct ApiClient {
    base_url: String,
    api_token: String,
}

impl ApiClient {
    pub fn new(api_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        ApiClient {
            base_url: base_url.into(),
            api_token: api_token.into(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!(
            "{base}/{path}",
            base = self.base_url.trim_end_matches('/'),
            path = path.trim_start_matches('/'),
        )
    }

    pub fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<Vec<u8>, RequestFailure> {
        self.request(Method::GET, url, params, None)
    }

    pub fn put(&self, url: &str, body: String) -> Result<Vec<u8>, RequestFailure> {
        self.request(Method::PUT, url, &[], Some(body))
    }

    /// Sends one request and returns the raw response body.
    ///
    /// Non-2xx responses and transport errors are logged here and handed
    /// back as a [`RequestFailure`]; callers decide whether that is fatal.
    pub fn request(
        &self,
        method: Method,
        url: &str,
        params: &[(&str, &str)],
        body: Option<String>,
    ) -> Result<Vec<u8>, RequestFailure> {
        debug!("{} {} {:?}", method, url, params);

        let mut builder = RequestBuilder::new(method.clone(), url);
        for (key, value) in params {
            builder = builder.param(key, value);
        }

        // Headers go on last so a body setter cannot replace the content type.
        let sent = match body {
            Some(body) => self.authorize(builder.text(body)).send(),
            None => self.authorize(builder).send(),
        };
        let response = sent.map_err(|e| {
            warn!("{} {} failed: {}", method, url, e);
            RequestFailure::from(e)
        })?;

        if !response.is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
            warn!("{} {} returned {}", method, url, status);
            warn!("{}", body);
            return Err(RequestFailure::Status { status, body });
        }

        Ok(response.bytes()?)
    }

    fn authorize<B>(&self, builder: RequestBuilder<B>) -> RequestBuilder<B> {
        builder
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Content-Type", "application/json")
    }
}
