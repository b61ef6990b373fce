use bytes::Bytes;
use reqwest::blocking::multipart::{Form, Part};
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// One API call: an endpoint path plus positional arguments, named options
/// and an optional upload body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Request {
    pub path: String,
    pub args: Vec<String>,
    pub options: Vec<(String, String)>,
    pub input: Option<Bytes>,
}

impl Request {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn opt(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((key.into(), value.into()));
        self
    }

    pub fn input(mut self, body: impl Into<Bytes>) -> Self {
        self.input = Some(body.into());
        self
    }

    /// Query pairs in wire order: every `arg` first, then the options.
    pub fn query(&self) -> Vec<(&str, &str)> {
        self.args
            .iter()
            .map(|a| ("arg", a.as_str()))
            .chain(self.options.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .collect()
    }
}

/// Carries requests to the daemon and returns the raw response body.
pub trait Transport: Send + Sync {
    fn call(&self, request: &Request) -> ApiResult<Bytes>;
}

/// Blocking HTTP transport.
///
/// Requests without a body are sent as `GET`; requests with one as a
/// multipart `POST` whose single part is named `data`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("dagfs/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Transport for HttpTransport {
    fn call(&self, request: &Request) -> ApiResult<Bytes> {
        let url = self.url(&request.path);
        let builder = match &request.input {
            Some(body) => {
                debug!(method = "POST", path = %request.path, args = request.args.len(), bytes = body.len(), "api request");
                let part = Part::bytes(body.to_vec()).file_name("data");
                self.client
                    .post(&url)
                    .query(&request.query())
                    .multipart(Form::new().part("data", part))
            }
            None => {
                debug!(method = "GET", path = %request.path, args = request.args.len(), "api request");
                self.client.get(&url).query(&request.query())
            }
        };

        let response = builder.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let body = response.bytes()?;
        debug!(path = %request.path, bytes = body.len(), "api response");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_puts_args_before_options() {
        let req = Request::new("/object/patch/QmRoot")
            .opt("encoding", "json")
            .arg("add-link")
            .arg("name");
        assert_eq!(
            req.query(),
            vec![("arg", "add-link"), ("arg", "name"), ("encoding", "json")]
        );
    }

    #[test]
    fn urls_join_base_and_path() {
        let transport = HttpTransport::new(&ApiConfig::default()).unwrap();
        assert_eq!(
            transport.url("/object/data/QmX"),
            "http://localhost:5001/api/v0/object/data/QmX"
        );
    }

    #[test]
    fn input_is_recorded() {
        let req = Request::new("/block/put").input(b"raw".to_vec());
        assert_eq!(req.input.as_deref(), Some(&b"raw"[..]));
        assert!(req.args.is_empty());
    }
}
