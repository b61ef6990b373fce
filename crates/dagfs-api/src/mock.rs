//! A [`Transport`] that replays canned responses and records every request.

use std::collections::HashMap;
use std::sync::Mutex;

use bytes::Bytes;

use crate::error::{ApiError, ApiResult};
use crate::transport::{Request, Transport};

#[derive(Default)]
pub(crate) struct MockTransport {
    responses: Mutex<HashMap<String, Bytes>>,
    requests: Mutex<Vec<Request>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests for `path` with `body`.
    pub fn respond(&self, path: &str, body: impl Into<Bytes>) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), body.into());
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> Request {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

impl Transport for MockTransport {
    fn call(&self, request: &Request) -> ApiResult<Bytes> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .get(&request.path)
            .cloned()
            .ok_or_else(|| ApiError::Status {
                status: 500,
                body: format!("no route for {}", request.path),
            })
    }
}
