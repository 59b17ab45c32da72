//! Inbound relay request handling
//!
//! Decodes the `{"Type": ..., "Text": ...}` envelope, hands it to the router
//! and turns the outcome into a status plus plain-text body. The dispatcher
//! holds no conversation state; it can be called concurrently.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::logging::Logger;
use crate::router::BackendRouter;
use crate::{debug_log, log_debug, log_error, log_info, log_warn};

/// Body sent back for an undecodable envelope
pub const INVALID_REQUEST_BODY: &str = "Invalid request body";

/// Classified request text
///
/// Both `Type` and `Text` are required. A body missing either one, such as
/// `{}` or `{"Type":"AdminTask"}`, is rejected with 400 rather than decoded
/// with empty defaults and answered 200 with an empty body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Classification tag ("AdminTask", "ChatCompletion", ...)
    #[serde(rename = "Type")]
    pub kind: String,
    /// User text
    #[serde(rename = "Text")]
    pub text: String,
}

impl RequestEnvelope {
    pub fn new(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
        }
    }

    /// Decode an envelope; both fields must be present strings
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

/// Outcome of a dispatched request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStatus {
    Ok,
    BadRequest,
    InternalServerError,
}

impl RelayStatus {
    /// HTTP status code
    pub fn code(&self) -> u16 {
        match self {
            RelayStatus::Ok => 200,
            RelayStatus::BadRequest => 400,
            RelayStatus::InternalServerError => 500,
        }
    }

    /// Status description sent with the response
    pub fn description(&self) -> &'static str {
        match self {
            RelayStatus::Ok => "OK, Request processed",
            RelayStatus::BadRequest => INVALID_REQUEST_BODY,
            RelayStatus::InternalServerError => "Internal Server Error",
        }
    }
}

/// Request as delivered by the transport
#[derive(Debug, Clone, Default)]
pub struct RelayRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RelayRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// A POST to the relay root
    pub fn post(body: impl Into<String>) -> Self {
        Self::new("POST", "/", body)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Status and plain-text body written back to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    pub status: RelayStatus,
    pub body: String,
}

impl RelayResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: RelayStatus::Ok,
            body: body.into(),
        }
    }

    pub fn bad_request() -> Self {
        Self {
            status: RelayStatus::BadRequest,
            body: INVALID_REQUEST_BODY.to_string(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            status: RelayStatus::InternalServerError,
            body: message.into(),
        }
    }
}

/// Entry point for relay requests
pub struct RelayRequestDispatcher {
    router: Arc<BackendRouter>,
    logger: Arc<dyn Logger>,
}

impl RelayRequestDispatcher {
    pub fn new(router: Arc<BackendRouter>, logger: Arc<dyn Logger>) -> Self {
        Self { router, logger }
    }

    pub fn router(&self) -> &BackendRouter {
        &self.router
    }

    /// Decode, route and answer one request
    pub async fn dispatch(&self, request: &RelayRequest) -> RelayResponse {
        log_info!(self.logger, "HTTP Method: {}", request.method);
        log_info!(self.logger, "URL: {}", request.url);
        log_debug!(self.logger, "Request Body: {}", request.body);
        for (name, value) in &request.headers {
            debug_log!("Header - {}: {}", name, value);
        }

        let envelope = match RequestEnvelope::parse(&request.body) {
            Ok(envelope) => envelope,
            Err(e) => {
                log_warn!(self.logger, "Failed to parse request body: {}", e);
                return RelayResponse::bad_request();
            }
        };
        log_info!(
            self.logger,
            "Parsed request: Type={}, Text={}",
            envelope.kind,
            envelope.text
        );

        match self.router.route(&envelope.kind, &envelope.text).await {
            Ok(text) => {
                debug_log!("response for {}: {}", envelope.kind, text);
                RelayResponse::ok(text)
            }
            Err(e) => {
                log_error!(self.logger, "Request of type {} failed: {}", envelope.kind, e);
                RelayResponse::internal_error(e.to_string())
            }
        }
    }
}
