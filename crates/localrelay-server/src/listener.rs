//! HTTP/1 listener feeding the relay dispatcher
//!
//! Accepts any method and path; the body is the request envelope and the
//! response body is the plain-text answer.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::ext::ReasonPhrase;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use localrelay_core::logging::Logger;
use localrelay_core::{debug_log, log_info, log_warn};
use localrelay_core::{RelayRequest, RelayRequestDispatcher, RelayResponse};

/// Bound listener, ready to serve
pub struct RelayListener {
    listener: TcpListener,
    dispatcher: Arc<RelayRequestDispatcher>,
    logger: Arc<dyn Logger>,
}

impl RelayListener {
    pub async fn bind(
        address: &str,
        dispatcher: Arc<RelayRequestDispatcher>,
        logger: Arc<dyn Logger>,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self {
            listener,
            dispatcher,
            logger,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve connections until `shutdown` resolves
    pub async fn serve(self, shutdown: impl Future<Output = ()>) -> io::Result<()> {
        let address = self.local_addr()?;
        log_info!(self.logger, "Online");
        log_info!(self.logger, "Server listening on http://{}", address);

        tokio::pin!(shutdown);
        loop {
            let (stream, peer) = tokio::select! {
                accepted = self.listener.accept() => accepted?,
                _ = &mut shutdown => break,
            };
            debug_log!("accepted connection from {}", peer);

            let io = TokioIo::new(stream);
            let dispatcher = Arc::clone(&self.dispatcher);
            let logger = Arc::clone(&self.logger);
            tokio::spawn(async move {
                let service = service_fn(move |req| handle(req, Arc::clone(&dispatcher)));
                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    log_warn!(logger, "Error serving connection from {}: {}", peer, err);
                }
            });
        }

        log_info!(self.logger, "Offline");
        Ok(())
    }
}

async fn handle(
    req: Request<Incoming>,
    dispatcher: Arc<RelayRequestDispatcher>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().to_string();
    let url = req.uri().to_string();
    let headers = req
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let body = req.into_body().collect().await?.to_bytes();

    let request = RelayRequest {
        method,
        url,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    Ok(to_http(dispatcher.dispatch(&request).await))
}

fn to_http(response: RelayResponse) -> Response<Full<Bytes>> {
    let status = response.status;
    let mut http = Response::new(Full::new(Bytes::from(response.body)));
    *http.status_mut() =
        StatusCode::from_u16(status.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    http.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    http.extensions_mut()
        .insert(ReasonPhrase::from_static(status.description().as_bytes()));
    http
}

#[cfg(test)]
mod tests {
    use super::*;
    use localrelay_core::backends::{ModelBackend, SimpleBackend};
    use localrelay_core::providers::MockProvider;
    use localrelay_core::{ActiveModelState, BackendRouter, HistoryRetention, ModelInfo, NoOpLogger};
    use tokio::sync::oneshot;

    async fn start(answer: &str) -> (SocketAddr, oneshot::Sender<()>, tokio::task::JoinHandle<io::Result<()>>) {
        let logger: Arc<dyn Logger> = Arc::new(NoOpLogger::new());
        let state = ActiveModelState::new();
        state.set_active(ModelInfo::new("phi", "phi"));
        let backend: Arc<dyn ModelBackend> = Arc::new(SimpleBackend::new(
            "chat",
            Arc::new(MockProvider::fixed(answer, logger.clone())),
            state,
            HistoryRetention::Accumulate,
            logger.clone(),
        ));
        let router = BackendRouter::new(logger.clone()).with_route("ChatCompletion", backend);
        let dispatcher = Arc::new(RelayRequestDispatcher::new(Arc::new(router), logger.clone()));

        let listener = RelayListener::bind("127.0.0.1:0", dispatcher, logger).await.unwrap();
        let address = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(listener.serve(async move {
            let _ = rx.await;
        }));
        (address, tx, handle)
    }

    #[tokio::test]
    async fn test_round_trip_over_http() {
        let (address, shutdown, handle) = start("Paris").await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("http://{}/", address))
            .body(r#"{"Type":"ChatCompletion","Text":"What is the capital of France?"}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.text().await.unwrap(), "Paris");

        let response = client
            .post(format!("http://{}/any/path", address))
            .body("not an envelope")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        assert_eq!(response.text().await.unwrap(), "Invalid request body");

        shutdown.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_unknown_type_returns_empty_ok() {
        let (address, shutdown, handle) = start("unused").await;

        let response = reqwest::Client::new()
            .put(format!("http://{}/", address))
            .body(r#"{"Type":"Unknown","Text":"hello"}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.text().await.unwrap(), "");

        shutdown.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
