//! Request/response and persistent-stream transport for the mock server.
//!
//! [`Transport`] is the seam every controller is generic over: four calls
//! (`get`, `put`, `post`, `connect`) keyed by an endpoint path and a list of
//! query pairs. [`HttpTransport`] is the production implementation. It wraps
//! `reqwest::Client` for the REST endpoints and `tokio-tungstenite` for the
//! log socket.
//!
//! ## Error handling
//!
//! Every failure is normalized to a [`TransportError`] carrying a numeric
//! code and a message. Code `0` means the server could not be reached at all;
//! any other code is the HTTP status, with the status text and the response
//! body kept verbatim. Callers never interpret the payload beyond display.
//!
//! Each call is a single attempt: there is no retry and no overall request
//! timeout, only a connect timeout.

use std::pin::Pin;
use std::time::Duration;

use base64::Engine;
use futures_util::{Stream, StreamExt};
use tokio_tungstenite::tungstenite::{self, client::IntoClientRequest, http::HeaderValue, Message};
use tracing::debug;

/// User name sent with HTTP Basic credentials. The server only checks the
/// password half.
const BASIC_USER: &str = "mockctl";

/// Text frames received over a persistent socket, in arrival order.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

/// Backend access used by the controllers.
///
/// Success values are the raw response body; decoding is the caller's job.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Stream of inbound text frames returned by [`Transport::connect`].
    type Frames: Stream<Item = Result<String, TransportError>> + Unpin;

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String, TransportError>;

    /// `PUT` with a raw `text/plain` body. Only used for saving files.
    async fn put(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: String,
    ) -> Result<String, TransportError>;

    async fn post(&self, path: &str, query: &[(&str, &str)]) -> Result<String, TransportError>;

    /// Open a persistent full-duplex connection to `path`.
    async fn connect(&self, path: &str) -> Result<Self::Frames, TransportError>;
}

/// A normalized request failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    /// `0` when the server is unreachable, otherwise the HTTP status code.
    pub code: u16,
    /// Status text and body for HTTP failures; a diagnostic detail for
    /// connection-level failures (logged, never shown).
    pub message: String,
}

impl TransportError {
    /// Connection-level failure: refused, reset, DNS, unreadable body.
    pub fn unreachable(detail: impl Into<String>) -> Self {
        Self {
            code: 0,
            message: detail.into(),
        }
    }

    /// Application-level failure: the server answered with a non-2xx status.
    pub fn status(code: u16, reason: &str, body: &str) -> Self {
        Self {
            code,
            message: format!("{reason}\n{body}"),
        }
    }

    pub fn is_unreachable(&self) -> bool {
        self.code == 0
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_unreachable() {
            write!(f, "server disconnected")
        } else {
            write!(f, "{} {}", self.code, self.message)
        }
    }
}

impl std::error::Error for TransportError {}

/// HTTP + WebSocket client for a single mock server. Clones share the
/// connection pool.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    password: Option<String>,
}

impl HttpTransport {
    /// Create a client for the server at `base_url` (`http://` or `https://`).
    pub fn new(
        base_url: &str,
        password: Option<String>,
        connect_timeout: Duration,
    ) -> Result<Self, String> {
        let mut default_headers = reqwest::header::HeaderMap::new();
        default_headers.insert(
            reqwest::header::HeaderName::from_static("x-mockctl-client"),
            reqwest::header::HeaderValue::from_static("cli"),
        );
        let http = reqwest::Client::builder()
            .default_headers(default_headers)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;
        // Strip trailing slash for consistent URL construction
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url,
            password,
        })
    }

    /// The server's base URL (without trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<reqwest::Url, TransportError> {
        let mut url = reqwest::Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| TransportError::unreachable(format!("invalid URL: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn basic_auth_header(&self) -> Option<HeaderValue> {
        let password = self.password.as_ref()?;
        let token = base64::engine::general_purpose::STANDARD
            .encode(format!("{BASIC_USER}:{password}"));
        HeaderValue::from_str(&format!("Basic {token}")).ok()
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, TransportError> {
        let request = match &self.password {
            Some(p) => request.basic_auth(BASIC_USER, Some(p)),
            None => request,
        };
        let resp = request
            .send()
            .await
            .map_err(|e| TransportError::unreachable(e.to_string()))?;
        Self::handle_response(resp).await
    }

    /// Returns the body on success, or a [`TransportError`] carrying the
    /// status text and body verbatim.
    async fn handle_response(resp: reqwest::Response) -> Result<String, TransportError> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::unreachable(e.to_string()))?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(TransportError::status(
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
                &body,
            ))
        }
    }
}

impl Transport for HttpTransport {
    type Frames = FrameStream;

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String, TransportError> {
        let url = self.url(path, query)?;
        debug!("GET {url}");
        self.send(self.http.get(url)).await
    }

    async fn put(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: String,
    ) -> Result<String, TransportError> {
        let url = self.url(path, query)?;
        debug!("PUT {url} ({} bytes)", body.len());
        self.send(
            self.http
                .put(url)
                .header(reqwest::header::CONTENT_TYPE, "text/plain")
                .body(body),
        )
        .await
    }

    async fn post(&self, path: &str, query: &[(&str, &str)]) -> Result<String, TransportError> {
        let url = self.url(path, query)?;
        debug!("POST {url}");
        self.send(self.http.post(url)).await
    }

    async fn connect(&self, path: &str) -> Result<FrameStream, TransportError> {
        let ws_url = build_ws_url(&self.base_url, path)?;
        let mut request = ws_url
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::unreachable(format!("invalid socket URL: {e}")))?;
        if let Some(auth) = self.basic_auth_header() {
            request
                .headers_mut()
                .insert(tungstenite::http::header::AUTHORIZATION, auth);
        }

        debug!("WS connect {ws_url}");
        let (ws_stream, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(handshake_error)?;

        let frames = ws_stream.filter_map(|msg| async move {
            match msg {
                Ok(Message::Text(text)) => Some(Ok(text)),
                Ok(Message::Binary(bytes)) => Some(Ok(String::from_utf8_lossy(&bytes).into_owned())),
                // Ping/Pong/Close; the stream ends on its own after Close
                Ok(_) => None,
                Err(e) => Some(Err(TransportError::unreachable(format!("socket error: {e}")))),
            }
        });
        Ok(Box::pin(frames))
    }
}

/// A rejected upgrade is an application-level failure; anything else means
/// the server was not reachable.
fn handshake_error(err: tungstenite::Error) -> TransportError {
    match err {
        tungstenite::Error::Http(resp) => {
            let status = resp.status();
            let body = resp
                .body()
                .as_deref()
                .map(String::from_utf8_lossy)
                .unwrap_or_default();
            TransportError::status(
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
                &body,
            )
        }
        other => TransportError::unreachable(format!("WebSocket connect failed: {other}")),
    }
}

/// Build the socket URL for `path`, matching the base URL's transport
/// security (`https` → `wss`, `http` → `ws`).
pub fn build_ws_url(base_url: &str, path: &str) -> Result<String, TransportError> {
    let base = base_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        return Err(TransportError::unreachable(format!(
            "Invalid URL scheme: {base}"
        )));
    };
    Ok(format!("{ws_base}{path}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_follows_plain_scheme() {
        assert_eq!(
            build_ws_url("http://localhost:8000", "/ws/logs").unwrap(),
            "ws://localhost:8000/ws/logs"
        );
    }

    #[test]
    fn ws_url_follows_secure_scheme() {
        assert_eq!(
            build_ws_url("https://mock.example.com/", "/ws/logs").unwrap(),
            "wss://mock.example.com/ws/logs"
        );
    }

    #[test]
    fn ws_url_rejects_unknown_scheme() {
        let err = build_ws_url("ftp://host", "/ws/logs").unwrap_err();
        assert!(err.is_unreachable());
    }

    #[test]
    fn unreachable_displays_generic_notice() {
        let err = TransportError::unreachable("connection refused (os error 111)");
        assert_eq!(err.to_string(), "server disconnected");
    }

    #[test]
    fn status_error_keeps_reason_and_body_verbatim() {
        let err = TransportError::status(404, "Not Found", "tunnel[9000] not found");
        assert_eq!(err.code, 404);
        assert_eq!(err.to_string(), "404 Not Found\ntunnel[9000] not found");
    }

    #[test]
    fn url_encodes_query_pairs() {
        let transport =
            HttpTransport::new("http://127.0.0.1:8000/", None, Duration::from_secs(1)).unwrap();
        let url = transport
            .url("/file", &[("path", "./a b.txt"), ("type", "file")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8000/file?path=.%2Fa+b.txt&type=file"
        );
    }

    #[test]
    fn url_without_query_has_no_question_mark() {
        let transport =
            HttpTransport::new("http://127.0.0.1:8000", None, Duration::from_secs(1)).unwrap();
        let url = transport.url("/tunnel", &[]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/tunnel");
    }

    #[test]
    fn basic_auth_header_only_with_password() {
        let anon = HttpTransport::new("http://h", None, Duration::from_secs(1)).unwrap();
        assert!(anon.basic_auth_header().is_none());

        let authed =
            HttpTransport::new("http://h", Some("pw".into()), Duration::from_secs(1)).unwrap();
        let header = authed.basic_auth_header().unwrap();
        // base64("mockctl:pw")
        assert_eq!(header.to_str().unwrap(), "Basic bW9ja2N0bDpwdw==");
    }

    /// Accept one connection on a loopback port, answer it with `response`
    /// and hand back the raw request head.
    fn serve_once(response: String) -> (String, std::sync::mpsc::Receiver<String>) {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let (mut sock, _) = listener.accept().unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                match sock.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => head.extend_from_slice(&buf[..n]),
                }
            }
            let _ = tx.send(String::from_utf8_lossy(&head).into_owned());
            let _ = sock.write_all(response.as_bytes());
        });
        (base, rx)
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    #[tokio::test]
    async fn success_returns_body_and_sends_credentials() {
        let (base, request) = serve_once(http_response("200 OK", "[]"));
        let transport = HttpTransport::new(&base, Some("pw".into()), Duration::from_secs(2)).unwrap();

        let body = transport.get("/tunnel", &[]).await.unwrap();

        assert_eq!(body, "[]");
        let head = request.recv().unwrap().to_ascii_lowercase();
        assert!(head.starts_with("get /tunnel http/1.1"));
        assert!(head.contains("authorization: basic bw9ja2n0bdpwdw=="));
        assert!(head.contains("x-mockctl-client: cli"));
    }

    #[tokio::test]
    async fn non_success_status_keeps_reason_and_body() {
        let (base, _request) = serve_once(http_response("404 Not Found", "tunnel[9000] not found"));
        let transport = HttpTransport::new(&base, None, Duration::from_secs(2)).unwrap();

        let err = transport
            .post("/tunnel", &[("port", "9000"), ("action", "start")])
            .await
            .unwrap_err();

        assert_eq!(err.code, 404);
        assert_eq!(err.message, "Not Found\ntunnel[9000] not found");
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport =
            HttpTransport::new(&format!("http://127.0.0.1:{port}"), None, Duration::from_secs(2))
                .unwrap();

        let err = transport.get("/file/list", &[("path", ".")]).await.unwrap_err();

        assert!(err.is_unreachable());
        assert_eq!(err.to_string(), "server disconnected");
    }

    #[tokio::test]
    async fn rejected_socket_upgrade_is_a_status_error() {
        let (base, request) = serve_once(http_response("401 Unauthorized", ""));
        let transport = HttpTransport::new(&base, Some("pw".into()), Duration::from_secs(2)).unwrap();

        let err = match transport.connect("/ws/logs").await {
            Ok(_) => panic!("upgrade should have been refused"),
            Err(e) => e,
        };

        assert_eq!(err.code, 401);
        assert!(!err.is_unreachable());
        let head = request.recv().unwrap().to_ascii_lowercase();
        assert!(head.starts_with("get /ws/logs http/1.1"));
        assert!(head.contains("authorization: basic bw9ja2n0bdpwdw=="));
    }
}
