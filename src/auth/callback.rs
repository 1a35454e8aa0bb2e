//! Single-shot local HTTP listener for the OAuth redirect callback
//!
//! The listener binds the host and port of the callback URL, waits for one
//! request whose path matches the callback path, and hands it back as a
//! [`CallbackRequest`] so the caller can answer the browser once the code
//! exchange has finished.
//!
//! # State machine
//!
//! ```text
//! Idle --start()--> Listening --await_request()--> Done
//!                        \------------stop()---------/
//! ```
//!
//! The listening socket is owned by [`CallbackListener`]; [`stop`] or
//! dropping the listener releases it.
//!
//! [`stop`]: CallbackListener::stop

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use url::{Host, Url};

use crate::error::{ApsAuthError, Result};

/// Body sent to the browser once the token has been obtained.
pub const SUCCESS_BODY: &str = "Authentication successful. You can close this window now.";

/// Body sent to the browser when the code exchange failed.
pub const FAILURE_BODY: &str =
    "Authentication failed. Check the terminal for details; you can close this window now.";

const NOT_FOUND_BODY: &str = "Not found.";

/// Upper bound on the bytes read for one request head.
const MAX_REQUEST_HEAD_BYTES: u64 = 8 * 1024;

/// How long a single connection may take to send its request head.
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// ListenerState
// ---------------------------------------------------------------------------

/// Lifecycle of a [`CallbackListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Constructed, nothing bound yet.
    Idle,
    /// Socket bound, waiting for the callback.
    Listening,
    /// One callback received or the listener stopped. Terminal.
    Done,
}

// ---------------------------------------------------------------------------
// CallbackListener
// ---------------------------------------------------------------------------

/// Local listener that accepts exactly one OAuth callback request.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use aps_auth::auth::callback::CallbackListener;
///
/// # async fn example() -> aps_auth::error::Result<()> {
/// let mut listener = CallbackListener::new("http://localhost:8080/api/auth/callback")?;
/// listener.start().await?;
///
/// let request = listener.await_request(Some(Duration::from_secs(300))).await?;
/// println!("code = {}", request.code());
/// request.respond_success().await?;
///
/// listener.stop();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CallbackListener {
    url: Url,
    redirect_uri: String,
    listener: Option<TcpListener>,
    local_addr: Option<SocketAddr>,
    state: ListenerState,
}

impl CallbackListener {
    /// Creates an idle listener for `callback_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApsAuthError::Config`] if the URL does not parse, is not
    /// `http`, or has no host.
    pub fn new(callback_url: &str) -> Result<Self> {
        let url = parse_callback_url(callback_url)?;
        Ok(Self {
            url,
            redirect_uri: callback_url.to_string(),
            listener: None,
            local_addr: None,
            state: ListenerState::Idle,
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> ListenerState {
        self.state
    }

    /// Address the socket is bound to, once started
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// The redirect URI to register with the provider.
    ///
    /// Identical to the string passed to [`new`](Self::new), except that a
    /// requested port of `0` is replaced by the port actually bound.
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Binds the callback host and port, moving `Idle -> Listening`.
    ///
    /// # Errors
    ///
    /// Returns [`ApsAuthError::Listener`] when called in any state but
    /// `Idle`, or when the address cannot be bound (for example because the
    /// port is already in use).
    pub async fn start(&mut self) -> Result<SocketAddr> {
        if self.state != ListenerState::Idle {
            return Err(ApsAuthError::Listener(format!(
                "cannot start listener in state {:?}",
                self.state
            ))
            .into());
        }

        let port = self.url.port_or_known_default().unwrap_or(80);
        let bind_target = match self.url.host() {
            Some(Host::Domain(domain)) => format!("{domain}:{port}"),
            Some(Host::Ipv4(ip)) => format!("{ip}:{port}"),
            Some(Host::Ipv6(ip)) => format!("[{ip}]:{port}"),
            None => {
                return Err(
                    ApsAuthError::Listener("callback URL has no host".to_string()).into(),
                )
            }
        };

        let listener = TcpListener::bind(&bind_target).await.map_err(|e| {
            ApsAuthError::Listener(format!("failed to bind callback listener on {bind_target}: {e}"))
        })?;
        let local_addr = listener.local_addr().map_err(|e| {
            ApsAuthError::Listener(format!("failed to read bound address: {e}"))
        })?;

        if port == 0 {
            self.url.set_port(Some(local_addr.port())).map_err(|_| {
                ApsAuthError::Listener("cannot set port on callback URL".to_string())
            })?;
            self.redirect_uri = self.url.to_string();
        }

        tracing::debug!(%local_addr, redirect_uri = %self.redirect_uri, "Callback listener bound");

        self.listener = Some(listener);
        self.local_addr = Some(local_addr);
        self.state = ListenerState::Listening;
        Ok(local_addr)
    }

    /// Waits for the single callback request, moving `Listening -> Done`.
    ///
    /// Requests for other paths are answered with `404` and do not count.
    /// With `timeout` set the wait fails with
    /// [`ApsAuthError::CallbackTimeout`] once it expires; with `None` it
    /// waits indefinitely. The socket stays bound until [`stop`](Self::stop)
    /// so the caller can finish the exchange before releasing it.
    pub async fn await_request(&mut self, timeout: Option<Duration>) -> Result<CallbackRequest> {
        if self.state != ListenerState::Listening {
            return Err(ApsAuthError::Listener(format!(
                "cannot wait for a callback in state {:?}",
                self.state
            ))
            .into());
        }

        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| ApsAuthError::Listener("listener is not bound".to_string()))?;
        let wait = accept_callback(listener, self.url.path());

        let request = match timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| ApsAuthError::CallbackTimeout { timeout: limit })??,
            None => wait.await?,
        };

        self.state = ListenerState::Done;
        Ok(request)
    }

    /// Closes the listening socket. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(listener) = self.listener.take() {
            drop(listener);
            tracing::debug!(local_addr = ?self.local_addr, "Callback listener stopped");
        }
        self.state = ListenerState::Done;
    }
}

// ---------------------------------------------------------------------------
// CallbackRequest
// ---------------------------------------------------------------------------

/// The one callback request accepted by a [`CallbackListener`].
///
/// Holds the open connection so a response can be written after the code
/// exchange completes.
#[derive(Debug)]
pub struct CallbackRequest {
    stream: TcpStream,
    params: Vec<(String, String)>,
}

impl CallbackRequest {
    /// The `code` query parameter, or an empty string when absent
    pub fn code(&self) -> &str {
        self.param("code").unwrap_or("")
    }

    /// Looks up a decoded query parameter by name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Answers `200 OK` with [`SUCCESS_BODY`] and closes the connection
    pub async fn respond_success(self) -> Result<()> {
        self.respond(200, "OK", SUCCESS_BODY).await
    }

    /// Answers `500` with [`FAILURE_BODY`] and closes the connection
    pub async fn respond_failure(self) -> Result<()> {
        self.respond(500, "Internal Server Error", FAILURE_BODY).await
    }

    async fn respond(mut self, status: u16, reason: &str, body: &str) -> Result<()> {
        write_response(&mut self.stream, status, reason, body)
            .await
            .map_err(|e| ApsAuthError::Callback(format!("failed to answer the browser: {e}")))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_callback_url(callback_url: &str) -> Result<Url> {
    let url = Url::parse(callback_url).map_err(|e| {
        ApsAuthError::Config(format!("invalid callback URL '{callback_url}': {e}"))
    })?;

    if url.scheme() != "http" {
        return Err(ApsAuthError::Config(format!(
            "callback URL must use http, got '{}'",
            url.scheme()
        ))
        .into());
    }
    if url.host().is_none() {
        return Err(
            ApsAuthError::Config(format!("callback URL '{callback_url}' has no host")).into(),
        );
    }

    Ok(url)
}

/// Accepts connections until one carries a request for `callback_path`.
///
/// Each connection is read on its own task, so a peer that connects and
/// sends nothing (a browser preconnect, say) cannot hold up the redirect
/// arriving on another connection. Pending reads are aborted on return.
async fn accept_callback(listener: &TcpListener, callback_path: &str) -> Result<CallbackRequest> {
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted.map_err(|e| {
                    ApsAuthError::Callback(format!("failed to accept callback connection: {e}"))
                })?;
                connections.spawn(read_callback(stream, peer, callback_path.to_string()));
            }
            Some(joined) = connections.join_next(), if !connections.is_empty() => {
                match joined {
                    Ok(Some(request)) => return Ok(request),
                    Ok(None) => {}
                    Err(e) => tracing::debug!(error = %e, "Callback connection task failed"),
                }
            }
        }
    }
}

/// Reads one connection. Yields the request when it targets
/// `callback_path`; answers anything else with `404` and yields `None`.
async fn read_callback(
    stream: TcpStream,
    peer: SocketAddr,
    callback_path: String,
) -> Option<CallbackRequest> {
    let (mut stream, target) =
        match tokio::time::timeout(REQUEST_READ_TIMEOUT, read_request_target(stream)).await {
            Ok(Ok(Some(read))) => read,
            Ok(Ok(None)) => {
                tracing::debug!(%peer, "Connection closed without a request");
                return None;
            }
            Ok(Err(e)) => {
                tracing::debug!(%peer, error = %e, "Ignoring unreadable callback connection");
                return None;
            }
            Err(_) => {
                tracing::debug!(%peer, "No request received in time, dropping connection");
                return None;
            }
        };

    let (path, query) = target.split_once('?').unwrap_or((target.as_str(), ""));
    if !path_matches(path, &callback_path) {
        tracing::debug!(%peer, path, "Request for unrelated path");
        if let Err(e) = write_response(&mut stream, 404, "Not Found", NOT_FOUND_BODY).await {
            tracing::debug!(%peer, error = %e, "Failed to answer unrelated request");
        }
        return None;
    }

    let params: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let request = CallbackRequest { stream, params };
    if let Some(error) = request.param("error") {
        tracing::warn!(
            error,
            description = request.param("error_description").unwrap_or(""),
            "Provider redirected with an error"
        );
    }
    tracing::info!(%peer, has_code = !request.code().is_empty(), "Received authorization callback");

    Some(request)
}

/// Reads the request head and returns the stream with the request target
/// (`/path?query`). Returns `None` if the peer closed before sending a
/// request line. A head longer than [`MAX_REQUEST_HEAD_BYTES`] is an error.
async fn read_request_target(stream: TcpStream) -> std::io::Result<Option<(TcpStream, String)>> {
    let mut reader = BufReader::new(stream);
    let mut head = (&mut reader).take(MAX_REQUEST_HEAD_BYTES);

    let mut request_line = String::new();
    if head.read_line(&mut request_line).await? == 0 {
        return Ok(None);
    }
    if head.limit() == 0 && !request_line.ends_with('\n') {
        return Err(oversized_head());
    }

    // Drain headers up to the blank line.
    let mut line = String::new();
    loop {
        line.clear();
        let read = head.read_line(&mut line).await?;
        if head.limit() == 0 && !line.ends_with('\n') {
            return Err(oversized_head());
        }
        if read == 0 || line.trim_end().is_empty() {
            break;
        }
    }

    // "GET /api/auth/callback?code=... HTTP/1.1"
    let target = request_line.split_whitespace().nth(1).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("malformed request line: {}", request_line.trim_end()),
        )
    })?;
    let target = target.to_string();

    Ok(Some((reader.into_inner(), target)))
}

fn oversized_head() -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("request head exceeds {MAX_REQUEST_HEAD_BYTES} bytes"),
    )
}

/// Prefix match on path segments: `/cb` matches `/cb`, `/cb/` and
/// `/cb/extra`, but not `/cbx`.
fn path_matches(request_path: &str, callback_path: &str) -> bool {
    let base = callback_path.trim_end_matches('/');
    if base.is_empty() {
        return true;
    }
    match request_path.strip_prefix(base) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

async fn write_response(
    stream: &mut TcpStream,
    status: u16,
    reason: &str,
    body: &str,
) -> std::io::Result<()> {
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.flush().await?;
    stream.shutdown().await
}
