//! Local credential-injecting proxy forwarder
//!
//! Browsers cannot take proxy credentials on the command line, and passing
//! them would expose them to the browser process. A credentialed upstream is
//! therefore fronted by a loopback listener that adds the
//! `Proxy-Authorization` header to every request head the browser sends.
//! Plain requests on a kept-alive connection are re-framed one at a time; a
//! `CONNECT` turns the connection into a raw tunnel. Credential-less
//! upstreams are passed through unchanged.

use crate::identity::proxy::ProxyEndpoint;
use crate::{HarvestError, HarvestResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Upper bound on a request head read from the browser
const MAX_HEAD_BYTES: usize = 32 * 1024;

/// A proxy address safe to hand to the browser process
///
/// Dropping the endpoint stops its forwarder.
#[derive(Debug)]
pub struct AnonymizedEndpoint {
    proxy_server: String,
    upstream: String,
    shutdown: Option<CancellationToken>,
}

struct Upstream {
    host: String,
    port: u16,
    authorization: String,
}

impl AnonymizedEndpoint {
    /// Uses `endpoint` directly; only valid when it carries no credentials
    pub fn passthrough(endpoint: &ProxyEndpoint) -> Self {
        Self {
            proxy_server: endpoint.server_address(),
            upstream: endpoint.to_string(),
            shutdown: None,
        }
    }

    /// Starts a loopback forwarder for a credentialed endpoint, or passes a
    /// credential-less one through
    pub async fn start(endpoint: &ProxyEndpoint) -> HarvestResult<Self> {
        let Some((user, pass)) = endpoint.credentials() else {
            return Ok(Self::passthrough(endpoint));
        };

        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(|e| HarvestError::Proxy(format!("failed to bind forwarder: {}", e)))?;
        let local = listener
            .local_addr()
            .map_err(|e| HarvestError::Proxy(format!("failed to read forwarder address: {}", e)))?;

        let upstream = Arc::new(Upstream {
            host: endpoint.host().to_string(),
            port: endpoint.port(),
            authorization: basic_authorization(user, pass),
        });

        let token = CancellationToken::new();
        tokio::spawn(serve(listener, upstream, token.clone()));

        debug!("Forwarding 127.0.0.1:{} to {}", local.port(), endpoint);

        Ok(Self {
            proxy_server: format!("http://127.0.0.1:{}", local.port()),
            upstream: endpoint.to_string(),
            shutdown: Some(token),
        })
    }

    /// Address for the browser's `--proxy-server` flag
    pub fn proxy_server(&self) -> &str {
        &self.proxy_server
    }

    /// Redacted description of the upstream endpoint
    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// Returns true if a local forwarder is running for this endpoint
    pub fn is_forwarded(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    /// Stops the forwarder. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(token) = self.shutdown.take() {
            token.cancel();
        }
    }
}

impl Drop for AnonymizedEndpoint {
    fn drop(&mut self) {
        self.close();
    }
}

fn basic_authorization(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user, pass)))
}

async fn serve(listener: TcpListener, upstream: Arc<Upstream>, token: CancellationToken) {
    loop {
        let accepted = tokio::select! {
            _ = token.cancelled() => break,
            accepted = listener.accept() => accepted,
        };

        let (client, _) = match accepted {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Forwarder accept failed: {}", e);
                continue;
            }
        };

        let upstream = Arc::clone(&upstream);
        let token = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                result = forward(client, &upstream) => {
                    if let Err(e) = result {
                        debug!("Forwarded connection ended: {}", e);
                    }
                }
            }
        });
    }
}

async fn forward(client: TcpStream, upstream: &Upstream) -> io::Result<()> {
    let server = TcpStream::connect((upstream.host.as_str(), upstream.port)).await?;
    let (client_read, mut client_write) = client.into_split();
    let (mut server_read, mut server_write) = server.into_split();

    let requests = async {
        let mut reader = HeadReader::new(client_read);
        while let Some(head) = reader.next_head().await? {
            match body_framing(&head)? {
                Framing::Length(len) => {
                    let head = inject_authorization(&head, &upstream.authorization, false);
                    server_write.write_all(head.as_bytes()).await?;
                    reader.copy_body(len, &mut server_write).await?;
                }
                framing => {
                    // Nothing after a tunnel or a chunked body is parsed again
                    let close = framing == Framing::Chunked;
                    let head = inject_authorization(&head, &upstream.authorization, close);
                    server_write.write_all(head.as_bytes()).await?;
                    reader.copy_rest(&mut server_write).await?;
                    break;
                }
            }
        }
        server_write.shutdown().await
    };

    let responses = async {
        tokio::io::copy(&mut server_read, &mut client_write).await?;
        client_write.shutdown().await
    };

    tokio::try_join!(requests, responses)?;
    Ok(())
}

/// How the bytes after a request head are delimited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    Length(u64),
    Chunked,
    Tunnel,
}

fn body_framing(head: &str) -> io::Result<Framing> {
    if head
        .split_whitespace()
        .next()
        .is_some_and(|method| method.eq_ignore_ascii_case("CONNECT"))
    {
        return Ok(Framing::Tunnel);
    }

    let mut length = 0;
    for line in head.split("\r\n").skip(1) {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.eq_ignore_ascii_case("transfer-encoding")
            && value.to_ascii_lowercase().contains("chunked")
        {
            return Ok(Framing::Chunked);
        }
        if name.eq_ignore_ascii_case("content-length") {
            length = value.trim().parse().map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidData, "invalid Content-Length")
            })?;
        }
    }
    Ok(Framing::Length(length))
}

/// Splits request heads off a byte stream, keeping whatever was read past them
struct HeadReader<R> {
    inner: R,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> HeadReader<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(4096),
        }
    }

    /// Reads up to and including the blank line ending the next request head.
    ///
    /// Returns `None` when the peer closes between requests.
    async fn next_head(&mut self) -> io::Result<Option<String>> {
        let mut chunk = [0u8; 4096];

        loop {
            if let Some(pos) = self.buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let rest = self.buf.split_off(pos + 4);
                let head = std::mem::replace(&mut self.buf, rest);
                return Ok(Some(String::from_utf8_lossy(&head).into_owned()));
            }

            if self.buf.len() > MAX_HEAD_BYTES {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "request head too large",
                ));
            }

            let n = self.inner.read(&mut chunk).await?;
            if n == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed inside a request head",
                ));
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Forwards exactly `len` body bytes
    async fn copy_body<W: AsyncWrite + Unpin>(&mut self, len: u64, out: &mut W) -> io::Result<()> {
        let buffered = self.buf.len().min(usize::try_from(len).unwrap_or(usize::MAX));
        out.write_all(&self.buf[..buffered]).await?;
        self.buf = self.buf.split_off(buffered);

        let remaining = len - buffered as u64;
        if remaining > 0 {
            let copied = tokio::io::copy(&mut (&mut self.inner).take(remaining), out).await?;
            if copied < remaining {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed inside a request body",
                ));
            }
        }
        Ok(())
    }

    /// Forwards everything left on the stream unchanged
    async fn copy_rest<W: AsyncWrite + Unpin>(&mut self, out: &mut W) -> io::Result<()> {
        out.write_all(&self.buf).await?;
        self.buf.clear();
        tokio::io::copy(&mut self.inner, out).await?;
        Ok(())
    }
}

/// Rewrites a request head so it carries exactly one `Proxy-Authorization`
///
/// With `close` set, connection headers are replaced by `Connection: close`.
fn inject_authorization(head: &str, authorization: &str, close: bool) -> String {
    let mut lines = head.trim_end_matches("\r\n").split("\r\n");
    let mut out = String::with_capacity(head.len() + authorization.len() + 64);

    if let Some(request_line) = lines.next() {
        out.push_str(request_line);
        out.push_str("\r\n");
    }

    for line in lines {
        let lower = line.to_ascii_lowercase();
        if line.is_empty()
            || lower.starts_with("proxy-authorization:")
            || (close
                && (lower.starts_with("connection:") || lower.starts_with("proxy-connection:")))
        {
            continue;
        }
        out.push_str(line);
        out.push_str("\r\n");
    }

    if close {
        out.push_str("Connection: close\r\n");
    }
    out.push_str("Proxy-Authorization: ");
    out.push_str(authorization);
    out.push_str("\r\n\r\n");
    out
}
