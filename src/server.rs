//! HTTPS server: rustls termination in front of an HTTP/1.1 hyper connection
//! per client, with read, write and idle limits.
//!
//! The TLS handshake and every request head must arrive within the read
//! timeout, and a request body may not stall for longer than it between
//! chunks. A response must be ready within the write timeout or the
//! connection is dropped without a response. A keep-alive connection with no
//! request in flight for the idle timeout is closed gracefully.

use std::fs::File;
use std::future::Future;
use std::io::{self, BufReader};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, anyhow};
use axum::{Router, extract::ConnectInfo, http::Request};
use hyper::{body::Incoming, server::conn::http1, service::service_fn};
use hyper_util::rt::{TokioIo, TokioTimer};
use rustls::ServerConfig as TlsConfig;
use rustls::crypto::ring::{default_provider, kx_group};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use snippetbox_config::ServerConfig;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;
use tower::Service;
use tower_http::timeout::TimeoutBody;
use tracing::{debug, info, warn};

const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug)]
struct Timeouts {
    read: Duration,
    write: Duration,
    idle: Duration,
}

impl From<&ServerConfig> for Timeouts {
    fn from(config: &ServerConfig) -> Self {
        Self {
            read: config.read_timeout,
            write: config.write_timeout,
            idle: config.idle_timeout,
        }
    }
}

/// Builds the rustls config: TLS 1.2 and 1.3, X25519 preferred over P-256,
/// HTTP/1.1 only.
pub fn load_tls_config(cert_path: &Path, key_path: &Path) -> anyhow::Result<TlsConfig> {
    let cert_chain = load_cert_chain(cert_path)?;
    let key = load_private_key(key_path)?;

    let mut provider = default_provider();
    provider.kx_groups = vec![kx_group::X25519, kx_group::SECP256R1];

    let mut config = TlsConfig::builder_with_provider(Arc::new(provider))
        .with_safe_default_protocol_versions()
        .context("Failed to select TLS protocol versions")?
        .with_no_client_auth()
        .with_single_cert(cert_chain, key)
        .context("Failed to build TLS server config")?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(config)
}

fn load_cert_chain(path: &Path) -> anyhow::Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open TLS certificate: {}", path.display()))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read TLS certificate: {}", path.display()))?;
    if certs.is_empty() {
        return Err(anyhow!("TLS certificate is empty: {}", path.display()));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> anyhow::Result<PrivateKeyDer<'static>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open TLS key: {}", path.display()))?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .with_context(|| format!("Failed to read TLS key: {}", path.display()))?
        .ok_or_else(|| anyhow!("TLS private key not found: {}", path.display()))
}

/// Accepts connections until `shutdown` resolves, then asks open connections
/// to finish their current request and waits for them.
pub async fn serve<F>(
    router: Router,
    config: &ServerConfig,
    tls: TlsConfig,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send,
{
    let listener = TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    info!(addr = %listener.local_addr()?, "Starting server");

    let acceptor = TlsAcceptor::from(Arc::new(tls));
    let timeouts = Timeouts::from(config);
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut connections = JoinSet::new();

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, remote) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "Failed to accept connection");
                        continue;
                    }
                };
                connections.spawn(handle_connection(
                    stream,
                    remote,
                    acceptor.clone(),
                    router.clone(),
                    timeouts,
                    stop_rx.clone(),
                ));
            }
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            () = &mut shutdown => break,
        }
    }

    info!(open = connections.len(), "Shutting down, draining connections");
    let _ = stop_tx.send(true);
    let drain = async { while connections.join_next().await.is_some() {} };
    if timeout(timeouts.write + timeouts.read, drain).await.is_err() {
        warn!(open = connections.len(), "Connections still open after drain period");
        connections.abort_all();
    }

    Ok(())
}

async fn handle_connection(
    stream: TcpStream,
    remote: SocketAddr,
    acceptor: TlsAcceptor,
    router: Router,
    timeouts: Timeouts,
    stop: watch::Receiver<bool>,
) {
    if let Err(e) = serve_connection(stream, remote, acceptor, router, timeouts, stop).await {
        debug!(remote_addr = %remote, error = %e, "Connection closed with error");
    }
}

async fn serve_connection(
    stream: TcpStream,
    remote: SocketAddr,
    acceptor: TlsAcceptor,
    router: Router,
    timeouts: Timeouts,
    mut stop: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let tls = timeout(timeouts.read, acceptor.accept(stream))
        .await
        .map_err(|_| anyhow!("TLS handshake timed out"))?
        .context("TLS handshake failed")?;

    let activity = Arc::new(ConnectionActivity::new());
    let service = {
        let activity = activity.clone();
        service_fn(move |req: Request<Incoming>| {
            let guard = activity.begin();
            let mut router = router.clone();
            let mut req = with_read_deadline(req, timeouts.read);
            req.extensions_mut().insert(ConnectInfo(remote));

            async move {
                let _guard = guard;
                match timeout(timeouts.write, router.call(req)).await {
                    Ok(Ok(response)) => Ok(response),
                    Ok(Err(infallible)) => match infallible {},
                    Err(_) => Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "response not ready within write timeout",
                    )),
                }
            }
        })
    };

    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(timeouts.read)
        .keep_alive(true);
    let conn = builder.serve_connection(TokioIo::new(tls), service);
    tokio::pin!(conn);

    let mut idle_check = tokio::time::interval(IDLE_CHECK_INTERVAL);
    let mut closing = false;
    loop {
        tokio::select! {
            result = conn.as_mut() => return result.context("HTTP connection error"),
            _ = stop.changed(), if !closing => {
                conn.as_mut().graceful_shutdown();
                closing = true;
            }
            _ = idle_check.tick(), if !closing => {
                if activity.idle_for() >= timeouts.idle {
                    debug!(remote_addr = %remote, "Closing idle connection");
                    conn.as_mut().graceful_shutdown();
                    closing = true;
                }
            }
        }
    }
}

/// Fails body reads that wait longer than `read` for the next chunk.
fn with_read_deadline<B>(req: Request<B>, read: Duration) -> Request<TimeoutBody<B>> {
    req.map(|body| TimeoutBody::new(read, body))
}

/// Tracks requests in flight on one connection and when the last one ended.
#[derive(Debug)]
struct ConnectionActivity {
    base: Instant,
    in_flight: AtomicUsize,
    last_seen_ms: AtomicU64,
}

impl ConnectionActivity {
    fn new() -> Self {
        Self {
            base: Instant::now(),
            in_flight: AtomicUsize::new(0),
            last_seen_ms: AtomicU64::new(0),
        }
    }

    fn begin(self: &Arc<Self>) -> ActivityGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.touch();
        ActivityGuard(self.clone())
    }

    fn touch(&self) {
        let now = u64::try_from(self.base.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.last_seen_ms.store(now, Ordering::SeqCst);
    }

    /// Zero while a request is in flight.
    fn idle_for(&self) -> Duration {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            return Duration::ZERO;
        }
        let last_seen = Duration::from_millis(self.last_seen_ms.load(Ordering::SeqCst));
        self.base.elapsed().saturating_sub(last_seen)
    }
}

struct ActivityGuard(Arc<ConnectionActivity>);

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.0.touch();
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::path::PathBuf;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use axum::body::{Body, Bytes};
    use hyper::body::Frame;

    use super::*;

    /// A request body whose sender never sends anything.
    struct Stalled;

    impl hyper::body::Body for Stalled {
        type Data = Bytes;
        type Error = Infallible;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, Infallible>>> {
            Poll::Pending
        }
    }

    #[tokio::test]
    async fn test_stalled_body_fails_after_read_timeout() {
        let req = with_read_deadline(Request::new(Stalled), Duration::from_millis(50));

        let read = axum::body::to_bytes(Body::new(req.into_body()), usize::MAX);
        let result = timeout(Duration::from_secs(5), read)
            .await
            .expect("read deadline fires before the outer guard");

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_prompt_body_passes_read_deadline() {
        let req = with_read_deadline(Request::new(Body::from("title=hi")), Duration::from_secs(1));

        let bytes = axum::body::to_bytes(Body::new(req.into_body()), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"title=hi");
    }

    fn missing_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("snippetbox-tls-test-{label}-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_missing_tls_files_fail() {
        assert!(load_cert_chain(&missing_path("cert")).is_err());
        assert!(load_private_key(&missing_path("key")).is_err());
        assert!(load_tls_config(&missing_path("cert"), &missing_path("key")).is_err());
    }

    #[test]
    fn test_empty_pem_files_fail() {
        let path = missing_path("empty");
        std::fs::write(&path, "").unwrap();

        assert!(load_cert_chain(&path).is_err());
        assert!(load_private_key(&path).is_err());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_activity_not_idle_while_request_in_flight() {
        let activity = Arc::new(ConnectionActivity::new());
        let guard = activity.begin();

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(activity.idle_for(), Duration::ZERO);

        drop(guard);
        std::thread::sleep(Duration::from_millis(20));
        assert!(activity.idle_for() >= Duration::from_millis(10));
    }

    #[test]
    fn test_activity_counts_overlapping_requests() {
        let activity = Arc::new(ConnectionActivity::new());
        let first = activity.begin();
        let second = activity.begin();

        drop(first);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(activity.idle_for(), Duration::ZERO);

        drop(second);
        assert_eq!(activity.in_flight.load(Ordering::SeqCst), 0);
    }
}
