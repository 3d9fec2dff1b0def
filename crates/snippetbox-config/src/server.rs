use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// HTTPS server configuration.
///
/// Timeouts bound how long a slow or stalled client can hold a connection:
/// the TLS handshake and request head must arrive within `read_timeout`, a
/// response must be produced within `write_timeout`, and a keep-alive
/// connection with nothing in flight is closed after `idle_timeout`.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: String,
    pub tls_cert_path: PathBuf,
    pub tls_key_path: PathBuf,
    pub static_dir: PathBuf,
    pub idle_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:4000".to_string(),
            tls_cert_path: PathBuf::from("./tls/cert.pem"),
            tls_key_path: PathBuf::from("./tls/key.pem"),
            static_dir: PathBuf::from("./ui/static"),
            idle_timeout: Duration::from_secs(60),
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(10),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            addr: env::var("ADDR").unwrap_or(defaults.addr),
            tls_cert_path: env::var("TLS_CERT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.tls_cert_path),
            tls_key_path: env::var("TLS_KEY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.tls_key_path),
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            idle_timeout: secs_from_env("IDLE_TIMEOUT_SECS", defaults.idle_timeout),
            read_timeout: secs_from_env("READ_TIMEOUT_SECS", defaults.read_timeout),
            write_timeout: secs_from_env("WRITE_TIMEOUT_SECS", defaults.write_timeout),
        }
    }
}

fn secs_from_env(key: &str, default: Duration) -> Duration {
    Duration::from_secs(crate::env_or(key, default.as_secs()))
}
