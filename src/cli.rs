use clap::Parser;
use snippetbox_config::{DatabaseConfig, ServerConfig};

/// Snippetbox web server.
#[derive(Debug, Parser)]
#[command(name = "snippetbox", version, about)]
pub struct Cli {
    /// HTTPS network address, e.g. `0.0.0.0:4000`
    #[arg(long, env = "ADDR")]
    pub addr: Option<String>,

    /// Postgres data source name
    #[arg(long, env = "DATABASE_URL")]
    pub dsn: Option<String>,

    /// Directory for rolling log files
    #[arg(long, env = "LOG_DIR", default_value = "storage/logs")]
    pub log_dir: String,
}

impl Cli {
    /// Lets flags win over values loaded from the environment.
    pub fn apply(&self, server: &mut ServerConfig, database: &mut DatabaseConfig) {
        if let Some(addr) = &self.addr {
            server.addr.clone_from(addr);
        }
        if let Some(dsn) = &self.dsn {
            database.url.clone_from(dsn);
        }
    }
}
