// Configuration module entry point
// Loads layered configuration and resolves the serving root

mod state;
mod types;

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

// Re-export public types
pub use state::AppState;
pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "devserve";

/// Prefix for environment overrides, e.g. `DEVSERVE_SERVER__PORT=9000`
const ENV_PREFIX: &str = "DEVSERVE";

impl Config {
    /// Load configuration from specified file path (extension optional).
    /// The file is optional; environment variables override it.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::builder()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Built-in defaults only, no file or environment
    pub fn defaults() -> Result<Self, config::ConfigError> {
        Self::builder()?.build()?.try_deserialize()
    }

    fn builder(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("server.landing_page", "/examples/index.html")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "common")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default(
                "http.server_name",
                concat!("wasm-devserve/", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("http.directory_listing", true)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Resolve the directory to serve.
    ///
    /// Uses `server.root` when configured, otherwise the directory holding the
    /// running executable. The result is canonical and must be a directory.
    pub fn resolve_root(&self) -> io::Result<PathBuf> {
        let root = match self.server.root.as_deref() {
            Some(root) => PathBuf::from(root),
            None => {
                let exe = std::env::current_exe()?;
                exe.parent().map(PathBuf::from).ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("Executable has no parent directory: {}", exe.display()),
                    )
                })?
            }
        };

        let root = root.canonicalize()?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Serving root is not a directory: {}", root.display()),
            ));
        }
        Ok(root)
    }
}
