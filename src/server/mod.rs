// Server module entry point
// Binds the listener, runs the accept loop and handles shutdown signals

pub mod connection;
pub mod listener;
pub mod signal;

// Rust does not allow `loop` as a module name (keyword), so use server_loop
#[path = "loop.rs"]
pub mod server_loop;

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::{AppState, Config};
use crate::policy::DevPolicy;

// Re-export common types
pub use listener::create_listener;
pub use signal::shutdown_signal;

/// A bound development server, ready to accept connections
pub struct DevServer {
    listener: TcpListener,
    state: Arc<AppState>,
}

impl DevServer {
    /// Bind `server.host:server.port` and serve `root` with the development
    /// policy.
    pub fn bind(config: Config, root: PathBuf) -> io::Result<Self> {
        let addr = config
            .get_socket_addr()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let listener = create_listener(addr)?;
        Ok(Self {
            listener,
            state: Arc::new(AppState::new(config, root, DevPolicy)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn root(&self) -> &Path {
        &self.state.root
    }

    /// Serve until `shutdown` resolves
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        server_loop::run_until(self.listener, self.state, shutdown).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    fn test_config(root: &Path) -> Config {
        let mut config = Config::defaults().unwrap();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.server.root = Some(root.to_string_lossy().into_owned());
        config.logging.access_log = false;
        config
    }

    /// Send one request with `Connection: close` and return the raw response
    async fn raw_request(addr: SocketAddr, method: &str, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "{method} {path} HTTP/1.1\r\nHost: localhost\r\nOrigin: http://localhost:3000\r\nConnection: close\r\n\r\n"
        );
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8_lossy(&response).into_owned()
    }

    fn header_lines(raw: &str) -> Vec<String> {
        raw.split("\r\n\r\n")
            .next()
            .unwrap()
            .lines()
            .map(str::to_ascii_lowercase)
            .collect()
    }

    fn assert_cors(raw: &str) {
        let headers = header_lines(raw);
        assert!(headers.contains(&"access-control-allow-origin: *".to_string()), "{raw}");
        assert!(headers.contains(&"access-control-allow-methods: get, options".to_string()), "{raw}");
        assert!(headers.contains(&"access-control-allow-headers: content-type".to_string()), "{raw}");
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::fs::write(root.join("module.mjs"), "export default 42;\n").unwrap();
        std::fs::write(root.join("app.wasm"), b"\0asm\x01\0\0\0").unwrap();

        let server = DevServer::bind(test_config(&root), root.clone()).unwrap();
        let addr = server.local_addr().unwrap();
        assert_eq!(server.root(), root.as_path());

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.run_until(async {
            let _ = stop_rx.await;
        }));

        let raw = raw_request(addr, "GET", "/module.mjs").await;
        assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"), "{raw}");
        assert!(header_lines(&raw).contains(&"content-type: text/javascript".to_string()));
        assert!(raw.ends_with("export default 42;\n"));
        assert_cors(&raw);

        let raw = raw_request(addr, "GET", "/app.wasm").await;
        assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"), "{raw}");
        assert!(header_lines(&raw).contains(&"content-type: application/wasm".to_string()));

        let raw = raw_request(addr, "GET", "/missing.txt").await;
        assert!(raw.starts_with("HTTP/1.1 404 Not Found\r\n"), "{raw}");
        assert_cors(&raw);

        let raw = raw_request(addr, "OPTIONS", "/anything").await;
        assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"), "{raw}");
        assert!(raw.ends_with("\r\n\r\n"), "body must be empty: {raw}");
        assert_cors(&raw);

        let raw = raw_request(addr, "POST", "/module.mjs").await;
        assert!(raw.starts_with("HTTP/1.1 501 Not Implemented\r\n"), "{raw}");
        assert_cors(&raw);

        stop_tx.send(()).unwrap();
        handle.await.unwrap();

        // Listener is closed once the loop has returned
        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn test_bind_rejects_bad_host() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.server.host = "not a host".to_string();
        assert!(DevServer::bind(config, dir.path().to_path_buf()).is_err());
    }
}
