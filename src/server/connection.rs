// Connection handling module
// Serves a single accepted TCP connection over HTTP/1.1

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::config::{AppState, PerformanceConfig};
use crate::handler;
use crate::logger;

/// Connection timing derived from the performance settings
#[derive(Debug, PartialEq, Eq)]
struct Timeouts {
    keep_alive: bool,
    /// Wait for the next request head, idle keep-alive time included
    header_read: Duration,
    /// Bound on the whole connection
    connection: Duration,
}

impl Timeouts {
    fn from_config(perf: &PerformanceConfig) -> Self {
        let keep_alive = perf.keep_alive_timeout > 0;
        let header_read = if keep_alive {
            perf.keep_alive_timeout
        } else {
            perf.read_timeout
        };
        Self {
            keep_alive,
            header_read: Duration::from_secs(header_read),
            connection: Duration::from_secs(
                perf.read_timeout
                    .max(perf.write_timeout)
                    .max(perf.keep_alive_timeout),
            ),
        }
    }
}

/// Handle a single connection in a spawned task.
///
/// This function:
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Configures HTTP/1.1 keep-alive and the idle timeout
/// 3. Serves every request on the connection with the request handler
/// 4. Bounds the whole connection with the longest configured timeout
pub fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, state: Arc<AppState>) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let timeouts = Timeouts::from_config(&state.config.performance);
        let timeout_duration = timeouts.connection;

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .keep_alive(timeouts.keep_alive)
            .header_read_timeout(timeouts.header_read);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                handler::handle_request(req, Arc::clone(&service_state), Some(peer_addr))
            }),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            // Idle keep-alive connection closed by the header read timeout
            Ok(Err(err)) if err.is_timeout() => {}
            Ok(Err(err)) =>logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    timeout_duration.as_secs()
                ));
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perf(keep_alive_timeout: u64, read_timeout: u64, write_timeout: u64) -> PerformanceConfig {
        PerformanceConfig {
            keep_alive_timeout,
            read_timeout,
            write_timeout,
        }
    }

    #[test]
    fn test_keep_alive_timeout_applies() {
        let t = Timeouts::from_config(&perf(75, 30, 30));
        assert!(t.keep_alive);
        assert_eq!(t.header_read, Duration::from_secs(75));
        assert_eq!(t.connection, Duration::from_secs(75));
    }

    #[test]
    fn test_keep_alive_disabled() {
        let t = Timeouts::from_config(&perf(0, 10, 20));
        assert!(!t.keep_alive);
        assert_eq!(t.header_read, Duration::from_secs(10));
        assert_eq!(t.connection, Duration::from_secs(20));
    }
}
