// Signal handling module
//
// - SIGINT (Ctrl+C): stop serving
// - SIGTERM:         stop serving (unix only)

use std::future::Future;

use crate::logger;

/// Future that resolves once the process is asked to stop.
///
/// The handlers are installed when this is called, not when the future is
/// first polled, so a signal arriving right after the banner is not lost.
/// Must be called inside the runtime.
#[cfg(unix)]
pub fn shutdown_signal() -> impl Future<Output = ()> {
    use tokio::signal::unix::{signal, SignalKind};

    let interrupt = signal(SignalKind::interrupt());
    let terminate = signal(SignalKind::terminate());

    async move {
        tokio::select! {
            () = wait_for(interrupt, "SIGINT") => {}
            () = wait_for(terminate, "SIGTERM") => {}
        }
    }
}

#[cfg(not(unix))]
pub fn shutdown_signal() -> impl Future<Output = ()> {
    async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            logger::log_error(&format!("Failed to listen for Ctrl+C: {e}"));
            std::future::pending::<()>().await;
        }
    }
}

/// Wait on a registered signal. A failed registration never resolves.
#[cfg(unix)]
async fn wait_for(registered: std::io::Result<tokio::signal::unix::Signal>, name: &str) {
    match registered {
        Ok(mut sig) => {
            sig.recv().await;
        }
        Err(e) => {
            logger::log_error(&format!("Failed to register {name} handler: {e}"));
            std::future::pending::<()>().await;
        }
    }
}
