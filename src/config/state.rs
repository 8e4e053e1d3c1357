// Application state module
// Process-lifetime state shared by every connection

use std::path::PathBuf;

use super::types::Config;
use crate::handler::ServeHooks;

/// Application state
///
/// Immutable after startup, so connections share it through an `Arc`
/// without any locking.
pub struct AppState {
    pub config: Config,
    /// Canonical directory served at `/`
    pub root: PathBuf,
    /// Policy applied by the file server
    pub hooks: Box<dyn ServeHooks>,
}

impl AppState {
    pub fn new(config: Config, root: PathBuf, hooks: impl ServeHooks + 'static) -> Self {
        Self {
            config,
            root,
            hooks: Box::new(hooks),
        }
    }
}
