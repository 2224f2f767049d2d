//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: State transitions
//! - [`App::run`]: Main event loop with rendering
//!
//! File and network work runs in a side-effect pass after `update`;
//! remote calls go to a worker thread and come back through a channel.

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use input::{FORMAT_KEYS, format_command_for_key};
pub use model::{Model, Pane, Prompt, PromptKind, Session, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;
use std::sync::Arc;

use crate::commands::DEFAULT_CODE_LANG;
use crate::remote::{HttpRemote, RemoteSync};
use crate::session::DEFAULT_STORAGE_KEY;

/// Main application struct that owns the configuration and runs the event loop.
pub struct App {
    store_path: PathBuf,
    storage_key: String,
    export_dir: PathBuf,
    code_lang: String,
    remote: Arc<dyn RemoteSync + Send + Sync>,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    /// Create a new application persisting to the store file at `store_path`.
    pub fn new(store_path: PathBuf) -> Self {
        Self {
            store_path,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            export_dir: PathBuf::from("."),
            code_lang: DEFAULT_CODE_LANG.to_string(),
            remote: Arc::new(HttpRemote::default()),
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// Use a different slot in the store.
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Directory downloads are written to.
    #[must_use]
    pub fn with_export_dir(mut self, dir: PathBuf) -> Self {
        self.export_dir = dir;
        self
    }

    /// Language tag for new code blocks.
    #[must_use]
    pub fn with_code_lang(mut self, lang: impl Into<String>) -> Self {
        self.code_lang = lang.into();
        self
    }

    /// Talk to the demo API at `url`.
    #[must_use]
    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote = Arc::new(HttpRemote::new(url));
        self
    }

    /// Replace the remote backend.
    #[must_use]
    pub fn with_remote(mut self, remote: Arc<dyn RemoteSync + Send + Sync>) -> Self {
        self.remote = remote;
        self
    }

    /// Set config paths to show in help.
    #[must_use]
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }
}
