//! Host platform integration: the install prompt and background asset
//! caching.
//!
//! Hosts that can install the journal as a standalone app announce it once
//! via [`InstallPrompt::on_available`]. The announcement is held back and a
//! custom prompt is shown instead, unless the user dismissed it before.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::storage::KeyValueStore;

/// Storage key for the "install prompt dismissed" flag.
pub const INSTALL_DISMISSED_KEY: &str = "pwaInstallDismissed";

/// What the user chose in the platform install flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The app was installed.
    Accepted,
    /// The user backed out.
    Dismissed,
}

/// Services the hosting platform provides.
#[async_trait]
pub trait HostPlatform: Send + Sync + std::fmt::Debug {
    /// Platform name for logs and status output.
    fn name(&self) -> &'static str;

    /// Run the platform's own install flow.
    ///
    /// # Errors
    ///
    /// Returns an error if the flow could not be shown.
    async fn prompt_install(&self) -> Result<InstallOutcome>;

    /// Register the background worker that keeps static assets available
    /// offline.
    ///
    /// # Errors
    ///
    /// Returns an error if registration was refused.
    fn register_asset_cache(&self) -> Result<()>;
}

/// Register the asset cache, logging the result. Never fails.
pub fn register_asset_cache(platform: &dyn HostPlatform) {
    match platform.register_asset_cache() {
        Ok(()) => debug!(platform = platform.name(), "Asset cache registered"),
        Err(e) => warn!(platform = platform.name(), error = %e, "Asset cache registration failed"),
    }
}

/// A host with no installer and nothing to cache: the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessPlatform;

#[async_trait]
impl HostPlatform for HeadlessPlatform {
    fn name(&self) -> &'static str {
        "headless"
    }

    async fn prompt_install(&self) -> Result<InstallOutcome> {
        Ok(InstallOutcome::Dismissed)
    }

    fn register_asset_cache(&self) -> Result<()> {
        Ok(())
    }
}

/// The custom install prompt.
#[derive(Debug)]
pub struct InstallPrompt {
    kv: Arc<dyn KeyValueStore>,
    deferred: bool,
    visible: bool,
}

impl InstallPrompt {
    /// Create a hidden prompt whose dismissed flag lives in `kv`.
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            deferred: false,
            visible: false,
        }
    }

    /// Whether the user dismissed the prompt in this or an earlier session.
    #[must_use]
    pub fn is_dismissed(&self) -> bool {
        match self.kv.get(INSTALL_DISMISSED_KEY) {
            Ok(value) => value.as_deref() == Some("true"),
            Err(e) => {
                warn!(error = %e, "Could not read install prompt flag");
                false
            }
        }
    }

    /// Whether the prompt should be on screen.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether an install offer is being held.
    #[must_use]
    pub fn has_deferred(&self) -> bool {
        self.deferred
    }

    /// The platform offered installation. Hold it and show the prompt
    /// unless it was dismissed before.
    pub fn on_available(&mut self) {
        self.deferred = true;
        self.visible = !self.is_dismissed();
        debug!(visible = self.visible, "Install offer deferred");
    }

    /// Hand the held offer to the platform install flow.
    ///
    /// Returns `None` when there is no held offer. The offer is consumed
    /// and the prompt hidden whatever the user chooses.
    pub async fn install(&mut self, platform: &dyn HostPlatform) -> Option<InstallOutcome> {
        if !self.deferred {
            return None;
        }

        let outcome = match platform.prompt_install().await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(platform = platform.name(), error = %e, "Install flow failed");
                InstallOutcome::Dismissed
            }
        };
        if outcome == InstallOutcome::Accepted {
            info!(platform = platform.name(), "App installed");
        }

        self.deferred = false;
        self.visible = false;
        Some(outcome)
    }

    /// Hide the prompt for good.
    ///
    /// # Errors
    ///
    /// Returns an error if the flag cannot be persisted; the prompt is hidden
    /// for this session regardless.
    pub fn dismiss(&mut self) -> Result<()> {
        self.visible = false;
        self.kv.set(INSTALL_DISMISSED_KEY, "true")
    }
}
