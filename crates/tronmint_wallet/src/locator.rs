//! Waits for a wallet provider to show up in the page context.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::WalletError;
use crate::page::{PageContext, PageEvent};
use crate::provider::WalletProvider;

/// How long to wait for the wallet to announce itself.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(3000);

/// Resolve the page's wallet provider.
///
/// Returns immediately when a provider is already injected. Otherwise races
/// the page's "provider initialized" notification against `timeout`, then
/// checks once more. The branch that loses the race is dropped.
pub async fn locate_provider(
    page: &PageContext,
    timeout: Duration,
) -> Result<Arc<dyn WalletProvider>, WalletError> {
    if let Some(provider) = page.provider() {
        return Ok(provider);
    }

    // Subscribe before the re-check so an injection in between is not missed.
    let mut events = page.subscribe();
    if let Some(provider) = page.provider() {
        return Ok(provider);
    }

    debug!(timeout_ms = timeout.as_millis() as u64, "waiting for wallet provider");
    tokio::select! {
        _ = provider_initialized(&mut events) => {
            debug!("wallet provider announced itself");
        }
        _ = tokio::time::sleep(timeout) => {
            debug!("wallet provider handshake timed out");
        }
    }

    page.provider().ok_or_else(|| {
        warn!("no wallet provider found");
        WalletError::ProviderNotFound
    })
}

/// Completes on the first `ProviderInitialized` event. If the bus closes,
/// never completes, leaving the decision to the timer.
async fn provider_initialized(events: &mut broadcast::Receiver<PageEvent>) {
    loop {
        match events.recv().await {
            Ok(PageEvent::ProviderInitialized) => return,
            Ok(PageEvent::Message(_)) => continue,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}

/// A page context paired with its handshake timeout.
#[derive(Debug, Clone)]
pub struct ProviderLocator {
    page: Arc<PageContext>,
    timeout: Duration,
}

impl ProviderLocator {
    pub fn new(page: Arc<PageContext>) -> Self {
        Self::with_timeout(page, DEFAULT_HANDSHAKE_TIMEOUT)
    }

    pub fn with_timeout(page: Arc<PageContext>, timeout: Duration) -> Self {
        Self { page, timeout }
    }

    pub fn page(&self) -> &Arc<PageContext> {
        &self.page
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn locate(&self) -> Result<Arc<dyn WalletProvider>, WalletError> {
        locate_provider(&self.page, self.timeout).await
    }

    /// Like [`locate`](Self::locate), but "not found" becomes `None`.
    pub async fn try_locate(&self) -> Option<Arc<dyn WalletProvider>> {
        self.locate().await.ok()
    }
}
