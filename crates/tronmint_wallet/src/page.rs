//! Page context: where a wallet provider gets injected, and the page-level
//! event bus it announces itself on.
//!
//! Components never read a global. They hold an `Arc<PageContext>` and ask
//! it for the provider, which is injected at most once per session.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::WalletError;
use crate::provider::WalletProvider;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Action carried by the wallet's "node changed" page message.
pub const ACTION_SET_NODE: &str = "setNode";

/// A generic page message with an action discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMessage {
    pub action: String,
    #[serde(default)]
    pub data: Value,
}

impl PageMessage {
    pub fn new(action: impl Into<String>, data: Value) -> Self {
        Self {
            action: action.into(),
            data,
        }
    }
}

/// Events broadcast on the page bus.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    /// A wallet provider has been injected.
    ProviderInitialized,
    Message(PageMessage),
}

/// Shared page state for one session.
pub struct PageContext {
    provider: OnceCell<Arc<dyn WalletProvider>>,
    events: broadcast::Sender<PageEvent>,
}

impl PageContext {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            provider: OnceCell::new(),
            events,
        }
    }

    /// Context that starts with a provider already present.
    pub fn with_provider(provider: Arc<dyn WalletProvider>) -> Self {
        let page = Self::new();
        let _ = page.provider.set(provider);
        page
    }

    /// Inject the wallet provider and announce it on the bus.
    ///
    /// The reference is write-once: a second injection fails and the
    /// original provider stays in place.
    pub fn inject(&self, provider: Arc<dyn WalletProvider>) -> Result<(), WalletError> {
        self.provider
            .set(provider)
            .map_err(|_| WalletError::ProviderAlreadyInjected)?;
        info!("wallet provider injected");
        // No subscribers is fine: nobody is waiting.
        let _ = self.events.send(PageEvent::ProviderInitialized);
        Ok(())
    }

    /// The injected provider, if any.
    pub fn provider(&self) -> Option<Arc<dyn WalletProvider>> {
        self.provider.get().cloned()
    }

    pub fn has_provider(&self) -> bool {
        self.provider.get().is_some()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PageEvent> {
        self.events.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Broadcast a generic page message.
    pub fn post_message(&self, message: PageMessage) {
        debug!(action = %message.action, "page message posted");
        let _ = self.events.send(PageEvent::Message(message));
    }
}

impl Default for PageContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageContext")
            .field("has_provider", &self.has_provider())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Message handling
// ---------------------------------------------------------------------------

/// How a page message was interpreted. Purely informational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// The wallet switched full node.
    NodeChanged { full_node: Option<String> },
    /// Any other action.
    Ignored,
}

/// Interpret a page message. Has no side effects.
pub fn classify_message(message: &PageMessage) -> MessageKind {
    if message.action == ACTION_SET_NODE {
        let full_node = message
            .data
            .get("node")
            .and_then(|node| node.get("fullNode"))
            .and_then(Value::as_str)
            .map(str::to_string);
        MessageKind::NodeChanged { full_node }
    } else {
        MessageKind::Ignored
    }
}

/// Log a page message. Nothing else happens in response to it.
pub fn log_message(message: &PageMessage) -> MessageKind {
    let kind = classify_message(message);
    match &kind {
        MessageKind::NodeChanged { full_node } => {
            info!(full_node = ?full_node, "wallet node changed");
        }
        MessageKind::Ignored => {
            debug!(action = %message.action, "ignoring page message");
        }
    }
    kind
}

/// Background task that logs every page message.
pub struct PageMessageListener {
    handle: JoinHandle<()>,
}

impl PageMessageListener {
    pub fn spawn(page: &PageContext) -> Self {
        let mut events = page.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(PageEvent::Message(message)) => {
                        log_message(&message);
                    }
                    Ok(PageEvent::ProviderInitialized) => {
                        debug!("provider initialized event observed");
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "page message listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Self { handle }
    }

    /// Abort the task and wait until its subscription is released.
    pub async fn stop(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_node_is_classified_as_node_change() {
        let message = PageMessage::new(
            ACTION_SET_NODE,
            json!({ "node": { "fullNode": "https://api.nileex.io" } }),
        );
        assert_eq!(
            classify_message(&message),
            MessageKind::NodeChanged {
                full_node: Some("https://api.nileex.io".into())
            }
        );
    }

    #[test]
    fn set_node_without_payload_still_classified() {
        let message = PageMessage::new(ACTION_SET_NODE, Value::Null);
        assert_eq!(
            classify_message(&message),
            MessageKind::NodeChanged { full_node: None }
        );
    }

    #[test]
    fn unrelated_action_is_ignored_and_changes_nothing() {
        let page = PageContext::new();
        let message = PageMessage::new("tabReply", json!({ "anything": 1 }));

        assert_eq!(log_message(&message), MessageKind::Ignored);
        page.post_message(message);

        assert!(!page.has_provider());
    }

    #[test]
    fn post_message_reaches_subscribers() {
        let page = PageContext::new();
        let mut rx = page.subscribe();
        page.post_message(PageMessage::new("connect", Value::Null));

        match rx.try_recv().unwrap() {
            PageEvent::Message(m) => assert_eq!(m.action, "connect"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn stopped_listener_releases_its_subscription() {
        let page = PageContext::new();
        let listener = PageMessageListener::spawn(&page);
        assert_eq!(page.subscriber_count(), 1);

        page.post_message(PageMessage::new(ACTION_SET_NODE, Value::Null));
        listener.stop().await;

        assert_eq!(page.subscriber_count(), 0);
    }

    #[test]
    fn page_message_deserializes_without_data() {
        let message: PageMessage = serde_json::from_str(r#"{ "action": "setAccount" }"#).unwrap();
        assert_eq!(message.action, "setAccount");
        assert_eq!(message.data, Value::Null);
    }
}
