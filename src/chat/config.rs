//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg`, the resolved
//! [`ChatConfig`] values, and [`ConfigState`], the live holder of the
//! user-toggleable options that notifies subscribers on every change.

use std::sync::Arc;
use std::time::Duration;

use arrrg_derive::CommandLine;
use tokio::sync::watch;

use crate::types::ProxySettings;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Command-line arguments for the chatterbox-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Backend base URL.
    #[arrrg(
        optional,
        "Backend base URL (default: $CHATTERBOX_BASE_URL or http://127.0.0.1:5000/)",
        "URL"
    )]
    pub base_url: Option<String>,

    /// Model to select after the catalog loads.
    #[arrrg(optional, "Model to switch to at startup", "MODEL")]
    pub model: Option<String>,

    /// Expand the thinking placeholder while waiting for replies.
    #[arrrg(flag, "Show thinking while waiting for replies")]
    pub show_thinking: bool,

    /// Ask the backend to search the web before answering.
    #[arrrg(flag, "Enable web search")]
    pub search: bool,

    /// Route backend traffic through an upstream proxy.
    #[arrrg(flag, "Enable the upstream proxy")]
    pub enable_proxy: bool,

    /// Proxy host or IP.
    #[arrrg(optional, "Proxy host or IP address", "HOST")]
    pub proxy_ip: Option<String>,

    /// Proxy port.
    #[arrrg(optional, "Proxy port", "PORT")]
    pub proxy_port: Option<String>,

    /// Per-request timeout.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for the chat client.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Backend base URL; `None` defers to the environment or the default.
    pub base_url: Option<String>,

    /// Per-request timeout.
    pub timeout: Duration,

    /// The selected model, once known.
    pub model: Option<String>,

    /// Whether the thinking placeholder starts expanded.
    pub show_thinking: bool,

    /// Whether chat requests ask for a web search.
    pub search: bool,

    /// Upstream proxy settings, passed through to the backend unvalidated.
    pub proxy: ProxySettings,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Timeout: 60 seconds
    /// - Thinking, search and proxy: disabled
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            model: None,
            show_thinking: false,
            search: false,
            proxy: ProxySettings::default(),
            use_color: true,
        }
    }

    /// Sets the backend base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the selected model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets whether thinking is shown.
    pub fn with_show_thinking(mut self, show: bool) -> Self {
        self.show_thinking = show;
        self
    }

    /// Sets whether web search is requested.
    pub fn with_search(mut self, search: bool) -> Self {
        self.search = search;
        self
    }

    /// Sets the proxy settings.
    pub fn with_proxy(mut self, proxy: ProxySettings) -> Self {
        self.proxy = proxy;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        ChatConfig {
            base_url: args.base_url,
            timeout: Duration::from_secs(args.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            model: args.model,
            show_thinking: args.show_thinking,
            search: args.search,
            proxy: ProxySettings::new(
                args.enable_proxy,
                args.proxy_ip.unwrap_or_default(),
                args.proxy_port.unwrap_or_default(),
            ),
            use_color: !args.no_color,
        }
    }
}

///////////////////////////////////////// ConfigState /////////////////////////////////////////

/// Live, shared holder of the user-toggleable options.
///
/// Clones share the same underlying value.  Every setter publishes the new
/// configuration to all receivers handed out by [`ConfigState::subscribe`].
#[derive(Debug, Clone)]
pub struct ConfigState {
    tx: Arc<watch::Sender<ChatConfig>>,
}

impl ConfigState {
    /// Creates a state holding `config`.
    pub fn new(config: ChatConfig) -> Self {
        let (tx, _) = watch::channel(config);
        Self { tx: Arc::new(tx) }
    }

    /// A receiver that observes every subsequent change.
    ///
    /// ```
    /// # tokio_test::block_on(async {
    /// use chatterbox::chat::{ChatConfig, ConfigState};
    ///
    /// let config = ConfigState::new(ChatConfig::new());
    /// let mut changes = config.subscribe();
    /// config.set_search(true);
    /// changes.changed().await.unwrap();
    /// assert!(changes.borrow().search);
    /// # });
    /// ```
    pub fn subscribe(&self) -> watch::Receiver<ChatConfig> {
        self.tx.subscribe()
    }

    /// A copy of the current configuration.
    pub fn snapshot(&self) -> ChatConfig {
        self.tx.borrow().clone()
    }

    /// The selected model.
    pub fn model(&self) -> Option<String> {
        self.tx.borrow().model.clone()
    }

    /// Whether thinking is shown.
    pub fn show_thinking(&self) -> bool {
        self.tx.borrow().show_thinking
    }

    /// Whether web search is requested.
    pub fn search_enabled(&self) -> bool {
        self.tx.borrow().search
    }

    /// The raw proxy settings.
    pub fn proxy(&self) -> ProxySettings {
        self.tx.borrow().proxy.clone()
    }

    /// Whether the proxy is enabled.
    pub fn proxy_enabled(&self) -> bool {
        self.tx.borrow().proxy.enabled
    }

    /// Records the selected model.
    pub fn set_model(&self, model: impl Into<String>) {
        let model = model.into();
        self.update(|config| config.model = Some(model));
    }

    /// Shows or hides thinking.
    pub fn set_show_thinking(&self, show: bool) {
        self.update(|config| config.show_thinking = show);
    }

    /// Enables or disables web search.
    pub fn set_search(&self, search: bool) {
        self.update(|config| config.search = search);
    }

    /// Enables or disables the proxy.
    pub fn set_proxy_enabled(&self, enabled: bool) {
        self.update(|config| config.proxy.enabled = enabled);
    }

    /// Sets the proxy host.
    pub fn set_proxy_host(&self, host: impl Into<String>) {
        let host = host.into();
        self.update(|config| config.proxy.host = host);
    }

    /// Sets the proxy port.
    pub fn set_proxy_port(&self, port: impl Into<String>) {
        let port = port.into();
        self.update(|config| config.proxy.port = port);
    }

    fn update(&self, f: impl FnOnce(&mut ChatConfig)) {
        self.tx.send_modify(f);
        tracing::debug!(config = ?*self.tx.borrow(), "configuration changed");
    }
}

impl Default for ConfigState {
    fn default() -> Self {
        Self::new(ChatConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert!(config.base_url.is_none());
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.model.is_none());
        assert!(!config.show_thinking);
        assert!(!config.search);
        assert_eq!(config.proxy, ProxySettings::default());
        assert!(config.use_color);
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::from(ChatArgs::default());
        assert_eq!(config, ChatConfig::new());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            base_url: Some("http://10.0.0.5:5000".to_string()),
            model: Some("mistral".to_string()),
            show_thinking: true,
            search: true,
            enable_proxy: true,
            proxy_ip: Some("10.0.0.1".to_string()),
            proxy_port: Some("3128".to_string()),
            timeout_secs: Some(5),
            no_color: true,
        };
        let config = ChatConfig::from(args);
        assert_eq!(config.base_url.as_deref(), Some("http://10.0.0.5:5000"));
        assert_eq!(config.model.as_deref(), Some("mistral"));
        assert!(config.show_thinking);
        assert!(config.search);
        assert_eq!(config.proxy, ProxySettings::new(true, "10.0.0.1", "3128"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(!config.use_color);
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_base_url("http://localhost:5000/")
            .with_timeout(Duration::from_secs(10))
            .with_model("qwen")
            .with_show_thinking(true)
            .with_search(true)
            .with_proxy(ProxySettings::new(true, "proxy", "8080"))
            .without_color();
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:5000/"));
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.model.as_deref(), Some("qwen"));
        assert!(config.show_thinking);
        assert!(config.search);
        assert!(config.proxy.enabled);
        assert!(!config.use_color);
    }

    #[test]
    fn state_getters_follow_setters() {
        let state = ConfigState::default();
        state.set_model("mistral");
        state.set_show_thinking(true);
        state.set_search(true);
        state.set_proxy_enabled(true);
        state.set_proxy_host(" 10.0.0.1 ");
        state.set_proxy_port("3128");
        assert_eq!(state.model().as_deref(), Some("mistral"));
        assert!(state.show_thinking());
        assert!(state.search_enabled());
        assert!(state.proxy_enabled());
        // Raw values; trimming happens where they are used.
        assert_eq!(state.proxy(), ProxySettings::new(true, " 10.0.0.1 ", "3128"));
    }

    #[test]
    fn clones_share_state() {
        let state = ConfigState::default();
        let other = state.clone();
        other.set_search(true);
        assert!(state.search_enabled());
    }

    #[tokio::test]
    async fn subscribers_are_notified() {
        let state = ConfigState::default();
        let mut rx = state.subscribe();
        state.set_show_thinking(true);
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().show_thinking);

        state.set_proxy_enabled(true);
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().proxy.enabled);
    }
}
