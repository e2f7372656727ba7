//! Capability interfaces for external collaborators.
//!
//! The engine depends only on these narrow traits; the concrete browser,
//! CAPTCHA service, and VPN/proxy mechanics live outside this crate. Tests
//! supply mocks, the binary ships logging-only stubs for dry runs.

pub mod stub;

use std::collections::HashSet;

use async_trait::async_trait;

use crate::behavior::{DeviceType, InteractionKind};
use crate::error::Result;

/// A live browser page the engine can drive.
#[async_trait]
pub trait PageSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Title of the currently loaded page. Empty means the load failed.
    async fn page_title(&mut self) -> Result<String>;

    /// Visible text of the currently loaded page.
    async fn page_text(&mut self) -> Result<String>;

    /// All link hrefs on the current page, in document order.
    async fn collect_links(&mut self) -> Result<Vec<String>>;

    /// Same-domain links not yet in `visited`.
    async fn find_internal_links(
        &mut self,
        base_url: &str,
        visited: &HashSet<String>,
    ) -> Result<Vec<String>>;

    /// Perform one simulated user interaction on the current page.
    async fn run_interaction(&mut self, kind: InteractionKind) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

/// Acquires configured browser sessions.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn acquire(&self, use_proxy: bool, device: DeviceType) -> Result<Box<dyn PageSession>>;
}

/// Detects and solves CAPTCHAs on a live session.
#[async_trait]
pub trait CaptchaSolver: Send + Sync {
    /// Returns true when a CAPTCHA was present and solved, false when none
    /// was found.
    async fn detect_and_solve(&self, session: &mut dyn PageSession) -> Result<bool>;
}

/// A VPN provider/region pair offered for connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpnSelection {
    pub provider: String,
    pub region: String,
}

/// Supplies VPN and proxy identities. Selections returning `None` mean the
/// resource is exhausted or disabled; the engine then falls back to a direct
/// connection.
#[async_trait]
pub trait NetworkIdentityProvider: Send + Sync {
    async fn select_vpn(&self) -> Option<VpnSelection>;

    async fn connect(&self, provider: &str, region: &str) -> Result<bool>;

    async fn disconnect_all(&self) -> Result<bool>;

    async fn select_proxy(&self) -> Option<String>;

    async fn current_public_ip(&self) -> Result<String>;
}
