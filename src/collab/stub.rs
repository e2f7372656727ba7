//! Logging-only collaborator stubs for dry runs.
//!
//! These satisfy the capability traits without touching a real browser or
//! network, so the engine can be exercised end to end from the CLI.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::behavior::{DeviceType, InteractionKind};
use crate::collab::{BrowserDriver, CaptchaSolver, NetworkIdentityProvider, PageSession, VpnSelection};
use crate::error::Result;

/// Page session that records navigation in logs and fabricates page content.
#[derive(Debug, Default)]
pub struct LogOnlySession {
    current_url: Option<String>,
}

#[async_trait]
impl PageSession for LogOnlySession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        tracing::info!(url, "dry-run navigate");
        self.current_url = Some(url.to_string());
        Ok(())
    }

    async fn page_title(&mut self) -> Result<String> {
        Ok(self.current_url.clone().unwrap_or_default())
    }

    async fn page_text(&mut self) -> Result<String> {
        Ok(String::new())
    }

    async fn collect_links(&mut self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn find_internal_links(
        &mut self,
        _base_url: &str,
        _visited: &HashSet<String>,
    ) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn run_interaction(&mut self, kind: InteractionKind) -> Result<()> {
        tracing::debug!(kind = %kind, "dry-run interaction");
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.current_url = None;
        Ok(())
    }
}

/// Browser driver handing out [`LogOnlySession`]s.
#[derive(Debug, Default)]
pub struct LogOnlyBrowser;

#[async_trait]
impl BrowserDriver for LogOnlyBrowser {
    async fn acquire(&self, use_proxy: bool, device: DeviceType) -> Result<Box<dyn PageSession>> {
        tracing::info!(use_proxy, device = %device, "dry-run session acquired");
        Ok(Box::new(LogOnlySession::default()))
    }
}

/// Captcha solver that never finds a CAPTCHA.
#[derive(Debug, Default)]
pub struct NoopCaptcha;

#[async_trait]
impl CaptchaSolver for NoopCaptcha {
    async fn detect_and_solve(&self, _session: &mut dyn PageSession) -> Result<bool> {
        Ok(false)
    }
}

/// Identity provider with no VPNs or proxies: every visit is direct.
#[derive(Debug, Default)]
pub struct DirectNetwork;

#[async_trait]
impl NetworkIdentityProvider for DirectNetwork {
    async fn select_vpn(&self) -> Option<VpnSelection> {
        None
    }

    async fn connect(&self, _provider: &str, _region: &str) -> Result<bool> {
        Ok(false)
    }

    async fn disconnect_all(&self) -> Result<bool> {
        Ok(true)
    }

    async fn select_proxy(&self) -> Option<String> {
        None
    }

    async fn current_public_ip(&self) -> Result<String> {
        Ok("0.0.0.0".to_string())
    }
}
