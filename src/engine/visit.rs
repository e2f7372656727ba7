//! Search and visit execution flows against the collaborator interfaces.
//!
//! Every flow is gated by the schedule first; a denied gate is a skip, not a
//! failure. Failures are surfaced to the worker, which counts and drops the
//! task. Quota is recorded only on confirmed completion.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{Duration, sleep};

use crate::behavior::{DeviceType, InteractionKind};
use crate::collab::PageSession;
use crate::engine::worker::WorkerContext;
use crate::error::{Result, TrafficError};

/// Odds of preferring a VPN over a proxy when both are available.
const VPN_PREFERENCE: f64 = 0.5;

struct IdentityUse {
    used_vpn: bool,
    use_proxy: bool,
}

/// Pick a network identity for this task. Exhausted VPN/proxy pools fall
/// back to a direct connection rather than failing.
async fn select_identity(ctx: &WorkerContext, rng: &mut StdRng) -> IdentityUse {
    let mut used_vpn = false;
    let mut use_proxy = false;

    if rng.gen_bool(VPN_PREFERENCE) {
        if let Some(vpn) = ctx.network.select_vpn().await {
            match ctx.network.connect(&vpn.provider, &vpn.region).await {
                Ok(true) => {
                    tracing::debug!(provider = %vpn.provider, region = %vpn.region, "vpn connected");
                    ctx.stats.record_vpn_switch();
                    used_vpn = true;
                }
                Ok(false) => {
                    tracing::warn!(provider = %vpn.provider, "vpn connect refused, going direct");
                }
                Err(e) => {
                    tracing::warn!(provider = %vpn.provider, error = %e, "vpn connect failed, going direct");
                }
            }
        }
    }

    if !used_vpn {
        if let Some(proxy) = ctx.network.select_proxy().await {
            tracing::debug!(proxy = %proxy, "proxy selected");
            ctx.stats.record_proxy_switch();
            use_proxy = true;
        }
    }

    IdentityUse { used_vpn, use_proxy }
}

/// Execute a search task. Returns the result URLs on success, an empty list
/// when the gate denies. Quota is recorded once the search completes.
pub(crate) async fn execute_search(ctx: &WorkerContext, keyword: &str) -> Result<Vec<String>> {
    if !ctx.gate_allows() {
        tracing::info!(keyword, "search skipped by schedule");
        return Ok(Vec::new());
    }

    let mut rng = StdRng::from_entropy();
    let identity = select_identity(ctx, &mut rng).await;

    let acquired = ctx.browser.acquire(identity.use_proxy, DeviceType::Desktop).await;
    let mut session = match acquired {
        Ok(session) => session,
        Err(e) => {
            if identity.used_vpn {
                let _ = ctx.network.disconnect_all().await;
            }
            return Err(e);
        }
    };

    let result = drive_search(ctx, session.as_mut(), keyword).await;
    let _ = session.close().await;

    if identity.used_vpn {
        let _ = ctx.network.disconnect_all().await;
    }

    let urls = result?;
    ctx.record_visit();
    tracing::info!(keyword, results = urls.len(), "search completed");
    Ok(urls)
}

async fn drive_search(
    ctx: &WorkerContext,
    session: &mut dyn PageSession,
    keyword: &str,
) -> Result<Vec<String>> {
    let search_url = format!("https://www.google.com/search?q={}", keyword.replace(' ', "+"));
    session.navigate(&search_url).await?;

    if ctx.captcha.detect_and_solve(session).await? {
        tracing::info!(keyword, "captcha solved during search");
        ctx.stats.record_captcha_solved();
    }

    let links = session.collect_links().await?;
    Ok(links.into_iter().filter(|href| !href.contains("google.com")).collect())
}

/// Execute a visit task. Returns false when the gate denies (skip), true on
/// a completed visit.
pub(crate) async fn execute_visit(ctx: &WorkerContext, url: &str) -> Result<bool> {
    if !ctx.gate_allows() {
        tracing::info!(url, "visit skipped by schedule");
        return Ok(false);
    }

    let url = ctx.tracking_url(url);
    ctx.stats.record_attempt(ctx.now());

    let mut rng = StdRng::from_entropy();
    let identity = select_identity(ctx, &mut rng).await;

    let device = ctx.profile.random_device(&mut rng);
    ctx.stats.record_device(device);

    let referrer = ctx.profile.random_referrer(&mut rng);
    ctx.stats.record_referrer(referrer.class());

    tracing::info!(url = %url, device = %device, referrer = %referrer, "visiting url");

    let acquired = ctx.browser.acquire(identity.use_proxy, device).await;
    let mut session = match acquired {
        Ok(session) => session,
        Err(e) => {
            if identity.used_vpn {
                let _ = ctx.network.disconnect_all().await;
            }
            return Err(e);
        }
    };

    let result = drive_visit(ctx, session.as_mut(), &url, &mut rng).await;
    let _ = session.close().await;

    if identity.used_vpn {
        let _ = ctx.network.disconnect_all().await;
    }

    result?;
    ctx.stats.record_success();
    ctx.record_visit();
    tracing::info!(url = %url, "visit completed");
    Ok(true)
}

async fn drive_visit(
    ctx: &WorkerContext,
    session: &mut dyn PageSession,
    url: &str,
    rng: &mut StdRng,
) -> Result<()> {
    session.navigate(url).await?;

    let title = session.page_title().await?;
    if title.is_empty() {
        return Err(TrafficError::Browser(format!("page failed to load: {}", url)));
    }

    if ctx.captcha.detect_and_solve(session).await? {
        tracing::info!(url, "captcha solved during visit");
        ctx.stats.record_captcha_solved();
    }

    let duration = ctx.profile.visit_duration(rng);

    if ctx.profile.should_bounce(rng) {
        tracing::info!(url, "bounce visit");
        session.run_interaction(InteractionKind::Scroll).await?;
        return Ok(());
    }

    let subpages = ctx.profile.subpage_count(rng);
    let (main_budget, subpage_budget) = if subpages > 0 {
        (duration * 0.4, duration * 0.6 / subpages as f64)
    } else {
        (duration, 0.0)
    };

    interact_with_page(ctx, session, main_budget, rng).await?;

    let mut visited: HashSet<String> = HashSet::from([url.to_string()]);
    let mut current = url.to_string();

    for i in 0..subpages {
        let links = session.find_internal_links(&current, &visited).await?;
        if links.is_empty() {
            tracing::debug!(url, "no more internal links to visit");
            break;
        }

        let next = links[rng.gen_range(0..links.len())].clone();
        tracing::debug!(subpage = i + 1, of = subpages, next = %next, "navigating to subpage");
        visited.insert(next.clone());
        session.navigate(&next).await?;
        current = next;

        interact_with_page(ctx, session, subpage_budget, rng).await?;
    }

    Ok(())
}

/// Run interaction ticks for a page's time budget: at least two, roughly one
/// per ten seconds of budget. Actual pacing comes from the configured delay
/// so tests can run fast.
async fn interact_with_page(
    ctx: &WorkerContext,
    session: &mut dyn PageSession,
    budget_secs: f64,
    rng: &mut StdRng,
) -> Result<()> {
    let ticks = ((budget_secs / 10.0) as u32).max(2);

    for _ in 0..ticks {
        let kind = ctx.profile.random_interaction(rng);
        if kind == InteractionKind::FormInteract
            && !rng.gen_bool(ctx.profile.settings().form_interaction_probability)
        {
            continue;
        }

        session.run_interaction(kind).await?;
        sleep(Duration::from_millis(ctx.pacing.interaction_delay_ms)).await;
    }

    Ok(())
}
