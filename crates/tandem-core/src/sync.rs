use std::collections::HashSet;

use crate::gateway::DomainKey;
use crate::gateway::GatewayError;
use crate::gateway::StoreGateway;
use crate::state::AppState;

/// Per-domain one-shot pending-inbound tokens.
///
/// A token is set immediately before an inbound load is applied and cleared
/// by the very next save decision for that domain, which then skips the
/// outward save. Exactly one save is suppressed per inbound event; a token
/// must never survive two consecutive state-change cycles for one domain.
#[derive(Debug, Default)]
pub struct SyncFlags {
    pending: HashSet<DomainKey>,
}

impl SyncFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_inbound(&mut self, domain: DomainKey) {
        self.pending.insert(domain);
    }

    /// Atomic test-and-clear. Returns whether the domain was pending-inbound.
    pub fn consume(&mut self, domain: DomainKey) -> bool {
        self.pending.remove(&domain)
    }

    pub fn is_pending(&self, domain: DomainKey) -> bool {
        self.pending.contains(&domain)
    }
}

/// Applies an inbound load (initial hydration or a remote-update push) for
/// `domain`, suppressing the echo save the apply would otherwise trigger.
///
/// The mark and its consume both happen inside this call; no other mutation
/// of the same domain can interleave because the caller holds the state.
pub async fn apply_inbound(
    state: &mut AppState,
    flags: &mut SyncFlags,
    gateway: &dyn StoreGateway,
    domain: DomainKey,
) -> Result<(), GatewayError> {
    flags.mark_inbound(domain);
    let value = gateway.load(domain).await?;
    state.apply_loaded(domain, value)?;
    persist_outbound(state, flags, gateway, domain).await;
    Ok(())
}

/// The single save decision point. Consumes a pending-inbound token instead
/// of saving; otherwise snapshots the domain and saves it outward. Gateway
/// rejections are logged and swallowed: the in-memory mutation is not rolled
/// back, so memory and store stay divergent until the next successful save.
pub async fn persist_outbound(
    state: &AppState,
    flags: &mut SyncFlags,
    gateway: &dyn StoreGateway,
    domain: DomainKey,
) -> bool {
    if flags.consume(domain) {
        tracing::debug!(%domain, "inbound token consumed, skipping echo save");
        return false;
    }
    let value = match state.snapshot(domain) {
        Ok(value) => value,
        Err(error) => {
            tracing::error!(%domain, %error, "snapshot failed, domain not persisted");
            return false;
        }
    };
    match gateway.save(domain, value).await {
        Ok(()) => true,
        Err(error) => {
            tracing::error!(%domain, %error, "save rejected, memory and store now diverge");
            false
        }
    }
}
