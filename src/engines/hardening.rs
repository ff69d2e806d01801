//! Startup-only tightening of the provider table

use super::registry::ProviderRegistration;
use crate::config::{timeout_duration, OutgoingSettings};
use std::collections::HashSet;
use std::time::Duration;
use tracing::info;

/// Providers kept even when the probe could not vouch for them
pub const TRUSTED_ENGINES: &[&str] = &["google", "bing", "startpage", "brave", "mojeek"];

/// Timeouts forwarded to the engine set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineTimeouts {
    /// Per-provider timeout
    pub request: Duration,
    /// Upper bound for any per-provider timeout
    pub max_request: Duration,
}

impl EngineTimeouts {
    pub fn from_settings(outgoing: &OutgoingSettings) -> Self {
        let max_request = timeout_duration(outgoing.max_request_timeout);
        let request = timeout_duration(outgoing.request_timeout).min(max_request);
        Self {
            request,
            max_request,
        }
    }
}

/// Disable every provider that is blocked or unvouched for.
///
/// A provider stays enabled only if it is not in `disabled` and is either
/// trusted or `known_good`. Never enables anything.
pub fn harden(
    registrations: &mut [ProviderRegistration],
    disabled: &HashSet<String>,
    known_good: &HashSet<String>,
    outgoing: &OutgoingSettings,
) -> EngineTimeouts {
    for registration in registrations.iter_mut().filter(|r| r.enabled) {
        let name = registration.name.to_lowercase();
        if disabled.contains(&name) {
            info!("Engine {} disabled by configuration", registration.name);
            registration.enabled = false;
        } else if !TRUSTED_ENGINES.contains(&name.as_str()) && !known_good.contains(&name) {
            info!("Engine {} disabled: failed availability probe", registration.name);
            registration.enabled = false;
        }
    }

    EngineTimeouts::from_settings(outgoing)
}
