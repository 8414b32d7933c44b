//! Subscription negotiation and reconnect backoff.
//!
//! The server keeps no durable subscription state, so every (re)connect has
//! to re-derive and re-send the full subscription set. Derivation is pure:
//! it depends only on who this client is, never on what the server remembers.

use std::time::Duration;

use serde_json::{Value, json};

use kakehashi_server::domain::Role;

/// Who this client is, as far as subscriptions are concerned.
///
/// `user_id` and `role` come from the handshake ack (the server's verified
/// view); the cohort is local configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientProfile {
    pub user_id: u64,
    pub role: Role,
    pub cohort: Option<u64>,
}

/// Derive the subscription control messages to send after a handshake.
///
/// The private-channel subscribe is role-qualified on the wire; the server
/// checks it against the connection's verified identity.
pub fn subscriptions(profile: &ClientProfile) -> Vec<Value> {
    let mut messages = vec![match profile.role {
        Role::Mentor => json!({"type": "subscribe:mentor", "mentor_id": profile.user_id}),
        Role::Student => json!({"type": "subscribe:student", "student_id": profile.user_id}),
    }];
    if let Some(cohort) = profile.cohort {
        messages.push(json!({"type": "subscribe:cohort", "cohort_id": cohort}));
    }
    messages
}

/// Capped exponential backoff schedule for reconnection.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub factor: u32,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            factor: 2,
            max_delay: Duration::from_secs(30),
            max_attempts: 10,
        }
    }
}

impl BackoffPolicy {
    /// Delay before the given (0-based) reconnection attempt, or `None` once
    /// the schedule is exhausted.
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let delay = self
            .factor
            .checked_pow(attempt)
            .and_then(|multiplier| self.base.checked_mul(multiplier))
            .unwrap_or(self.max_delay);
        Some(delay.min(self.max_delay))
    }
}
