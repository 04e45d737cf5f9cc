//! Team membership lookup.

use crate::error::AuthzError;
use dashmap::DashMap;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Resolves the teams an actor belongs to.
///
/// Failures must be reported as [`AuthzError::Unavailable`]; the resolver
/// surfaces them unchanged instead of denying.
pub trait MembershipProvider: Send + Sync + 'static {
    fn teams_of(
        &self,
        actor: &str,
    ) -> Pin<Box<dyn Future<Output = Result<HashSet<String>, AuthzError>> + Send + '_>>;
}

impl<T: MembershipProvider> MembershipProvider for Arc<T> {
    fn teams_of(
        &self,
        actor: &str,
    ) -> Pin<Box<dyn Future<Output = Result<HashSet<String>, AuthzError>> + Send + '_>> {
        (**self).teams_of(actor)
    }
}

/// In-memory membership table.
///
/// Clones share the table.
#[derive(Clone, Default)]
pub struct StaticMembership {
    teams: Arc<DashMap<String, HashSet<String>>>,
    unavailable: Arc<AtomicBool>,
}

impl StaticMembership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&self, team: &str, actor: &str) {
        self.teams
            .entry(actor.to_string())
            .or_default()
            .insert(team.to_string());
    }

    pub fn remove_member(&self, team: &str, actor: &str) {
        if let Some(mut teams) = self.teams.get_mut(actor) {
            teams.remove(team);
        }
    }

    /// Make every lookup fail with [`AuthzError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl MembershipProvider for StaticMembership {
    fn teams_of(
        &self,
        actor: &str,
    ) -> Pin<Box<dyn Future<Output = Result<HashSet<String>, AuthzError>> + Send + '_>> {
        let result = if self.unavailable.load(Ordering::SeqCst) {
            Err(AuthzError::Unavailable("membership lookup failed".into()))
        } else {
            Ok(self
                .teams
                .get(actor)
                .map(|teams| teams.clone())
                .unwrap_or_default())
        };
        Box::pin(async move { result })
    }
}
