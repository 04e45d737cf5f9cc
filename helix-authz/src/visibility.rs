//! Visibility of shareable entities (dashboards, filters, boards).
//!
//! An actor sees a shareable entity if they own it, if it is public, or if
//! a live share names them, one of their teams, or a project on which they
//! hold `READ`. Only the project case consults the authorization resolver;
//! a user or team share is itself the grant.

use crate::error::AuthzError;
use crate::model::new_id;
use crate::resolver::AuthorizationResolver;
use chrono::{DateTime, Utc};
use helix_core::{ContextScope, PermissionLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Exactly one recipient of a share.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ShareTarget {
    User(String),
    Team(String),
    /// Context instance id of a project.
    Project(String),
}

impl ShareTarget {
    /// Build a target from the three optional columns of a share row.
    ///
    /// Exactly one of them must be set.
    pub fn from_columns(
        user_id: Option<&str>,
        team_id: Option<&str>,
        project_id: Option<&str>,
    ) -> Result<Self, AuthzError> {
        match (user_id, team_id, project_id) {
            (Some(id), None, None) => Ok(ShareTarget::User(id.to_string())),
            (None, Some(id), None) => Ok(ShareTarget::Team(id.to_string())),
            (None, None, Some(id)) => Ok(ShareTarget::Project(id.to_string())),
            _ => Err(AuthzError::InvalidInput(
                "a share names exactly one of user, team or project".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub id: String,
    pub target: ShareTarget,
    pub created: DateTime<Utc>,
    pub revoked: bool,
}

/// Anything carrying an owner, a public flag and a share list.
pub trait Shareable {
    fn owner_id(&self) -> &str;

    fn is_public(&self) -> bool;

    /// All shares, revoked ones included.
    fn shares(&self) -> &[Share];
}

/// Owner, public flag and share entries of one shareable entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareList {
    pub owner_id: String,
    pub is_public: bool,
    pub shares: Vec<Share>,
}

impl ShareList {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            is_public: false,
            shares: Vec::new(),
        }
    }

    /// Add a share, returning its id. An existing live share to the same
    /// target is reused.
    pub fn share_with(&mut self, target: ShareTarget) -> String {
        if let Some(existing) = self.shares.iter().find(|s| !s.revoked && s.target == target) {
            return existing.id.clone();
        }
        let share = Share {
            id: new_id(),
            target,
            created: Utc::now(),
            revoked: false,
        };
        let id = share.id.clone();
        self.shares.push(share);
        id
    }

    /// Revoke one share. Returns `false` if no live share has this id.
    pub fn revoke(&mut self, share_id: &str) -> bool {
        match self.shares.iter_mut().find(|s| s.id == share_id && !s.revoked) {
            Some(share) => {
                share.revoked = true;
                true
            }
            None => false,
        }
    }

    pub fn make_public(&mut self) {
        self.is_public = true;
    }

    pub fn make_private(&mut self) {
        self.is_public = false;
    }

    pub fn active_shares(&self) -> impl Iterator<Item = &Share> {
        self.shares.iter().filter(|s| !s.revoked)
    }
}

impl Shareable for ShareList {
    fn owner_id(&self) -> &str {
        &self.owner_id
    }

    fn is_public(&self) -> bool {
        self.is_public
    }

    fn shares(&self) -> &[Share] {
        &self.shares
    }
}

/// Decides whether an actor may see a shareable entity.
#[derive(Clone)]
pub struct VisibilityResolver {
    authz: AuthorizationResolver,
}

impl VisibilityResolver {
    /// Uses the resolver's membership provider for team shares.
    pub fn new(authz: AuthorizationResolver) -> Self {
        Self { authz }
    }

    pub async fn can_view<S: Shareable + ?Sized>(
        &self,
        actor: &str,
        item: &S,
    ) -> Result<bool, AuthzError> {
        let mut teams = None;
        self.visible(actor, item, &mut teams).await
    }

    /// Only the owner may change sharing.
    pub fn can_manage<S: Shareable + ?Sized>(&self, actor: &str, item: &S) -> bool {
        item.owner_id() == actor
    }

    /// Keep the items `actor` can see, in order.
    ///
    /// Team memberships are fetched at most once for the whole list.
    pub async fn filter_visible<S: Shareable>(
        &self,
        actor: &str,
        items: Vec<S>,
    ) -> Result<Vec<S>, AuthzError> {
        let mut teams = None;
        let mut visible = Vec::with_capacity(items.len());
        for item in items {
            if self.visible(actor, &item, &mut teams).await? {
                visible.push(item);
            }
        }
        Ok(visible)
    }

    async fn visible<S: Shareable + ?Sized>(
        &self,
        actor: &str,
        item: &S,
        teams: &mut Option<HashSet<String>>,
    ) -> Result<bool, AuthzError> {
        if item.owner_id() == actor || item.is_public() {
            return Ok(true);
        }

        let live: Vec<&Share> = item.shares().iter().filter(|s| !s.revoked).collect();
        if live
            .iter()
            .any(|s| matches!(&s.target, ShareTarget::User(id) if id == actor))
        {
            return Ok(true);
        }

        if live.iter().any(|s| matches!(s.target, ShareTarget::Team(_))) {
            if teams.is_none() {
                let fetched = self
                    .authz
                    .membership()
                    .teams_of(actor)
                    .await
                    .map_err(AuthzError::unavailable)?;
                *teams = Some(fetched);
            }
            let member_of = teams.as_ref();
            if live.iter().any(|s| match &s.target {
                ShareTarget::Team(id) => member_of.is_some_and(|t| t.contains(id)),
                _ => false,
            }) {
                return Ok(true);
            }
        }

        for share in &live {
            if let ShareTarget::Project(project_id) = &share.target {
                if self
                    .authz
                    .check_in_scope(actor, ContextScope::Project, project_id, PermissionLevel::Read)
                    .await?
                {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}
