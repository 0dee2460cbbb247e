//! Trip access predicates.
//!
//! Every check is a pure function of three facts about the caller: whether they
//! own the trip, which role their collaborator row carries, and whether that
//! invitation was accepted. A pending or declined collaborator has no access.

use crate::models::{Collaborator, CollaboratorStatus, Role, Trip};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripAccess {
    pub is_owner: bool,
    pub role: Option<Role>,
    pub status: Option<CollaboratorStatus>,
}

impl TripAccess {
    pub fn new(is_owner: bool, role: Option<Role>, status: Option<CollaboratorStatus>) -> Self {
        Self {
            is_owner,
            role,
            status,
        }
    }

    /// No relationship with the trip at all
    pub fn none() -> Self {
        Self::new(false, None, None)
    }

    pub fn owner() -> Self {
        Self::new(true, Some(Role::Owner), Some(CollaboratorStatus::Accepted))
    }

    /// Resolve access for `user_id` from the trip and their collaborator row, if any
    pub fn resolve(trip: &Trip, user_id: Uuid, collaborator: Option<&Collaborator>) -> Self {
        let is_owner = trip.owner_id == user_id;
        match collaborator {
            Some(c) => Self::new(is_owner, Some(c.role_enum()), Some(c.status_enum())),
            None => Self::new(is_owner, None, None),
        }
    }

    /// Role that only counts once the invitation was accepted
    fn active_role(&self) -> Option<Role> {
        match self.status {
            Some(CollaboratorStatus::Accepted) => self.role,
            _ => None,
        }
    }

    pub fn can_view(&self) -> bool {
        self.is_owner || self.active_role().is_some()
    }

    pub fn can_edit(&self) -> bool {
        self.is_owner
            || matches!(
                self.active_role(),
                Some(Role::Owner | Role::Admin | Role::Editor)
            )
    }

    pub fn can_delete(&self) -> bool {
        self.is_owner || matches!(self.active_role(), Some(Role::Owner))
    }

    pub fn can_admin(&self) -> bool {
        self.is_owner || matches!(self.active_role(), Some(Role::Owner | Role::Admin))
    }

    pub fn can_manage_collaborators(&self) -> bool {
        self.can_admin()
    }

    /// Snapshot returned to clients alongside a trip
    pub fn summary(&self) -> PermissionSummary {
        PermissionSummary {
            is_owner: self.is_owner,
            role: if self.is_owner {
                Some(Role::Owner)
            } else {
                self.active_role()
            },
            can_view: self.can_view(),
            can_edit: self.can_edit(),
            can_delete: self.can_delete(),
            can_admin: self.can_admin(),
            can_manage_collaborators: self.can_manage_collaborators(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSummary {
    pub is_owner: bool,
    pub role: Option<Role>,
    pub can_view: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_admin: bool,
    pub can_manage_collaborators: bool,
}

/// Named predicate, so callers can say which check failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    View,
    Edit,
    Delete,
    Admin,
    ManageCollaborators,
}

impl Permission {
    pub fn allows(&self, access: &TripAccess) -> bool {
        match self {
            Permission::View => access.can_view(),
            Permission::Edit => access.can_edit(),
            Permission::Delete => access.can_delete(),
            Permission::Admin => access.can_admin(),
            Permission::ManageCollaborators => access.can_manage_collaborators(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted(role: Role) -> TripAccess {
        TripAccess::new(false, Some(role), Some(CollaboratorStatus::Accepted))
    }

    #[test]
    fn owner_can_do_everything() {
        let access = TripAccess::new(true, None, None);
        assert!(access.can_view());
        assert!(access.can_edit());
        assert!(access.can_delete());
        assert!(access.can_admin());
        assert!(access.can_manage_collaborators());
    }

    #[test]
    fn accepted_roles_follow_the_hierarchy() {
        let admin = accepted(Role::Admin);
        assert!(admin.can_edit() && admin.can_admin() && !admin.can_delete());

        let editor = accepted(Role::Editor);
        assert!(editor.can_view() && editor.can_edit());
        assert!(!editor.can_admin() && !editor.can_manage_collaborators());

        let viewer = accepted(Role::Viewer);
        assert!(viewer.can_view());
        assert!(!viewer.can_edit() && !viewer.can_delete());

        let co_owner = accepted(Role::Owner);
        assert!(co_owner.can_delete());
    }

    #[test]
    fn pending_and_declined_grant_nothing() {
        for status in [CollaboratorStatus::Pending, CollaboratorStatus::Declined] {
            let access = TripAccess::new(false, Some(Role::Admin), Some(status));
            assert!(!access.can_view());
            assert!(!access.can_edit());
            assert!(!access.can_admin());
        }
        assert!(!TripAccess::none().can_view());
    }

    #[test]
    fn summary_reports_effective_role() {
        let summary = TripAccess::new(false, Some(Role::Editor), Some(CollaboratorStatus::Pending))
            .summary();
        assert_eq!(summary.role, None);
        assert!(!summary.can_view);

        let summary = TripAccess::owner().summary();
        assert_eq!(summary.role, Some(Role::Owner));
    }

    #[test]
    fn permission_enum_dispatches() {
        let viewer = accepted(Role::Viewer);
        assert!(Permission::View.allows(&viewer));
        assert!(!Permission::Edit.allows(&viewer));
        assert!(!Permission::ManageCollaborators.allows(&viewer));
    }
}
