//! Role and ownership rules, evaluated in one place instead of inside handlers.

use uuid::Uuid;

use crate::error::ApiError;
use crate::users::repo_types::{Role, User};

/// Who is acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject {
    pub id: Uuid,
    pub role: Role,
}

impl From<&User> for Subject {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ReadUsers,
    ChangeRole,
    UpdateEvent,
    DeleteEvent,
}

/// What is acted upon. Must already be located, so a missing target is a 404 before it gets here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    None,
    User { id: Uuid },
    Event { created_by: Uuid },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(ApiError::Forbidden(reason.to_string())),
        }
    }
}

pub fn require_admin(subject: &Subject) -> Decision {
    if subject.role == Role::Admin {
        Decision::Allow
    } else {
        Decision::Deny("admin role required")
    }
}

pub fn require_owner_or_admin(subject: &Subject, owner: Uuid) -> Decision {
    if subject.id == owner || subject.role == Role::Admin {
        Decision::Allow
    } else {
        Decision::Deny("only the creator or an admin can modify this resource")
    }
}

pub fn authorize(subject: &Subject, action: Action, resource: Resource) -> Decision {
    match (action, resource) {
        (Action::ReadUsers, _) => require_admin(subject),
        (Action::ChangeRole, Resource::User { id }) => {
            let decision = require_admin(subject);
            if decision.is_allowed() && id == subject.id {
                return Decision::Deny("admins cannot change their own role");
            }
            decision
        }
        (Action::UpdateEvent | Action::DeleteEvent, Resource::Event { created_by }) => {
            require_owner_or_admin(subject, created_by)
        }
        _ => Decision::Deny("action does not apply to this resource"),
    }
}
