use std::fmt;

use serde::Serialize;

use super::{AuthError, SessionIdentity};
use crate::database::models::Role;

/// Operations gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
    Import,
}

impl Action {
    pub const ALL: [Action; 5] = [Action::View, Action::Create, Action::Update, Action::Delete, Action::Import];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Import => "import",
        }
    }

    pub fn is_mutating(&self) -> bool {
        !matches!(self, Action::View)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Role {
    pub fn permits(&self, action: Action) -> bool {
        match self {
            Role::Admin => true,
            Role::Viewer => !action.is_mutating(),
        }
    }
}

/// Allow or deny `action` for the session's role.
pub fn authorize(identity: &SessionIdentity, action: Action) -> Result<(), AuthError> {
    if identity.role.permits(action) {
        return Ok(());
    }
    tracing::warn!("Denied {} to '{}' ({})", action, identity.username, identity.role);
    Err(AuthError::Forbidden { role: identity.role, action })
}
