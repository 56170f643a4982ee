//! Authenticated principal.

use serde::{Deserialize, Serialize};

use crate::error::ModelResult;
use crate::role_mask::{RoleId, RoleMask};

/// An authenticated identity with its resolved effective role mask.
///
/// The mask is the user's own roles merged with the effective roles of every
/// group the user belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Realm the user authenticated in.
    pub realm: String,
    /// User id.
    pub id: String,
    /// Effective roles.
    pub roles: RoleMask,
}

impl Principal {
    /// Creates a principal.
    #[must_use]
    pub fn new(realm: impl Into<String>, id: impl Into<String>, roles: RoleMask) -> Self {
        Self {
            realm: realm.into(),
            id: id.into(),
            roles,
        }
    }

    /// Checks whether the principal holds a role (directly or inherited).
    ///
    /// # Errors
    ///
    /// Returns `RoleOutOfRange` if the role does not fit in the mask.
    pub fn has_role(&self, role: RoleId) -> ModelResult<bool> {
        self.roles.has_role(role)
    }
}
