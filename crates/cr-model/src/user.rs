//! User domain model.
//!
//! Users are the identities that authenticate. They belong to a realm, hold
//! exactly one stored credential, carry their own role mask and may be
//! members of any number of groups in the same realm.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attribute::{Attributable, Attributes};
use crate::credential::Credential;
use crate::error::ModelResult;
use crate::role_mask::{RoleId, RoleMask};

/// What kind of identifier a user id is.
///
/// Useful to know whether an ownership check (mailbox, phone) applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IdType {
    /// A plain user id.
    #[default]
    UserId,
    /// An email address.
    Email,
    /// A phone number.
    PhoneNo,
}

impl IdType {
    /// Returns the string representation used in storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UserId => "USERID",
            Self::Email => "EMAIL",
            Self::PhoneNo => "PHONENO",
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A credenta user, identified by `(realm, id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    // === Identity ===
    /// Realm this user belongs to.
    pub realm: String,
    /// User id, unique within the realm.
    pub id: String,
    /// Kind of identifier `id` is.
    pub id_type: IdType,

    // === Authorization ===
    /// Names of groups this user is a member of.
    #[serde(default)]
    pub groups: Vec<String>,
    /// Roles granted directly to this user.
    pub role_mask: RoleMask,

    // === Security ===
    /// Stored credential.
    pub credential: Credential,
    /// Whether the account may be used at all.
    pub enabled: bool,
    /// Whether the account has been activated.
    pub active: bool,

    // === Custom Attributes ===
    /// Typed attributes.
    #[serde(default)]
    pub attributes: Attributes,

    // === Timestamps ===
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user.
    ///
    /// New users are enabled but not yet active, with no credential and an
    /// empty role mask of `mask_words` words.
    #[must_use]
    pub fn new(
        realm: impl Into<String>,
        id: impl Into<String>,
        id_type: IdType,
        mask_words: usize,
    ) -> Self {
        let now = Utc::now();
        Self {
            realm: realm.into(),
            id: id.into(),
            id_type,
            groups: Vec::new(),
            role_mask: RoleMask::new(mask_words),
            credential: Credential::default(),
            enabled: true,
            active: false,
            attributes: Attributes::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the stored credential.
    #[must_use]
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = credential;
        self
    }

    /// Adds a group membership.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.join_group(group);
        self
    }

    /// Grants a role.
    ///
    /// # Errors
    ///
    /// Returns `RoleOutOfRange` if the role does not fit in the mask.
    pub fn with_role(mut self, role: RoleId) -> ModelResult<Self> {
        self.role_mask.set_role(role)?;
        Ok(self)
    }

    /// Marks the account active.
    #[must_use]
    pub const fn activated(mut self) -> Self {
        self.active = true;
        self
    }

    /// Checks if the user is a member of a group (directly).
    #[must_use]
    pub fn is_member_of(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    /// Adds a group membership; returns false if already a member.
    pub fn join_group(&mut self, group: impl Into<String>) -> bool {
        let group = group.into();
        if self.is_member_of(&group) {
            return false;
        }
        self.groups.push(group);
        true
    }

    /// Removes a group membership; returns whether it existed.
    pub fn leave_group(&mut self, group: &str) -> bool {
        let before = self.groups.len();
        self.groups.retain(|g| g != group);
        self.groups.len() != before
    }

    /// Checks if the user has a role directly (not through groups).
    ///
    /// # Errors
    ///
    /// Returns `RoleOutOfRange` if the role does not fit in the mask.
    pub fn has_role(&self, role: RoleId) -> ModelResult<bool> {
        self.role_mask.has_role(role)
    }

    /// Grants a role in place.
    ///
    /// # Errors
    ///
    /// Returns `RoleOutOfRange` if the role does not fit in the mask.
    pub fn grant_role(&mut self, role: RoleId) -> ModelResult<()> {
        self.role_mask.set_role(role)
    }

    /// Revokes a role in place.
    ///
    /// # Errors
    ///
    /// Returns `RoleOutOfRange` if the role does not fit in the mask.
    pub fn revoke_role(&mut self, role: RoleId) -> ModelResult<()> {
        self.role_mask.clear_role(role)
    }

    /// Replaces the stored credential as one unit.
    pub fn set_credential(&mut self, credential: Credential) {
        self.credential = credential;
        self.touch();
    }

    /// Checks if the account is allowed to log in.
    #[must_use]
    pub const fn can_authenticate(&self) -> bool {
        self.enabled && self.active
    }

    /// Records a modification.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Attributable for User {
    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}
