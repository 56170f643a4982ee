//! Group domain model.
//!
//! Groups carry a role mask and may name parent groups in the same realm.
//! A group's effective roles are its own mask merged with every ancestor's.
//! Parent links are plain names, so the graph may contain cycles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attribute::{Attributable, Attributes};
use crate::error::ModelResult;
use crate::role_mask::{RoleId, RoleMask};

/// A credenta group, identified by `(realm, name)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    // === Identity ===
    /// Realm this group belongs to.
    pub realm: String,
    /// Group name, unique within the realm.
    pub name: String,

    // === Hierarchy ===
    /// Names of parent groups in declaration order.
    #[serde(default)]
    pub parent_groups: Vec<String>,

    // === Authorization ===
    /// Roles granted directly to this group.
    pub role_mask: RoleMask,

    // === Custom Attributes ===
    /// Typed attributes.
    #[serde(default)]
    pub attributes: Attributes,

    // === Timestamps ===
    /// When the group was created.
    pub created_at: DateTime<Utc>,
    /// When the group was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Group {
    /// Creates a new top-level group with an empty mask of `mask_words` words.
    #[must_use]
    pub fn new(realm: impl Into<String>, name: impl Into<String>, mask_words: usize) -> Self {
        let now = Utc::now();
        Self {
            realm: realm.into(),
            name: name.into(),
            parent_groups: Vec::new(),
            role_mask: RoleMask::new(mask_words),
            attributes: Attributes::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds a parent group.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.add_parent(parent);
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

    /// Checks if this is a top-level group.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.parent_groups.is_empty()
    }

    /// Appends a parent name; returns false if it was already listed.
    pub fn add_parent(&mut self, parent: impl Into<String>) -> bool {
        let parent = parent.into();
        if self.parent_groups.contains(&parent) {
            return false;
        }
        self.parent_groups.push(parent);
        true
    }

    /// Removes a parent name; returns whether it was listed.
    pub fn remove_parent(&mut self, parent: &str) -> bool {
        let before = self.parent_groups.len();
        self.parent_groups.retain(|p| p != parent);
        self.parent_groups.len() != before
    }

    /// Checks if this group has a role directly (not inherited).
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

    /// Records a modification.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Attributable for Group {
    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeValue;
    use crate::error::ModelError;

    #[test]
    fn top_level_group_creation() {
        let group = Group::new("corp", "admins", 10);

        assert_eq!(group.name, "admins");
        assert_eq!(group.realm, "corp");
        assert!(group.is_top_level());
        assert!(group.role_mask.is_empty());
        assert_eq!(group.role_mask.len(), 10);
    }

    #[test]
    fn parents_are_deduplicated() {
        let mut group = Group::new("corp", "developers", 10).with_parent("staff");

        assert!(!group.add_parent("staff"));
        assert!(group.add_parent("engineering"));
        assert_eq!(group.parent_groups, vec!["staff", "engineering"]);
        assert!(group.remove_parent("staff"));
        assert!(!group.remove_parent("staff"));
        assert!(!group.is_top_level());
    }

    #[test]
    fn role_grants() {
        let mut group = Group::new("corp", "team", 2).with_role(3).unwrap();

        assert!(group.has_role(3).unwrap());
        group.revoke_role(3).unwrap();
        assert!(!group.has_role(3).unwrap());
        assert!(matches!(
            group.grant_role(128),
            Err(ModelError::RoleOutOfRange { role: 128, .. })
        ));
    }

    #[test]
    fn group_attributes() {
        let mut group = Group::new("corp", "team", 1);

        group
            .set_attribute("department", AttributeValue::from("Engineering"))
            .unwrap();

        assert_eq!(
            group.attribute("Department").unwrap().as_str(),
            Some("Engineering")
        );
        assert!(matches!(
            group.attribute("missing"),
            Err(ModelError::AttributeNotFound(_))
        ));
        group.remove_all_attributes();
        assert!(group.attribute_names().is_empty());
    }

    #[test]
    fn json_layout() {
        let group = Group::new("corp", "team", 1).with_parent("staff");
        let json = serde_json::to_value(&group).unwrap();

        assert_eq!(json["parentGroups"], serde_json::json!(["staff"]));
        assert_eq!(json["roleMask"], serde_json::json!([0]));
    }
}
