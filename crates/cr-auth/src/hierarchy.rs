//! Group hierarchy role resolution.
//!
//! A group's effective role mask is its own mask ORed with the effective
//! masks of all of its parents. Because OR is associative and idempotent,
//! that is the union of the own masks of every group reachable through parent
//! links, which is what the traversal below collects.
//!
//! The parent graph is not guaranteed to be acyclic. Each call keeps its own
//! visit state: a group already on the current path is skipped with a
//! warning (its roles are already in the result), and a group reached twice
//! through different paths is merged once. Missing groups contribute nothing.

use std::collections::HashMap;
use std::sync::Arc;

use cr_model::{Group, RoleMask, User};
use cr_storage::GroupRepository;

use crate::error::AuthResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

struct Frame {
    name: String,
    parents: Vec<String>,
    next: usize,
}

/// Computes effective role masks by walking the group graph.
#[derive(Clone)]
pub struct HierarchyResolver {
    groups: Arc<dyn GroupRepository>,
    mask_words: usize,
}

impl HierarchyResolver {
    /// Creates a resolver reading through `groups`; masks have `mask_words`
    /// words.
    #[must_use]
    pub fn new(groups: Arc<dyn GroupRepository>, mask_words: usize) -> Self {
        Self { groups, mask_words }
    }

    /// Word count of the masks this resolver produces.
    #[must_use]
    pub const fn mask_words(&self) -> usize {
        self.mask_words
    }

    /// Returns the effective role mask of one group.
    ///
    /// An absent group yields the all-zero mask.
    ///
    /// # Errors
    ///
    /// Propagates repository failures, and `MaskLengthMismatch` if a stored
    /// group's mask has a different word count.
    pub async fn effective_role_mask(&self, realm: &str, name: &str) -> AuthResult<RoleMask> {
        self.effective_role_mask_of(realm, std::iter::once(name)).await
    }

    /// Returns the union of the effective role masks of several groups.
    ///
    /// # Errors
    ///
    /// Same as [`HierarchyResolver::effective_role_mask`].
    pub async fn effective_role_mask_of<'a, I>(&self, realm: &str, names: I) -> AuthResult<RoleMask>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut result = RoleMask::new(self.mask_words);
        let mut visits: HashMap<String, Visit> = HashMap::new();

        for root in names {
            if visits.contains_key(root) {
                continue;
            }
            let mut stack: Vec<Frame> = Vec::new();
            if let Some(frame) = self.enter(realm, root, &mut visits, &mut result).await? {
                stack.push(frame);
            }

            while let Some(top) = stack.last_mut() {
                if top.next >= top.parents.len() {
                    visits.insert(top.name.clone(), Visit::Done);
                    stack.pop();
                    continue;
                }

                let parent = top.parents[top.next].clone();
                top.next += 1;

                match visits.get(&parent).copied() {
                    Some(Visit::Done) => {}
                    Some(Visit::InProgress) => {
                        tracing::warn!(
                            "Cycle in group hierarchy of realm {}: {} -> {}",
                            realm,
                            top.name,
                            parent
                        );
                    }
                    None => {
                        if let Some(frame) =
                            self.enter(realm, &parent, &mut visits, &mut result).await?
                        {
                            stack.push(frame);
                        }
                    }
                }
            }
        }

        Ok(result)
    }

    /// Returns a user's own mask merged with the effective masks of all of
    /// the user's groups.
    ///
    /// # Errors
    ///
    /// Same as [`HierarchyResolver::effective_role_mask`].
    pub async fn aggregate_user_roles(&self, user: &User) -> AuthResult<RoleMask> {
        let mut mask = self
            .effective_role_mask_of(&user.realm, user.groups.iter().map(String::as_str))
            .await?;
        mask.merge(&user.role_mask)?;
        Ok(mask)
    }

    /// Loads a group, merges its own roles and returns a frame for its
    /// parents. Absent groups are marked done and yield no frame.
    async fn enter(
        &self,
        realm: &str,
        name: &str,
        visits: &mut HashMap<String, Visit>,
        result: &mut RoleMask,
    ) -> AuthResult<Option<Frame>> {
        let Some(Group {
            role_mask,
            parent_groups,
            ..
        }) = self.groups.get(realm, name).await?
        else {
            tracing::debug!("Group {} not found in realm {}, contributes no roles", name, realm);
            visits.insert(name.to_string(), Visit::Done);
            return Ok(None);
        };

        result.merge(&role_mask)?;
        visits.insert(name.to_string(), Visit::InProgress);
        Ok(Some(Frame {
            name: name.to_string(),
            parents: parent_groups,
            next: 0,
        }))
    }
}

impl std::fmt::Debug for HierarchyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchyResolver")
            .field("mask_words", &self.mask_words)
            .finish_non_exhaustive()
    }
}
