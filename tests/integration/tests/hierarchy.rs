//! Group hierarchy integration tests.

use cr_auth::HierarchyResolver;

use crate::common::{REALM, TestEnv};

/// A cycle created through the directory does not hang login.
#[tokio::test]
async fn test_cycle_created_later_still_resolves() -> anyhow::Result<()> {
    let env = TestEnv::new()?;

    env.group("a", &["b"], &[1]).await?;
    env.group("b", &["c"], &[2]).await?;
    env.group("c", &[], &[3]).await?;
    env.directory.add_group_parent(REALM, "c", "a").await?;
    env.active_user("alice", "password1", &["b"]).await?;

    let principal = env.auth.authenticate(REALM, "alice", "password1").await?;
    assert_eq!(principal.roles.roles().collect::<Vec<_>>(), vec![1, 2, 3]);

    Ok(())
}

/// Deleting a group drops its roles from every descendant.
#[tokio::test]
async fn test_deleted_parent_contributes_nothing() -> anyhow::Result<()> {
    let env = TestEnv::new()?;

    env.group("root", &[], &[9]).await?;
    env.group("team", &["root"], &[4]).await?;
    env.active_user("alice", "password1", &["team"]).await?;

    let before = env.auth.authenticate(REALM, "alice", "password1").await?;
    assert!(before.roles.has_role(9)?);

    env.directory.delete_group(REALM, "root").await?;

    let after = env.auth.authenticate(REALM, "alice", "password1").await?;
    assert!(!after.roles.has_role(9)?);
    assert!(after.roles.has_role(4)?);

    Ok(())
}

/// Role changes on an ancestor are visible at the next login.
#[tokio::test]
async fn test_ancestor_role_changes_propagate() -> anyhow::Result<()> {
    let env = TestEnv::new()?;

    env.group("org", &[], &[]).await?;
    env.group("dept", &["org"], &[]).await?;
    env.group("squad", &["dept"], &[]).await?;

    let resolver = HierarchyResolver::new(env.groups.clone(), 10);
    assert!(resolver.effective_role_mask(REALM, "squad").await?.is_empty());

    env.directory.grant_group_role(REALM, "org", 639).await?;
    let mask = resolver.effective_role_mask(REALM, "squad").await?;
    assert_eq!(mask.roles().collect::<Vec<_>>(), vec![639]);

    env.directory.revoke_group_role(REALM, "org", 639).await?;
    assert!(resolver.effective_role_mask(REALM, "squad").await?.is_empty());

    Ok(())
}

/// Realms are isolated: same names, separate graphs.
#[tokio::test]
async fn test_realms_do_not_mix() -> anyhow::Result<()> {
    let env = TestEnv::new()?;

    env.group("staff", &[], &[1]).await?;
    env.directory.create_group("lab", "staff", &[]).await?;
    env.directory.grant_group_role("lab", "staff", 2).await?;

    let resolver = HierarchyResolver::new(env.groups.clone(), 10);
    let corp = resolver.effective_role_mask(REALM, "staff").await?;
    let lab = resolver.effective_role_mask("lab", "staff").await?;

    assert_eq!(corp.roles().collect::<Vec<_>>(), vec![1]);
    assert_eq!(lab.roles().collect::<Vec<_>>(), vec![2]);
    assert_eq!(env.directory.group_realms().await?, vec!["corp", "lab"]);

    Ok(())
}
