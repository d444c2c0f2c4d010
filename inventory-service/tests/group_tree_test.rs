mod common;

use common::{TestApp, TEST_USER_ID};
use inventory_service::dtos::{GroupRequest, PatchGroupRequest};
use inventory_service::services::store;
use inventory_service::services::{Collection, DocumentStore};
use inventory_service::InventoryError;

fn reasons(err: InventoryError) -> Vec<String> {
    match err {
        InventoryError::Validation(reasons) => reasons,
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn cascade_removes_subtree_and_its_hosts_only() {
    let app = TestApp::spawn();
    let inv = app.inventory("prod").await;
    let g = app.group("G", &inv.id, None).await;
    let g1 = app.group("G1", &inv.id, Some(&g.id)).await;
    let g2 = app.group("G2", &inv.id, Some(&g1.id)).await;
    let g3 = app.group("G3", &inv.id, None).await;
    app.host("H1", &inv.id, Some(&g1.id)).await;
    app.host("H2", &inv.id, Some(&g2.id)).await;
    let h3 = app.host("H3", &inv.id, Some(&g3.id)).await;

    let summary = app
        .state
        .groups
        .cascade_delete(&g.id, TEST_USER_ID)
        .await
        .unwrap();

    let mut removed = summary.removed_group_ids.clone();
    removed.sort();
    let mut expected = vec![g.id.clone(), g1.id.clone(), g2.id.clone()];
    expected.sort();
    assert_eq!(removed, expected);
    assert_eq!(summary.removed_host_count, 2);

    for id in [&g.id, &g1.id, &g2.id] {
        assert!(matches!(
            app.state.groups.get(id).await.unwrap_err(),
            InventoryError::NotFound(_)
        ));
    }
    assert!(app.state.groups.get(&g3.id).await.is_ok());
    let remaining = app.state.hosts.list(Some(&inv.id), None).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, h3.id);
}

#[tokio::test]
async fn cascade_keeps_groups_when_host_removal_fails() {
    let app = TestApp::spawn();
    let inv = app.inventory("prod").await;
    let g = app.group("G", &inv.id, None).await;
    let g1 = app.group("G1", &inv.id, Some(&g.id)).await;
    app.host("H1", &inv.id, Some(&g1.id)).await;

    app.store.fail_writes(Collection::Hosts);
    let err = app
        .state
        .groups
        .cascade_delete(&g.id, TEST_USER_ID)
        .await
        .unwrap_err();
    app.store.heal();

    assert!(matches!(err, InventoryError::Persistence(_)));
    assert_eq!(app.store.count(Collection::Groups), 2);
    assert_eq!(app.store.count(Collection::Hosts), 1);
}

#[tokio::test]
async fn cascade_of_missing_group_is_not_found() {
    let app = TestApp::spawn();
    let err = app
        .state
        .groups
        .cascade_delete("missing", TEST_USER_ID)
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::NotFound(_)));
}

#[tokio::test]
async fn names_are_unique_per_inventory() {
    let app = TestApp::spawn();
    let a = app.inventory("a").await;
    let b = app.inventory("b").await;
    app.group("web", &a.id, None).await;

    let err = app
        .state
        .groups
        .create(GroupRequest::new("web", &a.id), TEST_USER_ID)
        .await
        .unwrap_err();
    assert_eq!(
        reasons(err),
        vec!["Group with this Name and Inventory already exists.".to_string()]
    );

    assert!(app
        .state
        .groups
        .create(GroupRequest::new("web", &b.id), TEST_USER_ID)
        .await
        .is_ok());
}

#[tokio::test]
async fn every_failed_rule_is_reported() {
    let app = TestApp::spawn();
    let mut request = GroupRequest::new("", "no-such-inventory").with_parent("no-such-group");
    request.variables = "[1, 2]".to_string();

    let reasons = reasons(
        app.state
            .groups
            .create(request, TEST_USER_ID)
            .await
            .unwrap_err(),
    );

    assert!(reasons.contains(&"Name is required.".to_string()));
    assert!(reasons.contains(&"Inventory does not exist.".to_string()));
    assert!(reasons.contains(&"Parent Group does not exist.".to_string()));
    assert!(reasons.contains(&"Variables must be a JSON object.".to_string()));
}

#[tokio::test]
async fn parent_must_share_the_inventory() {
    let app = TestApp::spawn();
    let a = app.inventory("a").await;
    let b = app.inventory("b").await;
    let parent = app.group("parent", &a.id, None).await;

    let err = app
        .state
        .groups
        .create(
            GroupRequest::new("child", &b.id).with_parent(&parent.id),
            TEST_USER_ID,
        )
        .await
        .unwrap_err();

    assert_eq!(
        reasons(err),
        vec!["Parent Group belongs to a different inventory.".to_string()]
    );
}

#[tokio::test]
async fn ancestors_walk_to_the_root() {
    let app = TestApp::spawn();
    let inv = app.inventory("prod").await;
    let root = app.group("root", &inv.id, None).await;
    let mid = app.group("mid", &inv.id, Some(&root.id)).await;
    let leaf = app.group("leaf", &inv.id, Some(&mid.id)).await;

    let chain = app.state.groups.ancestors(&leaf.id).await.unwrap();
    let names: Vec<_> = chain.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["mid", "root"]);

    assert!(app.state.groups.ancestors(&root.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn ancestors_detect_cycles() {
    let app = TestApp::spawn();
    let inv = app.inventory("prod").await;
    let a = app.group("A", &inv.id, None).await;
    let b = app.group("B", &inv.id, Some(&a.id)).await;

    // Corrupt A directly in the store so that A -> B -> A.
    let mut corrupted = a.clone();
    corrupted.parent_group_id = Some(b.id.clone());
    app.store
        .update_by_id(
            Collection::Groups,
            &a.id,
            store::encode(&corrupted).unwrap(),
        )
        .await
        .unwrap();

    let err = app.state.groups.ancestors(&a.id).await.unwrap_err();
    assert!(matches!(err, InventoryError::CycleDetected { .. }));

    // Cascade still terminates on the corrupted tree.
    let summary = app
        .state
        .groups
        .cascade_delete(&a.id, TEST_USER_ID)
        .await
        .unwrap();
    assert_eq!(summary.removed_group_ids.len(), 2);
}

#[tokio::test]
async fn reparenting_under_a_descendant_is_refused() {
    let app = TestApp::spawn();
    let inv = app.inventory("prod").await;
    let a = app.group("A", &inv.id, None).await;
    let b = app.group("B", &inv.id, Some(&a.id)).await;

    let patch = PatchGroupRequest {
        parent_group_id: Some(Some(b.id.clone())),
        ..Default::default()
    };
    let err = app
        .state
        .groups
        .patch(&a.id, patch, TEST_USER_ID)
        .await
        .unwrap_err();
    assert_eq!(
        reasons(err),
        vec!["Parent Group cannot be a descendant of the group.".to_string()]
    );

    let own = PatchGroupRequest {
        parent_group_id: Some(Some(a.id.clone())),
        ..Default::default()
    };
    let err = app
        .state
        .groups
        .patch(&a.id, own, TEST_USER_ID)
        .await
        .unwrap_err();
    assert_eq!(
        reasons(err),
        vec!["A group cannot be its own parent.".to_string()]
    );
}

#[tokio::test]
async fn patch_merges_and_null_clears_parent() {
    let app = TestApp::spawn();
    let inv = app.inventory("prod").await;
    let root = app.group("root", &inv.id, None).await;
    let child = app.group("child", &inv.id, Some(&root.id)).await;

    let renamed = app
        .state
        .groups
        .patch(
            &child.id,
            PatchGroupRequest {
                name: Some("renamed".to_string()),
                ..Default::default()
            },
            TEST_USER_ID,
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "renamed");
    assert_eq!(renamed.parent_group_id.as_deref(), Some(root.id.as_str()));

    let detached = app
        .state
        .groups
        .patch(
            &child.id,
            serde_json::from_value(serde_json::json!({ "parent_group_id": null })).unwrap(),
            TEST_USER_ID,
        )
        .await
        .unwrap();
    assert!(detached.parent_group_id.is_none());
    assert_eq!(detached.name, "renamed");
}

#[tokio::test]
async fn update_replaces_and_keeps_identity() {
    let app = TestApp::spawn();
    let inv = app.inventory("prod").await;
    let root = app.group("root", &inv.id, None).await;
    let child = app.group("child", &inv.id, Some(&root.id)).await;

    let mut request = GroupRequest::new("child", &inv.id);
    request.variables = r#"{"tier": "web"}"#.to_string();
    let updated = app
        .state
        .groups
        .update(&child.id, request, TEST_USER_ID)
        .await
        .unwrap();

    assert_eq!(updated.id, child.id);
    assert_eq!(updated.created, child.created);
    assert!(updated.parent_group_id.is_none());
    assert_eq!(
        app.state.groups.variables(&child.id).await.unwrap()["tier"],
        "web"
    );
}

#[tokio::test]
async fn groups_with_children_cannot_change_inventory() {
    let app = TestApp::spawn();
    let a = app.inventory("a").await;
    let b = app.inventory("b").await;
    let root = app.group("root", &a.id, None).await;
    app.group("child", &a.id, Some(&root.id)).await;

    let err = app
        .state
        .groups
        .patch(
            &root.id,
            PatchGroupRequest {
                inventory_id: Some(b.id.clone()),
                ..Default::default()
            },
            TEST_USER_ID,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::Validation(_)));
}

#[tokio::test]
async fn children_lists_direct_descendants() {
    let app = TestApp::spawn();
    let inv = app.inventory("prod").await;
    let root = app.group("root", &inv.id, None).await;
    let web = app.group("web", &inv.id, Some(&root.id)).await;
    app.group("db", &inv.id, Some(&root.id)).await;
    app.group("web-eu", &inv.id, Some(&web.id)).await;

    let mut names: Vec<_> = app
        .state
        .groups
        .children(&root.id)
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["db".to_string(), "web".to_string()]);
}

#[tokio::test]
async fn unique_index_rejection_is_a_validation_error() {
    let app = TestApp::spawn();
    let inv = app.inventory("prod").await;
    let web = app.group("web", &inv.id, None).await;

    app.store.reject_as_duplicate(Collection::Groups);
    let create = app
        .state
        .groups
        .create(GroupRequest::new("db", &inv.id), TEST_USER_ID)
        .await
        .unwrap_err();
    let rename = app
        .state
        .groups
        .patch(
            &web.id,
            PatchGroupRequest {
                name: Some("www".to_string()),
                ..Default::default()
            },
            TEST_USER_ID,
        )
        .await
        .unwrap_err();
    app.store.heal();

    for err in [create, rename] {
        match err {
            InventoryError::Validation(reasons) => assert_eq!(
                reasons,
                vec!["Group with this Name and Inventory already exists.".to_string()]
            ),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
    assert_eq!(app.store.count(Collection::Groups), 1);
}
