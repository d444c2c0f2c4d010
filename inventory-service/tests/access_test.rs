mod common;

use common::{TestApp, OTHER_USER_ID, TEAM_MEMBER_ID, TEST_TEAM_ID, TEST_USER_ID};
use inventory_service::dtos::CreateCredentialRequest;
use inventory_service::models::{CredentialKind, Principal, RoleGrant, RoleLevel};
use inventory_service::InventoryError;

#[tokio::test]
async fn ungranted_user_cannot_read_or_write() {
    let app = TestApp::spawn();
    let credential = app
        .state
        .vault
        .create(
            CreateCredentialRequest::new("c", CredentialKind::Ssh),
            TEST_USER_ID,
        )
        .await
        .unwrap();
    let stranger = Principal::user(OTHER_USER_ID);

    assert!(!app.state.access.can_read(&stranger, &credential).await.unwrap());
    assert!(!app.state.access.can_write(&stranger, &credential).await.unwrap());
}

#[tokio::test]
async fn user_admin_grant_allows_read_and_write() {
    let app = TestApp::spawn();
    let vault = &app.state.vault;
    let credential = vault
        .create(
            CreateCredentialRequest::new("c", CredentialKind::Ssh),
            TEST_USER_ID,
        )
        .await
        .unwrap();
    let credential = vault
        .grant(
            &credential.id,
            RoleGrant::user(OTHER_USER_ID, RoleLevel::Admin),
            TEST_USER_ID,
        )
        .await
        .unwrap();
    let other = Principal::user(OTHER_USER_ID);

    assert!(app.state.access.can_read(&other, &credential).await.unwrap());
    assert!(app.state.access.can_write(&other, &credential).await.unwrap());
}

#[tokio::test]
async fn team_admin_grant_allows_members() {
    let app = TestApp::spawn();
    let vault = &app.state.vault;
    let credential = vault
        .create(
            CreateCredentialRequest::new("c", CredentialKind::Ssh),
            TEST_USER_ID,
        )
        .await
        .unwrap();
    let credential = vault
        .grant(
            &credential.id,
            RoleGrant::team(TEST_TEAM_ID, RoleLevel::Admin),
            TEST_USER_ID,
        )
        .await
        .unwrap();

    let member = Principal::user(TEAM_MEMBER_ID);
    assert!(app.state.access.can_read(&member, &credential).await.unwrap());
    assert!(app.state.access.can_write(&member, &credential).await.unwrap());

    let outsider = Principal::user(OTHER_USER_ID);
    assert!(!app.state.access.can_read(&outsider, &credential).await.unwrap());
}

#[tokio::test]
async fn read_grant_does_not_allow_write() {
    let app = TestApp::spawn();
    let vault = &app.state.vault;
    let credential = vault
        .create(
            CreateCredentialRequest::new("c", CredentialKind::Ssh),
            TEST_USER_ID,
        )
        .await
        .unwrap();
    vault
        .grant(
            &credential.id,
            RoleGrant::user(OTHER_USER_ID, RoleLevel::Read),
            TEST_USER_ID,
        )
        .await
        .unwrap();
    let other = Principal::user(OTHER_USER_ID);

    assert!(vault
        .authorize(&app.state.access, &other, &credential.id, RoleLevel::Read)
        .await
        .is_ok());
    let err = vault
        .authorize(&app.state.access, &other, &credential.id, RoleLevel::Admin)
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::Unauthorized));
}

#[tokio::test]
async fn missing_credential_is_not_found_not_unauthorized() {
    let app = TestApp::spawn();
    let err = app
        .state
        .vault
        .authorize(
            &app.state.access,
            &Principal::user(OTHER_USER_ID),
            "does-not-exist",
            RoleLevel::Read,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, InventoryError::NotFound(_)));
}

#[tokio::test]
async fn listing_only_shows_readable_credentials() {
    let app = TestApp::spawn();
    let vault = &app.state.vault;
    vault
        .create(
            CreateCredentialRequest::new("mine", CredentialKind::Ssh),
            TEST_USER_ID,
        )
        .await
        .unwrap();
    vault
        .create(
            CreateCredentialRequest::new("theirs", CredentialKind::Aws),
            OTHER_USER_ID,
        )
        .await
        .unwrap();

    let mine = vault
        .list(&app.state.access, &Principal::user(TEST_USER_ID), None)
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].name, "mine");

    let all = vault
        .list(&app.state.access, &Principal::superuser("root"), None)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let aws = vault
        .list(
            &app.state.access,
            &Principal::superuser("root"),
            Some(CredentialKind::Aws),
        )
        .await
        .unwrap();
    assert_eq!(aws.len(), 1);
    assert_eq!(aws[0].name, "theirs");
}
