#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use inventory_service::cipher::SecretCipher;
use inventory_service::dtos::{CreateInventoryRequest, GroupRequest, HostRequest};
use inventory_service::models::{Group, Host, Inventory, Principal};
use inventory_service::services::{MemoryStore, StaticTeamResolver};
use inventory_service::startup::{router, AppState};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_USER_ID: &str = "test_user_123";
pub const OTHER_USER_ID: &str = "other_user_456";
pub const TEAM_MEMBER_ID: &str = "team_member_789";
pub const TEST_TEAM_ID: &str = "ops";

pub struct TestApp {
    pub state: AppState,
    pub store: MemoryStore,
    pub scratch: TempDir,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::spawn_with_cipher(SecretCipher::new(*SecretCipher::generate_key()))
    }

    pub fn spawn_with_cipher(cipher: SecretCipher) -> Self {
        let store = MemoryStore::new();
        let scratch = tempfile::tempdir().expect("Failed to create scratch dir");
        let teams = StaticTeamResolver::new().with_member(TEST_TEAM_ID, TEAM_MEMBER_ID);

        let state = AppState::new(
            Arc::new(store.clone()),
            cipher,
            Arc::new(teams),
            scratch.path().join("tasks"),
        );

        TestApp {
            state,
            store,
            scratch,
        }
    }

    pub fn owner(&self) -> Principal {
        Principal::user(TEST_USER_ID)
    }

    pub async fn inventory(&self, name: &str) -> Inventory {
        self.state
            .inventories
            .create(CreateInventoryRequest::new(name), TEST_USER_ID)
            .await
            .expect("Failed to create inventory")
    }

    pub async fn group(&self, name: &str, inventory_id: &str, parent: Option<&str>) -> Group {
        let mut request = GroupRequest::new(name, inventory_id);
        request.parent_group_id = parent.map(str::to_string);
        self.state
            .groups
            .create(request, TEST_USER_ID)
            .await
            .expect("Failed to create group")
    }

    pub async fn host(&self, name: &str, inventory_id: &str, group_id: Option<&str>) -> Host {
        let mut request = HostRequest::new(name, inventory_id);
        request.group_id = group_id.map(str::to_string);
        self.state
            .hosts
            .create(request, TEST_USER_ID)
            .await
            .expect("Failed to create host")
    }

    /// Send a request through the router and decode the JSON response body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        user_id: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user_id) = user_id {
            builder = builder.header("X-User-ID", user_id);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = router(self.state.clone())
            .oneshot(request)
            .await
            .expect("Router failed");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}
