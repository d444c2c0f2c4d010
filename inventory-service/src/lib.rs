//! inventory-service: credential vault, inventory group tree and per-task
//! inventory materialization.

pub mod cipher;
pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;

pub use error::{InventoryError, InventoryResult};
pub use startup::{router, AppState, Application};
