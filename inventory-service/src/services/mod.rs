pub mod access;
pub mod activity;
pub mod groups;
pub mod hosts;
pub mod inventories;
pub mod materializer;
pub mod store;
pub mod vault;

pub use access::{AccessEvaluator, Guarded, StaticTeamResolver, StoreTeamResolver, TeamResolver};
pub use activity::{ActivityLog, StoreActivityLog};
pub use groups::GroupTree;
pub use hosts::HostRegistry;
pub use inventories::{InventoryCatalog, InventoryRemoval};
pub use materializer::{DynamicInventoryResolver, InventoryMaterializer, TaskArtifacts};
pub use store::{Collection, DocumentStore, Filter, MemoryStore, MongoStore, StoreError};
pub use vault::CredentialVault;
