pub mod credentials;
pub mod groups;
pub mod health;
pub mod hosts;
pub mod inventories;
