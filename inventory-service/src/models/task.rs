use super::Inventory;

/// A run that needs its inventory and key material on disk.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: String,
    pub inventory: Inventory,
}

impl Task {
    pub fn new(id: impl Into<String>, inventory: Inventory) -> Self {
        Self {
            id: id.into(),
            inventory,
        }
    }
}
