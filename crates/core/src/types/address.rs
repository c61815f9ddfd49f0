//! Delivery addresses and the snapshots orders keep of them.

use serde::{Deserialize, Serialize};

use super::id::AddressId;

/// An entry in the user's address book.
///
/// At most one address per user is the default; the store and the server
/// each enforce this independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    /// Short name such as "Home" or "Work".
    pub label: String,
    pub full_name: String,
    pub phone: String,
    pub area: String,
    pub block: String,
    pub street: String,
    pub building: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl Address {
    /// Copy every displayed field into a detached snapshot.
    #[must_use]
    pub fn snapshot(&self) -> AddressSnapshot {
        AddressSnapshot {
            label: self.label.clone(),
            full_name: self.full_name.clone(),
            phone: self.phone.clone(),
            area: self.area.clone(),
            block: self.block.clone(),
            street: self.street.clone(),
            building: self.building.clone(),
            floor: self.floor.clone(),
            apartment: self.apartment.clone(),
            notes: self.notes.clone(),
        }
    }

    /// One-line rendering: `Block 4, Street 12, Building 7, Salmiya`.
    #[must_use]
    pub fn summary(&self) -> String {
        self.snapshot().summary()
    }
}

/// Address fields frozen at order time.
///
/// Deliberately carries no id: later edits or deletions in the address book
/// never reach historical orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSnapshot {
    pub label: String,
    pub full_name: String,
    pub phone: String,
    pub area: String,
    pub block: String,
    pub street: String,
    pub building: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AddressSnapshot {
    /// One-line rendering of the delivery location.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("Block {}", self.block),
            format!("Street {}", self.street),
            format!("Building {}", self.building),
        ];
        if let Some(floor) = &self.floor {
            parts.push(format!("Floor {floor}"));
        }
        if let Some(apartment) = &self.apartment {
            parts.push(format!("Apt {apartment}"));
        }
        parts.push(self.area.clone());
        parts.join(", ")
    }
}
