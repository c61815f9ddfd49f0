//! Delivery address commands.

use bazaar_client::{AppError, Bazaar};
use bazaar_core::{Address, AddressId};
use clap::Args;
use tracing::info;

/// Fields of a new address.
#[derive(Debug, Args)]
pub struct AddressArgs {
    /// Short label such as "Home" or "Work"
    #[arg(long, default_value = "Home")]
    pub label: String,

    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub phone: String,

    #[arg(long)]
    pub area: String,

    #[arg(long)]
    pub block: String,

    #[arg(long)]
    pub street: String,

    #[arg(long)]
    pub building: String,

    #[arg(long)]
    pub floor: Option<String>,

    #[arg(long)]
    pub apartment: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,

    /// Make this the default delivery address
    #[arg(long)]
    pub default: bool,
}

impl From<AddressArgs> for Address {
    fn from(args: AddressArgs) -> Self {
        Self {
            id: AddressId::local(),
            label: args.label,
            full_name: args.name,
            phone: args.phone,
            area: args.area,
            block: args.block,
            street: args.street,
            building: args.building,
            floor: args.floor,
            apartment: args.apartment,
            notes: args.notes,
            is_default: args.default,
        }
    }
}

pub fn list(bazaar: &Bazaar) {
    let addresses = bazaar.store().addresses();
    if addresses.is_empty() {
        info!("No saved addresses");
        return;
    }
    for address in addresses {
        let marker = if address.is_default { " (default)" } else { "" };
        info!("  [{}] {}{marker}", address.id, address.label);
        info!("      {}, {}", address.full_name, address.phone);
        info!("      {}", address.summary());
    }
}

pub fn add(bazaar: &mut Bazaar, args: AddressArgs) {
    let address = Address::from(args);
    let id = address.id.clone();
    let label = address.label.clone();
    bazaar.add_address(address);
    info!("Saved address {label} [{id}]");
}

pub fn set_default(bazaar: &mut Bazaar, id: &str) -> bazaar_client::Result<()> {
    let id = AddressId::new(id);
    if !bazaar.set_default_address(&id) {
        return Err(AppError::NotFound(format!("address {id}")));
    }
    info!("Default address set to {id}");
    Ok(())
}

pub async fn remove(bazaar: &mut Bazaar, id: &str) -> bazaar_client::Result<()> {
    let id = AddressId::new(id);
    let removed = bazaar
        .remove_address(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("address {id}")))?;
    info!("Removed address {}", removed.label);
    Ok(())
}
