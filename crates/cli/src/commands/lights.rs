use anyhow::{Result, bail};
use lightchat_storage::DeviceRepository;
use std::sync::Arc;

use crate::{LightsCommand, open_storage};

pub(crate) async fn run(command: LightsCommand) -> Result<()> {
    let lights = DeviceRepository::new(Arc::new(open_storage().await?));

    match command {
        LightsCommand::List => {
            println!("{}", serde_json::to_string_pretty(&lights.list().await?)?);
        },
        LightsCommand::Create { name } => {
            println!("{}", serde_json::to_string_pretty(&lights.create(&name).await?)?);
        },
        LightsCommand::Delete { id } => {
            if !lights.delete(id).await? {
                bail!("Light not found: {id}");
            }
            println!("Deleted light {id}");
        },
        LightsCommand::Power { id, on } => {
            println!("{}", serde_json::to_string_pretty(&lights.set_power(id, on).await?)?);
        },
        LightsCommand::Temperature { id, kelvin } => {
            println!("{}", serde_json::to_string_pretty(&lights.set_temperature(id, kelvin).await?)?);
        },
    }

    Ok(())
}
