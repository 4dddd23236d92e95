use async_trait::async_trait;
use lightchat_core::{LightTool, ToolError, Toolset};
use lightchat_storage::{DeviceRepository, DocumentStore, StorageBackend, StorageError};
use serde::Serialize;
use serde_json::Value;

/// Device-control tools bound to a light repository.
pub struct LightsToolset<S = StorageBackend> {
    lights: DeviceRepository<S>,
}

impl<S> LightsToolset<S> {
    #[must_use]
    pub const fn new(lights: DeviceRepository<S>) -> Self {
        Self { lights }
    }
}

fn to_result<T: Serialize>(
    tool: &'static str,
    outcome: Result<T, StorageError>,
) -> Result<Value, ToolError> {
    let value = outcome.map_err(|e| ToolError { tool, source: Box::new(e) })?;
    serde_json::to_value(value).map_err(|e| ToolError { tool, source: Box::new(e) })
}

#[async_trait]
impl<S: DocumentStore + 'static> Toolset for LightsToolset<S> {
    async fn execute(&self, call: LightTool) -> Result<Value, ToolError> {
        let tool = call.name();
        match call {
            LightTool::CreateLight { light_name } => {
                to_result(tool, self.lights.create(&light_name).await)
            },
            LightTool::DeleteLight { light_id } => to_result(tool, self.lights.delete(light_id).await),
            LightTool::GetLights {} => to_result(tool, self.lights.list().await),
            LightTool::GetLight { light_id } => to_result(tool, self.lights.get(light_id).await),
            LightTool::ChangeState { id, is_on } => {
                to_result(tool, self.lights.set_power(id, is_on).await)
            },
            LightTool::ChangeTemperature { id, temperature } => {
                to_result(tool, self.lights.set_temperature(id, Some(temperature)).await)
            },
        }
    }
}
