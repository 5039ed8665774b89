use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use finder_tool_runtime::{Tool, ToolDefinition, ToolError};

use crate::store::HumanStore;

/// `get_humans`: every row of the humans table as a JSON array.
pub struct GetHumansTool {
    store: Arc<HumanStore>,
}

impl GetHumansTool {
    pub const NAME: &'static str = "get_humans";

    pub fn new(store: Arc<HumanStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for GetHumansTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Returns all humans from the database".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    async fn execute(&self, _input: Value) -> Result<String, ToolError> {
        let humans = self
            .store
            .get_humans()
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        serde_json::to_string(&humans).map_err(|e| ToolError::ExecutionFailed(e.to_string()))
    }
}
