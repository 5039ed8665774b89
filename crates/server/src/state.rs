use std::sync::Arc;

use finder_humans::HumanStore;
use finder_mcp::McpServer;

/// Shared by every HTTP handler.
pub struct AppState {
    pub mcp: Arc<McpServer>,
    pub store: Arc<HumanStore>,
}
