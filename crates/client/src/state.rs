use crate::agent::Agent;

/// Shared by every HTTP handler.
pub struct ChatState {
    pub agent: Agent,
}
