//! Model-API side of the agent runner: the Gemini streaming provider and the
//! tool-schema translator it uses.

pub mod providers;
pub mod schema;

pub use providers::create_tool_provider;
pub use providers::gemini_tool_provider::GeminiToolProvider;
pub use schema::{translate_schema, GeminiSchema, SchemaType};
