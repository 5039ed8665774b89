//! Human records: the one table the tool provider serves.
//!
//! - **types**: the `Human` row, serialized with camelCase keys
//! - **store**: SQLite-backed `HumanStore` (read path + one-time seed)
//! - **tool**: `GetHumansTool`, the `get_humans` tool over the store

pub mod types;
pub mod store;
pub mod seed;
pub mod tool;

pub use types::Human;
pub use store::{HumanStore, StoreError};
pub use tool::GetHumansTool;
