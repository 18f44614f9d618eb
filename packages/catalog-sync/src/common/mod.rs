pub mod restate_serde;
pub mod restate_types;

pub use restate_types::EmptyRequest;
