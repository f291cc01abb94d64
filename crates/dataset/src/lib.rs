//! Dataset loading — CSV codec, schema validation, synthetic generation,
//! and override-or-default resolution for the four campaign tables.

pub mod csv;
pub mod generator;
pub mod loader;
pub mod schema;
pub mod store;

pub use generator::generate;
pub use store::{DatasetStore, TableOverrides};
