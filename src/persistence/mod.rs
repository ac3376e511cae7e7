/// Image blob stores.
pub mod blob;
/// Synthesis record types.
pub mod model;
/// Synthesis service operations.
pub mod service;
/// Record stores.
pub mod store;
