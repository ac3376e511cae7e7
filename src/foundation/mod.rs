/// Settings structs.
pub mod config;
/// Geometry re-exports and the canvas.
pub mod core;
/// Error taxonomy.
pub mod error;
pub(crate) mod math;
