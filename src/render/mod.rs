/// CPU compositor for the base and overlay layers.
pub mod compositor;
/// Rendered frames and their export encodings.
pub mod frame;
/// Layer placement math.
pub mod layout;
