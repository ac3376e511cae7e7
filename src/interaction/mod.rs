/// Drag and wheel state machine.
pub mod controller;
/// Capture geometry and the host-side registry.
pub mod region;
