/// Editing session event loop.
pub mod editor;
/// Background decode and device jobs.
pub mod jobs;
