/// Transform state and update rules.
pub mod model;
