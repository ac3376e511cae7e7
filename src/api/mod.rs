/// Request routing and identity resolution.
pub mod routes;
