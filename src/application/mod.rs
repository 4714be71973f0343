//! Application layer: use-case orchestration over the domain and ports.

pub mod handlers;
