//! Multi-participant integration tests over the in-memory bus.

mod exclusion;
mod isolation;
mod membership;
mod scenario;
mod support;
