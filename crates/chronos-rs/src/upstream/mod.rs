//! The per-upstream priority queue and pacing dispatch worker (§4.3).

pub mod queue;
pub mod worker;

pub use worker::Upstream;
