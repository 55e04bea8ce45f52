//! Outbound HTTP dispatch used by upstream workers (§4.3).

pub mod dispatch;
