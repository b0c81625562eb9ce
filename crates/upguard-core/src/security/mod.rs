//! Extraction limits that keep a hostile archive from exhausting the host.

pub mod deadline;
pub mod quota;
pub mod zipbomb;

pub use deadline::Deadline;
pub use quota::QuotaTracker;
pub use zipbomb::EntrySizes;
pub use zipbomb::check_declared;
pub use zipbomb::check_produced;
