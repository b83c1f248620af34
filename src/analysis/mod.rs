pub mod bottleneck;
pub mod impact;
pub mod optimization;
pub mod statistics;
