pub mod demand;
pub mod network;
pub mod node;
pub mod spec;
