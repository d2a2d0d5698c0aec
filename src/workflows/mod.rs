pub mod daemonset;
pub mod extract;
