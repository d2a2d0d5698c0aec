pub mod client;
pub mod namespace;
pub mod observer;
pub mod preload;
