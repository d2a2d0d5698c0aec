pub mod job;
pub mod kind;
