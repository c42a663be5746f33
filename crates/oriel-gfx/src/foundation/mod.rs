pub mod candidate;
pub mod queue;
pub mod selector;
