pub mod chakra;
pub mod queue;
pub mod snapshot;
pub mod status;
pub mod types;
