pub mod backoff;
pub mod driver;
pub mod machine;
pub mod store;

pub use driver::{spawn, Navigate, SessionCommand, SessionEvent, SessionHandle, View};
pub use machine::{CloseCause, ConnectionState, Membership, Next, SessionMachine};
