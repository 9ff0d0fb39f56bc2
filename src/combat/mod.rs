pub mod controller;

pub use controller::{CombatController, ControllerError, Notice, NoticeKind, PostGame, Selection};
