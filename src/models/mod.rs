pub mod change_event;
pub mod github;
