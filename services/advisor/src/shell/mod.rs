pub mod ask_task;
pub mod handler;
pub mod protocol;
pub mod state;
pub mod view;

// Re-export the entry points the terminal binary drives.
pub use ask_task::{ask_process, submit};
pub use handler::{handle_intent, Reply};
