//! Interactive console for managing zakat records.

pub mod manager;
pub mod menu;
pub mod prompt;
pub mod terminal;

pub use manager::RecordManager;
pub use menu::MenuChoice;
pub use prompt::Console;
pub use terminal::{stdio, Interrupt};
