//! Terminal output for the agent binary

mod console;

pub use console::Console;
