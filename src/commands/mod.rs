// Commands module - imports all individual command files
pub mod help;
pub mod leaveserver;

// Re-export all commands for easy access from main.rs
pub use help::help;
pub use leaveserver::leaveserver;
