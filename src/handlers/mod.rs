// Event-driven flows, triggered from the gateway event handler in main.rs
pub mod greeting;
