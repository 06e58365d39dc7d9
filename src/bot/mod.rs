/// Randomized reply delay
pub mod delay;
/// Per-message conversation workflow
pub mod handler;
/// Telegram runtime entrypoint
pub mod runner;
/// Outbound messaging seam and its Telegram implementation
pub mod transport;
