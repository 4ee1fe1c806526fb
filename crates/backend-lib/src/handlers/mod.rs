// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! Plain HTTP handlers.
pub mod http;
