//! Canvas Coach — a stateless turn server for the guided business canvas.
//!
//! The server holds no session storage: every request carries the full
//! canvas state, the engine runs one turn against the configured LLM
//! backend, and the updated state goes back to the client. Routing,
//! persistence gates and the widget contract are deterministic; only the
//! specialist wording comes from the model.

pub mod config;
pub mod engine;
pub mod error;
pub mod language;
pub mod llm;
pub mod router;
pub mod routes;
pub mod specialists;
pub mod state;
pub mod ui;
pub mod usage;
