//! flatql runtime: decides how a statement runs and feeds files into the
//! embedded engine.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────┐   load    ┌───────────────────┐
//! │ Workspace │ ────────► │ LocalEngineBridge │ ◄─┐
//! └───────────┘           └───────────────────┘   │
//!                                                  │ query / execute
//!                          ┌─────────────────────┐ │
//!          SQL text ─────► │   ExecutionRouter   │─┤
//!                          └─────────────────────┘ │
//!                                                  │
//!                         ┌─────────────────────┐  │
//!                         │ RemoteEngineAdapter │ ◄┘
//!                         └─────────────────────┘
//! ```

pub mod ingest;
pub mod router;

pub use ingest::Workspace;
pub use router::{ExecutionOutput, ExecutionPolicy, ExecutionRouter, SqlExecutor};
