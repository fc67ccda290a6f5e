//! Batch Execution Module
//!
//! The engine entry point: authenticates a relayer's submission and
//! executes its batch atomically against an `ExecutionHost`.

mod engine;


pub use engine::{IntentEngine, Submission};
