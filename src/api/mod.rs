//! API Module
//!
//! JSON-RPC relayer surface. Clients post signed plans; this node submits
//! them to the engine under its configured relayer identity.

mod server;


pub use server::{AppState, Server, SubmissionResponse, SubmissionStatus, router};
