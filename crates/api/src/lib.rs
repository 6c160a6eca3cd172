//! HTTP dispatch: method policy, authentication, operation invocation and
//! response shaping, plus the axum binding that serves it.

pub mod app;
pub mod config;
pub mod dispatch;
pub mod handler;
pub mod method;
pub mod operation;
mod panic_report;
pub mod writer;

pub use config::Settings;
pub use dispatch::{DispatchState, REQUEST_ID_HEADER, Resolution};
pub use handler::{RestHandler, RestHandlerBuilder};
pub use method::Method;
pub use operation::{Operation, OperationResult, OperationTable, Outcome};
pub use writer::{Chunk, ResponseWriter, WireResponse, WriteError};
