//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Session receive loop
//!     → spawn one task per message
//!     → engine.rs (parse → pipeline → route → handler → close)
//!     → pipeline.rs (pre-handlers, in order)
//! ```
//!
//! # Design Decisions
//! - No ordering between messages of the same session
//! - Within one message the steps are strictly sequential
//! - Routes and pre-handlers are frozen by `DispatcherBuilder::build`

pub mod engine;
pub mod pipeline;

pub use engine::{Dispatcher, DispatcherBuilder, Outcome};
pub use pipeline::Pipeline;
