//! Shared worker primitives for the analysis engine.
//!
//! * [`spawn_named_thread`]: dedicated OS threads for single-consumer loops.
//! * [`GenerationClock`] / [`RunTicket`]: staleness detection for in-flight runs.
//! * [`AbortToken`]: terminal stop flag for one worker instance.
//! * [`panic_message`]: readable payloads for caught collaborator panics.

mod panic;
mod spawn;
mod token;

pub use panic::panic_message;
pub use spawn::spawn_named_thread;
pub use token::{AbortToken, GenerationClock, RunTicket};
