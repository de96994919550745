//! Resumable procedure execution.
//!
//! - [`Step`]: smallest resumable unit (continue / cancel / queue child / input)
//! - [`StepSlot`]: a step or a factory that builds one in place
//! - [`Pipeline`]: drains slots cooperatively, pausing when a step waits
//! - [`SimpleStep`], [`PipelineStep`], [`Phase`]: stock steps
//!
//! ## Execution model
//!
//! Single-threaded and cooperative. A drain runs until the pipeline is
//! empty or the front step returns `Ok(false)` without queueing anything.
//! Input is delivered with [`Pipeline::handle_input`], after which the
//! caller drains again.
//!
//! Everything is generic over the game context `G` the steps operate on.

mod phase;
mod scheduler;
mod simple;
mod step;

pub use phase::{Phase, PhaseHost};
pub use scheduler::{DrainOutcome, Pipeline};
pub use simple::{PipelineStep, SimpleStep, StepFn};
pub use step::{Step, StepContext, StepFactory, StepSlot, StepStatus};
