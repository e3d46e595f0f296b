//! Cooperative build job contract
//!
//! Batch work is modeled as explicit state machines driven by an external
//! `update()` call instead of background threads: the host interleaves
//! stepping with UI feedback. Progress is monotonically non-decreasing in
//! [0, 1]; a finished job must not be reused.

use terramesh_core::{Error, Result};

/// A batch job advanced one bounded step at a time
pub trait BuildJob {
    /// Perform one unit of work. Calling `update` on a finished job is a
    /// no-op.
    fn update(&mut self) -> Result<()>;

    /// Completion fraction in [0, 1], never decreasing
    fn progress(&self) -> f32;

    fn is_done(&self) -> bool;
}

/// Drive a job to completion with a step budget, for tests and headless
/// callers that have no frame loop to interleave with.
pub fn drive_to_completion(job: &mut dyn BuildJob, max_steps: usize) -> Result<()> {
    for _ in 0..max_steps {
        if job.is_done() {
            return Ok(());
        }
        job.update()?;
    }
    if job.is_done() {
        Ok(())
    } else {
        Err(Error::InvalidData(format!(
            "job not finished after {} steps",
            max_steps
        )))
    }
}
