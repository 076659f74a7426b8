//! Per-session cancellation.
//!
//! Every player session (and every pending open) is issued a `SessionToken`.
//! Work spawned on behalf of that session carries a clone; closing or
//! replacing the session cancels it so late completions can be dropped
//! without touching the state of whatever session is active now.

use anyhow::{Result, anyhow};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

#[derive(Clone, Debug)]
pub struct SessionToken {
    generation: u64,
    cancelled: Arc<AtomicBool>,
}

impl SessionToken {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn check_cancelled(&self, stage: &'static str) -> Result<()> {
        if self.is_cancelled() {
            return Err(anyhow!(
                "session {} cancelled at stage={stage}",
                self.generation
            ));
        }
        Ok(())
    }
}
