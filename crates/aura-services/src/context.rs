//! Platform audio context abstraction

use std::fmt::Debug;

use thiserror::Error;

use crate::audio_effects::DEFAULT_SAMPLE_RATE;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContextError {
    #[error("Audio context is closed")]
    Closed,
    #[error("Audio context failed to start: {0}")]
    StartFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Suspended,
    Running,
    Closed,
}

/// The device-side clock and output the engine renders for
pub trait AudioContext: Send + Debug {
    /// Bring the context to `Running`, blocking until it gets there
    fn resume(&mut self) -> Result<(), ContextError>;
    fn state(&self) -> ContextState;
    fn sample_rate(&self) -> f32;
    fn close(&mut self);
}

/// Context with no device behind it; audio is pulled through `AudioEngine::render`
#[derive(Debug, Clone)]
pub struct OfflineContext {
    sample_rate: f32,
    state: ContextState,
}

impl OfflineContext {
    pub fn new(sample_rate: f32) -> Self {
        Self { sample_rate, state: ContextState::Suspended }
    }
}

impl Default for OfflineContext {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl AudioContext for OfflineContext {
    fn resume(&mut self) -> Result<(), ContextError> {
        match self.state {
            ContextState::Closed => Err(ContextError::Closed),
            _ => {
                self.state = ContextState::Running;
                Ok(())
            }
        }
    }

    fn state(&self) -> ContextState {
        self.state
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn close(&mut self) {
        self.state = ContextState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_lifecycle() {
        let mut ctx = OfflineContext::new(48000.0);
        assert_eq!(ctx.state(), ContextState::Suspended);
        ctx.resume().unwrap();
        assert_eq!(ctx.state(), ContextState::Running);
        ctx.close();
        assert_eq!(ctx.resume(), Err(ContextError::Closed));
    }
}
