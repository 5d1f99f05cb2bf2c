use thiserror::Error;

use crate::models::LeadStatus;

/// Stages a lead moves through while it is being processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadStage {
    Received,
    Classified,
    LowQuality,
    Pending,
    NoMatches,
    Matched,
    Error,
}

impl LeadStage {
    /// The status persisted for this stage, if the stage is ever persisted
    pub fn persisted_status(&self) -> Option<LeadStatus> {
        match self {
            LeadStage::Received | LeadStage::Classified => None,
            LeadStage::LowQuality => Some(LeadStatus::LowQuality),
            LeadStage::Pending => Some(LeadStatus::Pending),
            LeadStage::NoMatches => Some(LeadStatus::NoMatches),
            LeadStage::Matched => Some(LeadStatus::Matched),
            LeadStage::Error => Some(LeadStatus::Error),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LeadStage::LowQuality | LeadStage::NoMatches | LeadStage::Matched | LeadStage::Error
        )
    }

    fn allows(&self, next: LeadStage) -> bool {
        use LeadStage::*;
        match (self, next) {
            (from, Error) => !from.is_terminal(),
            (Received, Classified) => true,
            (Classified, LowQuality) | (Classified, Pending) => true,
            (Pending, NoMatches) | (Pending, Matched) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Invalid lead transition: {from:?} -> {to:?}")]
    InvalidTransition { from: LeadStage, to: LeadStage },
}

/// Whether a transition changed the stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// Already at the requested stage; nothing to persist
    Unchanged,
}

/// Forward-only state machine for one lead
#[derive(Debug, Clone)]
pub struct Lifecycle {
    stage: LeadStage,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            stage: LeadStage::Received,
        }
    }

    pub fn stage(&self) -> LeadStage {
        self.stage
    }

    /// Advance to `next`. Re-applying the current stage is a no-op so that
    /// retried steps never write the same status twice.
    pub fn advance(&mut self, next: LeadStage) -> Result<Transition, LifecycleError> {
        if self.stage == next {
            return Ok(Transition::Unchanged);
        }
        if !self.stage.allows(next) {
            return Err(LifecycleError::InvalidTransition {
                from: self.stage,
                to: next,
            });
        }
        tracing::trace!("Lead stage {:?} -> {:?}", self.stage, next);
        self.stage = next;
        Ok(Transition::Applied)
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
