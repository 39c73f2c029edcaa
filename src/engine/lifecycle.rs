use tracing::{debug, warn};

use crate::model::BookingStatus;
use crate::observability;

use super::EngineError;

/// Validate a status edge against the transition table. Rejections never
/// mutate anything — the caller only applies the new status on `Ok`.
pub(crate) fn ensure_transition(
    from: BookingStatus,
    to: BookingStatus,
) -> Result<(), EngineError> {
    if from.can_transition_to(to) {
        debug!(%from, %to, "status transition allowed");
        Ok(())
    } else {
        warn!(%from, %to, "status transition rejected");
        metrics::counter!(observability::TRANSITIONS_REJECTED_TOTAL).increment(1);
        Err(EngineError::InvalidTransition { from, to })
    }
}

pub(crate) fn ensure_editable(status: BookingStatus) -> Result<(), EngineError> {
    if status.can_edit() {
        Ok(())
    } else {
        Err(EngineError::NotEditable(status))
    }
}

pub(crate) fn ensure_cancelable(status: BookingStatus) -> Result<(), EngineError> {
    if status.can_cancel() {
        Ok(())
    } else {
        Err(EngineError::NotCancelable(status))
    }
}
