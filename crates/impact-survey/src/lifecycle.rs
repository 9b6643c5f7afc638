use crate::error::StoreError;
use crate::model::SurveyStatus;

/// Validates a survey status transition.
///
/// Status only moves forward; staying in place is not a transition.
pub fn validate_status_transition(from: SurveyStatus, to: SurveyStatus) -> Result<(), StoreError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(StoreError::IllegalStatusTransition { from, to })
    }
}

/// Statuses reachable in one step from `from`
#[must_use]
pub fn allowed_status_transitions(from: SurveyStatus) -> Vec<SurveyStatus> {
    use SurveyStatus::{Active, Completed, Draft};
    match from {
        Draft => vec![Active, Completed],
        Active => vec![Completed],
        Completed => vec![],
    }
}

/// Statuses a creation action may produce
#[inline]
#[must_use]
pub fn is_initial_status(status: SurveyStatus) -> bool {
    matches!(status, SurveyStatus::Draft | SurveyStatus::Active)
}

fn allowed(from: SurveyStatus, to: SurveyStatus) -> bool {
    allowed_status_transitions(from).into_iter().any(|s| s == to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_status() -> impl Strategy<Value = SurveyStatus> {
        prop_oneof![
            Just(SurveyStatus::Draft),
            Just(SurveyStatus::Active),
            Just(SurveyStatus::Completed),
        ]
    }

    #[test]
    fn forward_transitions() {
        assert!(validate_status_transition(SurveyStatus::Draft, SurveyStatus::Active).is_ok());
        assert!(validate_status_transition(SurveyStatus::Active, SurveyStatus::Completed).is_ok());
        assert!(validate_status_transition(SurveyStatus::Draft, SurveyStatus::Completed).is_ok());
    }

    #[test]
    fn backward_transitions_rejected() {
        assert!(validate_status_transition(SurveyStatus::Active, SurveyStatus::Draft).is_err());
        assert!(validate_status_transition(SurveyStatus::Completed, SurveyStatus::Active).is_err());
        assert!(validate_status_transition(SurveyStatus::Completed, SurveyStatus::Completed).is_err());
    }

    #[test]
    fn completed_is_not_initial() {
        assert!(is_initial_status(SurveyStatus::Draft));
        assert!(is_initial_status(SurveyStatus::Active));
        assert!(!is_initial_status(SurveyStatus::Completed));
    }

    proptest! {
        #[test]
        fn prop_transitions_only_move_forward(from in any_status(), to in any_status()) {
            let res = validate_status_transition(from, to);
            prop_assert_eq!(res.is_ok(), to > from);
        }
    }
}
