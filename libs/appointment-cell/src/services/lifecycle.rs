// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use shared_models::scheduling::AppointmentStatus;

use crate::models::AppointmentError;

/// Transition table of the appointment state machine.
///
/// `Expired` is terminal and only ever set outside the booking core.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidState(
                self.rejection_message(new_status).to_string(),
            ));
        }

        Ok(())
    }

    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            // Terminal states
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Cancelled => vec![],
            AppointmentStatus::Expired => vec![],
        }
    }

    fn rejection_message(&self, target: AppointmentStatus) -> &'static str {
        match target {
            AppointmentStatus::Confirmed => "Only pending appointments can be confirmed",
            AppointmentStatus::Completed => "Only confirmed appointments can be completed",
            AppointmentStatus::Cancelled => "Only pending or confirmed appointments can be cancelled",
            AppointmentStatus::Pending | AppointmentStatus::Expired => {
                "Appointment cannot move to the requested status"
            }
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use AppointmentStatus::*;

    const ALL: [AppointmentStatus; 5] = [Pending, Confirmed, Completed, Cancelled, Expired];

    #[test]
    fn transition_table() {
        let lifecycle = AppointmentLifecycleService::new();
        let allowed = [
            (Pending, Confirmed),
            (Pending, Cancelled),
            (Confirmed, Completed),
            (Confirmed, Cancelled),
        ];

        for from in ALL {
            for to in ALL {
                let result = lifecycle.validate_status_transition(from, to);
                if allowed.contains(&(from, to)) {
                    assert!(result.is_ok(), "{} -> {} should be allowed", from, to);
                } else {
                    assert_matches!(result, Err(AppointmentError::InvalidState(_)));
                }
            }
        }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle.get_valid_transitions(Completed).is_empty());
        assert!(lifecycle.get_valid_transitions(Cancelled).is_empty());
        assert!(lifecycle.get_valid_transitions(Expired).is_empty());
    }
}
