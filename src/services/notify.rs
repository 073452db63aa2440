use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::services::store::Medicine;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("reminder scheduling failed: {0}")]
    Failed(String),
}

/// Reminder-scheduling collaborator. Called only after a successful commit.
#[async_trait]
pub trait ReminderScheduler: Send + Sync {
    async fn schedule_medicine(&self, medicine: &Medicine) -> Result<(), NotifyError>;
}

/// Log-backed scheduler for environments without a notification service.
pub struct LogScheduler;

#[async_trait]
impl ReminderScheduler for LogScheduler {
    async fn schedule_medicine(&self, medicine: &Medicine) -> Result<(), NotifyError> {
        info!(
            name = %medicine.name,
            days = medicine.days.len(),
            times = medicine.times.len(),
            "reminders scheduled"
        );
        Ok(())
    }
}
