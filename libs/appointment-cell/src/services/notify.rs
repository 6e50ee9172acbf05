// libs/appointment-cell/src/services/notify.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use shared_database::store::{CatalogStore, UserStore};
use shared_database::AppState;
use shared_models::appointment::Appointment;
use shared_models::notification::{NotificationData, NotificationKind, NotificationSender};

fn goes_to_dentist(kind: NotificationKind) -> bool {
    matches!(
        kind,
        NotificationKind::NewAppointmentToDentist | NotificationKind::RescheduleToDentist
    )
}

/// Sends appointment notifications off the request path.
///
/// Each dispatch runs in its own task bounded by the configured timeout.
/// Lookup, rendering, and transport failures are logged and dropped.
#[derive(Clone)]
pub struct NotificationDispatcher {
    users: Arc<dyn UserStore>,
    catalog: Arc<dyn CatalogStore>,
    notifier: Arc<dyn NotificationSender>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
            catalog: state.catalog.clone(),
            notifier: state.notifier.clone(),
            timeout: Duration::from_secs(state.config.notification_timeout_secs),
        }
    }

    pub fn dispatch(
        &self,
        kinds: Vec<NotificationKind>,
        appointment: Appointment,
        previous: Option<(NaiveDate, NaiveTime)>,
    ) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let work = this.deliver(&kinds, &appointment, previous);
            if tokio::time::timeout(this.timeout, work).await.is_err() {
                warn!(
                    "Notifications for appointment {} timed out after {:?}",
                    appointment.id, this.timeout
                );
            }
        })
    }

    async fn deliver(
        &self,
        kinds: &[NotificationKind],
        appointment: &Appointment,
        previous: Option<(NaiveDate, NaiveTime)>,
    ) {
        let (patient, dentist, service) = match tokio::try_join!(
            self.users.find_user_by_id(appointment.patient_id),
            self.users.find_user_by_id(appointment.dentist_id),
            self.catalog.get_service(appointment.service_id),
        ) {
            Ok((Some(patient), Some(dentist), service)) => (patient, dentist, service),
            Ok(_) => {
                warn!("Skipping notifications for appointment {}: participant missing", appointment.id);
                return;
            }
            Err(e) => {
                warn!("Skipping notifications for appointment {}: {}", appointment.id, e);
                return;
            }
        };

        for &kind in kinds {
            let recipient = if goes_to_dentist(kind) { &dentist } else { &patient };
            let data = NotificationData {
                recipient_name: recipient.name.clone(),
                patient_name: patient.name.clone(),
                dentist_name: dentist.name.clone(),
                service_name: service
                    .as_ref()
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| "Dental appointment".to_string()),
                date: appointment.date,
                time: appointment.time,
                duration: appointment.duration,
                notes: appointment.notes.clone(),
                previous_date: previous.map(|(date, _)| date),
                previous_time: previous.map(|(_, time)| time),
            };

            match self.notifier.notify(kind, &recipient.email, &data).await {
                Ok(()) => debug!("Sent {:?} for appointment {} to {}", kind, appointment.id, recipient.email),
                Err(e) => warn!(
                    "Failed to send {:?} for appointment {} via {}: {}",
                    kind,
                    appointment.id,
                    self.notifier.name(),
                    e
                ),
            }
        }
    }
}
