//! Day-before reminder sweep.
//!
//! A daily scan over confirmed, not-yet-reminded registrations whose
//! webinar starts tomorrow (local calendar). One bad address must not block
//! the rest of the day's reminders, so per-registration failures are logged
//! and skipped; `reminder_sent` is only set after a successful send.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use domain::services::{Mailer, RegistrationStore};

use crate::config::ReminderConfig;
use crate::services::email::reminder_email;

use super::scheduler::{Job, JobFrequency};

/// Outcome of one sweep run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub sent: usize,
    pub failed: usize,
}

/// Background job sending day-before webinar reminders.
pub struct ReminderJob {
    store: Arc<dyn RegistrationStore>,
    mailer: Arc<dyn Mailer>,
    company_name: String,
    hour: u32,
    minute: u32,
}

/// Local midnight of a date, as a UTC instant. Falls back to UTC midnight
/// if the local timezone skips that wall-clock time.
fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// The sweep window: [tomorrow 00:00, day-after-tomorrow 00:00) in the
/// operator's local calendar.
pub fn reminder_window(now_local: DateTime<Local>) -> (DateTime<Utc>, DateTime<Utc>) {
    let tomorrow = now_local.date_naive() + Duration::days(1);
    (local_midnight(tomorrow), local_midnight(tomorrow + Duration::days(1)))
}

impl ReminderJob {
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        mailer: Arc<dyn Mailer>,
        company_name: String,
        config: &ReminderConfig,
    ) -> Self {
        Self {
            store,
            mailer,
            company_name,
            hour: config.hour,
            minute: config.minute,
        }
    }

    /// Run the sweep over an explicit window.
    pub async fn run_window(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<SweepStats, String> {
        let due = self
            .store
            .registrations_needing_reminder(window_start, window_end)
            .await
            .map_err(|e| format!("Failed to load due registrations: {e}"))?;

        info!(count = due.len(), "Reminder sweep starting");

        let mut stats = SweepStats::default();
        for details in due {
            let registration_id = details.registration.id;
            let email = details.user.email.clone();

            let Some(meet_link) = details.registration.meet_link.clone() else {
                warn!(
                    registration_id = %registration_id,
                    "Confirmed registration has no meeting link, skipping reminder"
                );
                stats.failed += 1;
                continue;
            };

            let message = reminder_email(
                &self.company_name,
                &email,
                &details.user.name,
                &details.webinar.title,
                details.webinar.start_date,
                &meet_link,
            );

            match self.mailer.send(message).await {
                Ok(()) => match self.store.mark_reminder_sent(registration_id).await {
                    Ok(()) => {
                        info!(registration_id = %registration_id, to = %email, "Reminder sent");
                        stats.sent += 1;
                    }
                    Err(e) => {
                        warn!(
                            registration_id = %registration_id,
                            error = %e,
                            "Reminder sent but flag update failed"
                        );
                        stats.failed += 1;
                    }
                },
                Err(e) => {
                    warn!(
                        registration_id = %registration_id,
                        to = %email,
                        error = %e,
                        "Failed to send reminder, continuing"
                    );
                    stats.failed += 1;
                }
            }
        }

        info!(sent = stats.sent, failed = stats.failed, "Reminder sweep finished");
        Ok(stats)
    }
}

#[async_trait::async_trait]
impl Job for ReminderJob {
    fn name(&self) -> &'static str {
        "webinar_reminders"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::DailyAt {
            hour: self.hour,
            minute: self.minute,
        }
    }

    async fn execute(&self) -> Result<(), String> {
        let (window_start, window_end) = reminder_window(Local::now());
        self.run_window(window_start, window_end).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{registrant, test_webinar, InMemoryStore, MockMailer};
    use domain::models::{RegistrationStatus, Webinar};
    use uuid::Uuid;

    async fn seed_confirmed_registration(store: &InMemoryStore, webinar: &Webinar) -> Uuid {
        let user = store
            .upsert_user_by_email(&registrant("jane@example.com", "Jane"))
            .await
            .unwrap();
        let registration = store
            .create_registration(user.id, webinar.id)
            .await
            .unwrap();
        store
            .set_meeting_info(registration.id, "https://meet.test/evt-1", "evt-1")
            .await
            .unwrap();
        store
            .update_registration_status(registration.id, RegistrationStatus::Confirmed)
            .await
            .unwrap();
        registration.id
    }

    fn job(store: Arc<InMemoryStore>, mailer: Arc<MockMailer>) -> ReminderJob {
        ReminderJob::new(store, mailer, "Acme".to_string(), &ReminderConfig::default())
    }

    #[tokio::test]
    async fn test_sweep_sends_once_and_sets_flag() {
        let store = Arc::new(InMemoryStore::new());
        let mailer = Arc::new(MockMailer::new());

        // Webinar starting in 20 hours, inside the sweep window.
        let mut webinar = test_webinar(0.0, 100);
        webinar.start_date = Utc::now() + Duration::hours(20);
        webinar.end_date = webinar.start_date + Duration::hours(1);
        let webinar = store.insert_webinar(webinar).await;
        let registration_id = seed_confirmed_registration(&store, &webinar).await;

        let job = job(store.clone(), mailer.clone());
        let window = (Utc::now(), Utc::now() + Duration::days(2));

        let stats = job.run_window(window.0, window.1).await.unwrap();
        assert_eq!(stats, SweepStats { sent: 1, failed: 0 });
        assert_eq!(mailer.sent_count(), 1);

        let registration = store
            .find_registration(registration_id)
            .await
            .unwrap()
            .unwrap();
        assert!(registration.reminder_sent);

        // Second sweep the same day: nothing left to send.
        let stats = job.run_window(window.0, window.1).await.unwrap();
        assert_eq!(stats, SweepStats { sent: 0, failed: 0 });
        assert_eq!(mailer.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_sweep_skips_pending_registrations() {
        let store = Arc::new(InMemoryStore::new());
        let mailer = Arc::new(MockMailer::new());

        let mut webinar = test_webinar(0.0, 100);
        webinar.start_date = Utc::now() + Duration::hours(20);
        webinar.end_date = webinar.start_date + Duration::hours(1);
        let webinar = store.insert_webinar(webinar).await;

        let user = store
            .upsert_user_by_email(&registrant("pending@example.com", "Pending"))
            .await
            .unwrap();
        store.create_registration(user.id, webinar.id).await.unwrap();

        let job = job(store, mailer.clone());
        let stats = job
            .run_window(Utc::now(), Utc::now() + Duration::days(2))
            .await
            .unwrap();
        assert_eq!(stats, SweepStats { sent: 0, failed: 0 });
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_sweep_skips_webinars_outside_window() {
        let store = Arc::new(InMemoryStore::new());
        let mailer = Arc::new(MockMailer::new());

        // Starts in five days, well past the window.
        let webinar = store.insert_webinar(test_webinar(0.0, 100)).await;
        seed_confirmed_registration(&store, &webinar).await;

        let job = job(store, mailer.clone());
        let stats = job
            .run_window(Utc::now(), Utc::now() + Duration::days(2))
            .await
            .unwrap();
        assert_eq!(stats, SweepStats { sent: 0, failed: 0 });
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_sweep_continues_past_send_failures() {
        let store = Arc::new(InMemoryStore::new());
        let mailer = Arc::new(MockMailer::failing());

        let mut webinar = test_webinar(0.0, 100);
        webinar.start_date = Utc::now() + Duration::hours(20);
        webinar.end_date = webinar.start_date + Duration::hours(1);
        let webinar = store.insert_webinar(webinar).await;
        let registration_id = seed_confirmed_registration(&store, &webinar).await;

        let job = job(store.clone(), mailer);
        let stats = job
            .run_window(Utc::now(), Utc::now() + Duration::days(2))
            .await
            .unwrap();
        assert_eq!(stats, SweepStats { sent: 0, failed: 1 });

        // Failed sends leave the flag untouched for the next day's sweep.
        let registration = store
            .find_registration(registration_id)
            .await
            .unwrap()
            .unwrap();
        assert!(!registration.reminder_sent);
    }

    #[test]
    fn test_reminder_window_shape() {
        let now = Local::now();
        let (start, end) = reminder_window(now);

        assert!(start > now.with_timezone(&Utc));
        assert!(start - now.with_timezone(&Utc) <= Duration::hours(24));
        let span = (end - start).num_hours();
        // 23 or 25 on DST transition days.
        assert!((23..=25).contains(&span));
    }

    #[test]
    fn test_job_metadata() {
        let store = Arc::new(InMemoryStore::new());
        let mailer = Arc::new(MockMailer::new());
        let job = job(store, mailer);
        assert_eq!(job.name(), "webinar_reminders");
        assert!(matches!(
            job.frequency(),
            JobFrequency::DailyAt { hour: 9, minute: 0 }
        ));
    }
}
