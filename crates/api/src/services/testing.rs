//! Test doubles for the workflow seams: an in-memory registration store and
//! counting mock providers.

use chrono::{DateTime, Datelike, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use domain::models::{
    Payment, PaymentStatus, Registration, RegistrationDetails, RegistrationStatus, RegistrantInfo,
    User, Webinar, WebinarStatus,
};
use domain::services::{
    CheckoutSession, CheckoutStatus, CheckoutStatusInfo, EmailMessage, GatewayError, MailError,
    Mailer, MeetingError, MeetingEvent, MeetingProvider, MeetingRequest, PaymentGateway,
    RegistrationStore, StoreError,
};

use crate::config::CompanyConfig;

/// A webinar one week out with the given price and capacity.
pub fn test_webinar(price: f64, max_participants: i32) -> Webinar {
    let now = Utc::now();
    Webinar {
        id: Uuid::new_v4(),
        title: "Rust in production".to_string(),
        description: Some("A deep dive".to_string()),
        start_date: now + Duration::days(7),
        end_date: now + Duration::days(7) + Duration::hours(1),
        price,
        max_participants,
        status: WebinarStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

pub fn registrant(email: &str, name: &str) -> RegistrantInfo {
    RegistrantInfo {
        email: email.to_string(),
        name: name.to_string(),
        company: None,
    }
}

pub fn test_company() -> CompanyConfig {
    CompanyConfig {
        name: "Acme Webinars".to_string(),
        address: "1 Example Street".to_string(),
        registration_number: String::new(),
        vat_number: String::new(),
    }
}

#[derive(Default)]
struct State {
    users: Vec<User>,
    webinars: HashMap<Uuid, Webinar>,
    registrations: HashMap<Uuid, Registration>,
    payments: HashMap<Uuid, Payment>,
}

/// In-memory `RegistrationStore` mirroring the Postgres semantics the
/// workflow relies on (case-insensitive email upsert, the non-cancelled
/// uniqueness rule, monthly payment counting).
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_webinar(&self, webinar: Webinar) -> Webinar {
        let mut state = self.state.lock().unwrap();
        state.webinars.insert(webinar.id, webinar.clone());
        webinar
    }

    pub async fn user_count(&self) -> usize {
        self.state.lock().unwrap().users.len()
    }

    pub async fn user_by_email(&self, email: &str) -> Option<User> {
        let state = self.state.lock().unwrap();
        state
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    pub async fn payment_by_id(&self, id: Uuid) -> Option<Payment> {
        self.state.lock().unwrap().payments.get(&id).cloned()
    }
}

#[async_trait::async_trait]
impl RegistrationStore for InMemoryStore {
    async fn find_webinar(&self, id: Uuid) -> Result<Option<Webinar>, StoreError> {
        Ok(self.state.lock().unwrap().webinars.get(&id).cloned())
    }

    async fn count_confirmed_registrations(&self, webinar_id: Uuid) -> Result<i64, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .registrations
            .values()
            .filter(|r| r.webinar_id == webinar_id && r.status == RegistrationStatus::Confirmed)
            .count() as i64)
    }

    async fn upsert_user_by_email(&self, info: &RegistrantInfo) -> Result<User, StoreError> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();

        if let Some(user) = state
            .users
            .iter_mut()
            .find(|u| u.email.eq_ignore_ascii_case(&info.email))
        {
            user.name = info.name.clone();
            user.company = info.company.clone();
            user.updated_at = now;
            return Ok(user.clone());
        }

        let user = User {
            id: Uuid::new_v4(),
            email: info.email.clone(),
            name: info.name.clone(),
            company: info.company.clone(),
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn has_active_registration(
        &self,
        user_id: Uuid,
        webinar_id: Uuid,
    ) -> Result<bool, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.registrations.values().any(|r| {
            r.user_id == user_id
                && r.webinar_id == webinar_id
                && r.status != RegistrationStatus::Cancelled
        }))
    }

    async fn create_registration(
        &self,
        user_id: Uuid,
        webinar_id: Uuid,
    ) -> Result<Registration, StoreError> {
        let mut state = self.state.lock().unwrap();

        let duplicate = state.registrations.values().any(|r| {
            r.user_id == user_id
                && r.webinar_id == webinar_id
                && r.status != RegistrationStatus::Cancelled
        });
        if duplicate {
            return Err(StoreError::Conflict(
                "duplicate registration for (user, webinar)".to_string(),
            ));
        }

        let now = Utc::now();
        let registration = Registration {
            id: Uuid::new_v4(),
            user_id,
            webinar_id,
            payment_id: None,
            status: RegistrationStatus::Pending,
            meet_link: None,
            calendar_event_id: None,
            reminder_sent: false,
            created_at: now,
            updated_at: now,
        };
        state.registrations.insert(registration.id, registration.clone());
        Ok(registration)
    }

    async fn find_registration(&self, id: Uuid) -> Result<Option<Registration>, StoreError> {
        Ok(self.state.lock().unwrap().registrations.get(&id).cloned())
    }

    async fn find_registration_details(
        &self,
        id: Uuid,
    ) -> Result<Option<RegistrationDetails>, StoreError> {
        let state = self.state.lock().unwrap();
        let Some(registration) = state.registrations.get(&id).cloned() else {
            return Ok(None);
        };
        let user = state
            .users
            .iter()
            .find(|u| u.id == registration.user_id)
            .cloned()
            .ok_or_else(|| StoreError::Database("user row missing".to_string()))?;
        let webinar = state
            .webinars
            .get(&registration.webinar_id)
            .cloned()
            .ok_or_else(|| StoreError::Database("webinar row missing".to_string()))?;

        Ok(Some(RegistrationDetails {
            registration,
            user,
            webinar,
        }))
    }

    async fn update_registration_status(
        &self,
        id: Uuid,
        status: RegistrationStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(registration) = state.registrations.get_mut(&id) {
            registration.status = status;
            registration.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_meeting_info(
        &self,
        id: Uuid,
        meet_link: &str,
        calendar_event_id: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(registration) = state.registrations.get_mut(&id) {
            registration.meet_link = Some(meet_link.to_string());
            registration.calendar_event_id = Some(calendar_event_id.to_string());
            registration.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn link_payment(
        &self,
        registration_id: Uuid,
        payment_id: Uuid,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(registration) = state.registrations.get_mut(&registration_id) {
            registration.payment_id = Some(payment_id);
            registration.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn create_payment(
        &self,
        registration_id: Uuid,
        amount: f64,
        currency: &str,
    ) -> Result<Payment, StoreError> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4(),
            registration_id,
            checkout_id: None,
            transaction_id: None,
            amount,
            currency: currency.to_string(),
            status: PaymentStatus::Pending,
            invoice_number: None,
            payment_date: None,
            created_at: now,
            updated_at: now,
        };
        state.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn set_payment_checkout(
        &self,
        payment_id: Uuid,
        checkout_id: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(payment) = state.payments.get_mut(&payment_id) {
            payment.checkout_id = Some(checkout_id.to_string());
            payment.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn find_payment(&self, id: Uuid) -> Result<Option<Payment>, StoreError> {
        Ok(self.state.lock().unwrap().payments.get(&id).cloned())
    }

    async fn find_payment_by_checkout(
        &self,
        checkout_id: &str,
    ) -> Result<Option<Payment>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .payments
            .values()
            .find(|p| p.checkout_id.as_deref() == Some(checkout_id))
            .cloned())
    }

    async fn find_payment_by_registration(
        &self,
        registration_id: Uuid,
    ) -> Result<Option<Payment>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .payments
            .values()
            .find(|p| p.registration_id == registration_id)
            .cloned())
    }

    async fn mark_payment_completed(
        &self,
        id: Uuid,
        transaction_id: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(payment) = state.payments.get_mut(&id) {
            payment.status = PaymentStatus::Completed;
            if let Some(txn) = transaction_id {
                payment.transaction_id = Some(txn.to_string());
            }
            payment.payment_date = Some(Utc::now());
            payment.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_payment_failed(&self, id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(payment) = state.payments.get_mut(&id) {
            payment.status = PaymentStatus::Failed;
            payment.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn count_completed_payments_in_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<i64, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .payments
            .values()
            .filter(|p| {
                p.status == PaymentStatus::Completed
                    && p.payment_date
                        .is_some_and(|d| d.year() == year && d.month() == month)
            })
            .count() as i64)
    }

    async fn set_invoice_number(
        &self,
        payment_id: Uuid,
        invoice_number: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(payment) = state.payments.get_mut(&payment_id) {
            payment.invoice_number = Some(invoice_number.to_string());
            payment.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn registrations_needing_reminder(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<RegistrationDetails>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut due = Vec::new();
        for registration in state.registrations.values() {
            if registration.status != RegistrationStatus::Confirmed || registration.reminder_sent {
                continue;
            }
            let Some(webinar) = state.webinars.get(&registration.webinar_id) else {
                continue;
            };
            if webinar.start_date < window_start || webinar.start_date >= window_end {
                continue;
            }
            let Some(user) = state.users.iter().find(|u| u.id == registration.user_id) else {
                continue;
            };
            due.push(RegistrationDetails {
                registration: registration.clone(),
                user: user.clone(),
                webinar: webinar.clone(),
            });
        }
        Ok(due)
    }

    async fn mark_reminder_sent(&self, registration_id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(registration) = state.registrations.get_mut(&registration_id) {
            registration.reminder_sent = true;
            registration.updated_at = Utc::now();
        }
        Ok(())
    }
}

/// Counting payment gateway mock.
pub struct MockGateway {
    create_calls: AtomicUsize,
    fail_create: bool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            create_calls: AtomicUsize::new(0),
            fail_create: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_create: true,
            ..Self::new()
        }
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PaymentGateway for MockGateway {
    async fn create_checkout(
        &self,
        reference: &str,
        _amount: f64,
        _description: &str,
    ) -> Result<CheckoutSession, GatewayError> {
        if self.fail_create {
            return Err(GatewayError::Request("simulated gateway outage".to_string()));
        }
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CheckoutSession {
            checkout_id: format!("chk-{n}-{reference}"),
            checkout_url: format!("https://pay.test/chk-{n}"),
        })
    }

    async fn checkout_status(
        &self,
        _checkout_id: &str,
    ) -> Result<CheckoutStatusInfo, GatewayError> {
        Ok(CheckoutStatusInfo {
            status: CheckoutStatus::Pending,
            transaction_id: None,
        })
    }
}

/// Counting meeting provider mock.
pub struct MockMeetingProvider {
    create_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    fail_create: bool,
    fail_delete: bool,
}

impl MockMeetingProvider {
    pub fn new() -> Self {
        Self {
            create_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            fail_create: false,
            fail_delete: false,
        }
    }

    pub fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Self::new()
        }
    }

    pub fn failing_delete() -> Self {
        Self {
            fail_delete: true,
            ..Self::new()
        }
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MeetingProvider for MockMeetingProvider {
    async fn create_event(&self, _request: &MeetingRequest) -> Result<MeetingEvent, MeetingError> {
        if self.fail_create {
            return Err(MeetingError::Request(
                "simulated calendar outage".to_string(),
            ));
        }
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MeetingEvent {
            event_id: format!("evt-{n}"),
            join_link: format!("https://meet.test/evt-{n}"),
        })
    }

    async fn update_event(
        &self,
        _event_id: &str,
        _request: &MeetingRequest,
    ) -> Result<(), MeetingError> {
        Ok(())
    }

    async fn delete_event(&self, _event_id: &str) -> Result<(), MeetingError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete {
            return Err(MeetingError::Request(
                "simulated calendar outage".to_string(),
            ));
        }
        Ok(())
    }
}

/// Recording mailer mock.
pub struct MockMailer {
    sent: Mutex<Vec<EmailMessage>>,
    fail: bool,
}

impl MockMailer {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last_message(&self) -> Option<EmailMessage> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl Mailer for MockMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::SendFailed("simulated SMTP outage".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}
