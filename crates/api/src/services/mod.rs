//! Application services: external-service clients and the registration
//! workflow.

pub mod calendar;
pub mod email;
pub mod invoice;
pub mod registration;
pub mod sumup;
pub mod webhook;

#[cfg(test)]
pub mod testing;

pub use registration::{RegistrationOutcome, RegistrationService, WorkflowError};
pub use webhook::{PaymentWebhookService, WebhookError};
