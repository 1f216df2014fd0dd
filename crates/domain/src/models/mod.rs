//! Domain models and request/response DTOs.

pub mod payment;
pub mod registration;
pub mod user;
pub mod webinar;

pub use payment::{format_invoice_number, Payment, PaymentStatus};
pub use registration::{Registration, RegistrationDetails, RegistrationStatus};
pub use user::{RegistrantInfo, User};
pub use webinar::{Webinar, WebinarStatus};
