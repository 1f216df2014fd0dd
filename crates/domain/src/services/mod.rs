//! Service traits at the system's seams.
//!
//! The registration workflow, webhook handler and reminder sweep depend on
//! these traits rather than on concrete clients, so every external
//! collaborator is an explicitly constructed, injected object.

pub mod gateway;
pub mod mailer;
pub mod meeting;
pub mod store;

pub use gateway::{CheckoutSession, CheckoutStatus, CheckoutStatusInfo, GatewayError, PaymentGateway};
pub use mailer::{EmailAttachment, EmailMessage, MailError, Mailer};
pub use meeting::{MeetingError, MeetingEvent, MeetingProvider, MeetingRequest};
pub use store::{RegistrationStore, StoreError};
