//! Entity definitions (database row mappings).

pub mod payment;
pub mod registration;
pub mod user;
pub mod webinar;

pub use payment::{PaymentEntity, PaymentStatusDb};
pub use registration::{RegistrationDetailsEntity, RegistrationEntity, RegistrationStatusDb};
pub use user::UserEntity;
pub use webinar::{WebinarEntity, WebinarStatusDb};
