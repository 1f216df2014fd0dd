//! Repository implementations for database operations.

pub mod payment;
pub mod registration;
pub mod user;
pub mod webinar;

pub use payment::PaymentRepository;
pub use registration::RegistrationRepository;
pub use user::UserRepository;
pub use webinar::WebinarRepository;
