//! Payment domain model and invoice numbering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment lifecycle status. Transitions to `completed` or `failed` happen
/// only through the payment webhook, never by client request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Completed => write!(f, "completed"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

/// A payment attempt for a priced registration (1:1 with its registration).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Payment {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub checkout_id: Option<String>,
    pub transaction_id: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub invoice_number: Option<String>,
    /// Set only on the transition to `completed`.
    pub payment_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Formats an invoice number as `INV-{year}{month:02}-{sequence:04}`.
///
/// The sequence is 1 + the count of completed payments in the calendar
/// month; computing that count and formatting here is not atomic, so two
/// simultaneous confirmations can race to the same number.
pub fn format_invoice_number(year: i32, month: u32, sequence: i64) -> String {
    format!("INV-{year}{month:02}-{sequence:04}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(PaymentStatus::Pending.to_string(), "pending");
        assert_eq!(PaymentStatus::Completed.to_string(), "completed");
        assert_eq!(PaymentStatus::Failed.to_string(), "failed");
        assert_eq!(PaymentStatus::Refunded.to_string(), "refunded");
    }

    #[test]
    fn test_invoice_number_format() {
        assert_eq!(format_invoice_number(2026, 8, 1), "INV-202608-0001");
        assert_eq!(format_invoice_number(2026, 12, 42), "INV-202612-0042");
    }

    #[test]
    fn test_invoice_number_pads_month_and_sequence() {
        assert_eq!(format_invoice_number(2026, 1, 7), "INV-202601-0007");
    }

    #[test]
    fn test_invoice_number_large_sequence() {
        assert_eq!(format_invoice_number(2026, 3, 12345), "INV-202603-12345");
    }

    #[test]
    fn test_invoice_numbers_increase_within_month() {
        let first = format_invoice_number(2026, 8, 10);
        let second = format_invoice_number(2026, 8, 11);
        assert!(second > first);
    }
}
