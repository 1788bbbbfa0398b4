//! The client checkout step machine: shipping -> payment -> confirmation,
//! with backward steps allowed. Each forward step is gated by field
//! validation only; no payment network is contacted and card details are
//! never persisted.

use serde::Deserialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::{error::AppError, models::Address};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStep {
    Shipping,
    Payment,
    Confirmation,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("Please fill in all required shipping fields")]
    MissingShippingFields,

    #[error("Please fill in all required payment fields")]
    MissingPaymentFields,

    #[error("Invalid card number")]
    InvalidCardNumber,

    #[error("Invalid CVV")]
    InvalidCvv,

    #[error("Not valid at this checkout step")]
    WrongStep,
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Card entry as typed by the customer. Only the number and CVV lengths are
/// checked; there is no checksum and no authorization.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PaymentDetails {
    pub card_number: String,
    pub card_name: String,
    pub expiry_date: String,
    pub cvv: String,
}

pub fn validate_shipping(address: &Address) -> Result<(), CheckoutError> {
    let required = [
        &address.full_name,
        &address.street,
        &address.city,
        &address.state,
        &address.postal_code,
        &address.country,
    ];
    if required.iter().any(|f| f.trim().is_empty()) {
        return Err(CheckoutError::MissingShippingFields);
    }
    Ok(())
}

pub fn validate_payment(payment: &PaymentDetails) -> Result<(), CheckoutError> {
    let required = [
        &payment.card_number,
        &payment.card_name,
        &payment.expiry_date,
        &payment.cvv,
    ];
    if required.iter().any(|f| f.trim().is_empty()) {
        return Err(CheckoutError::MissingPaymentFields);
    }

    let digits: String = payment
        .card_number
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if digits.len() != 16 {
        return Err(CheckoutError::InvalidCardNumber);
    }

    if payment.cvv.len() < 3 || payment.cvv.len() > 4 {
        return Err(CheckoutError::InvalidCvv);
    }

    Ok(())
}

#[derive(Debug)]
pub struct CheckoutFlow {
    step: CheckoutStep,
}

impl Default for CheckoutFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutFlow {
    pub fn new() -> Self {
        Self {
            step: CheckoutStep::Shipping,
        }
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    /// Validates the address and advances shipping -> payment.
    pub fn submit_shipping(&mut self, address: &Address) -> Result<(), CheckoutError> {
        if self.step != CheckoutStep::Shipping {
            return Err(CheckoutError::WrongStep);
        }
        validate_shipping(address)?;
        self.step = CheckoutStep::Payment;
        Ok(())
    }

    /// Validates the card entry and advances payment -> confirmation.
    pub fn submit_payment(&mut self, payment: &PaymentDetails) -> Result<(), CheckoutError> {
        if self.step != CheckoutStep::Payment {
            return Err(CheckoutError::WrongStep);
        }
        validate_payment(payment)?;
        self.step = CheckoutStep::Confirmation;
        Ok(())
    }

    /// Steps backward; returns false when already at the first step.
    pub fn back(&mut self) -> bool {
        match self.step {
            CheckoutStep::Shipping => false,
            CheckoutStep::Payment => {
                self.step = CheckoutStep::Shipping;
                true
            }
            CheckoutStep::Confirmation => {
                self.step = CheckoutStep::Payment;
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address {
            full_name: "Jane Doe".into(),
            street: "1 Main St".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            postal_code: "62701".into(),
            country: "USA".into(),
            phone: None,
        }
    }

    fn payment() -> PaymentDetails {
        PaymentDetails {
            card_number: "4242 4242 4242 4242".into(),
            card_name: "Jane Doe".into(),
            expiry_date: "12/30".into(),
            cvv: "123".into(),
        }
    }

    #[test]
    fn walks_forward_through_all_three_steps() {
        let mut flow = CheckoutFlow::new();
        assert_eq!(flow.step(), CheckoutStep::Shipping);

        flow.submit_shipping(&address()).unwrap();
        assert_eq!(flow.step(), CheckoutStep::Payment);

        flow.submit_payment(&payment()).unwrap();
        assert_eq!(flow.step(), CheckoutStep::Confirmation);
    }

    #[test]
    fn backward_transitions_are_allowed() {
        let mut flow = CheckoutFlow::new();
        flow.submit_shipping(&address()).unwrap();
        flow.submit_payment(&payment()).unwrap();

        assert!(flow.back());
        assert_eq!(flow.step(), CheckoutStep::Payment);
        assert!(flow.back());
        assert_eq!(flow.step(), CheckoutStep::Shipping);
        assert!(!flow.back());
    }

    #[test]
    fn cannot_skip_the_shipping_step() {
        let mut flow = CheckoutFlow::new();
        assert_eq!(
            flow.submit_payment(&payment()),
            Err(CheckoutError::WrongStep)
        );
    }

    #[test]
    fn missing_shipping_fields_block_the_step() {
        let mut incomplete = address();
        incomplete.city = "  ".into();

        let mut flow = CheckoutFlow::new();
        assert_eq!(
            flow.submit_shipping(&incomplete),
            Err(CheckoutError::MissingShippingFields)
        );
        assert_eq!(flow.step(), CheckoutStep::Shipping);
    }

    #[test]
    fn card_number_must_have_sixteen_digits() {
        let mut bad = payment();
        bad.card_number = "4242 4242".into();
        assert_eq!(validate_payment(&bad), Err(CheckoutError::InvalidCardNumber));

        // Whitespace inside the number is ignored.
        assert!(validate_payment(&payment()).is_ok());
    }

    #[test]
    fn cvv_must_be_three_or_four_digits() {
        let mut bad = payment();
        bad.cvv = "12".into();
        assert_eq!(validate_payment(&bad), Err(CheckoutError::InvalidCvv));

        bad.cvv = "12345".into();
        assert_eq!(validate_payment(&bad), Err(CheckoutError::InvalidCvv));

        bad.cvv = "1234".into();
        assert!(validate_payment(&bad).is_ok());
    }
}
