//! Check-in and redemption codes.
//!
//! Both codes are short decimal strings handed to a client over a text
//! message and typed back in person. They are stored and transmitted as
//! strings so leading zeros survive the round trip.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of digits in an appointment confirmation code
pub const CONFIRMATION_CODE_DIGITS: usize = 4;

/// Number of digits in a redemption validation code
pub const VALIDATION_CODE_DIGITS: usize = 6;

/// A 4-digit appointment check-in code, generated for online bookings
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfirmationCode(String);

impl ConfirmationCode {
    /// Draws a uniform random 4-digit code
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(format!("{:04}", rng.gen_range(0..10_000_u32)))
    }

    /// Wraps an existing code string; `None` unless it is exactly 4
    /// decimal digits
    #[must_use]
    pub fn new(code: &str) -> Option<Self> {
        (code.len() == CONFIRMATION_CODE_DIGITS && code.bytes().all(|b| b.is_ascii_digit()))
            .then(|| Self(code.to_string()))
    }

    /// Compares a client-submitted code against this one
    #[must_use]
    pub fn matches(&self, submitted: &str) -> bool {
        self.0 == submitted
    }

    /// Returns the code as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfirmationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 6-digit redemption validation code, presented in person.
///
/// Collisions against other outstanding codes are not checked; at shop
/// volume the 1-in-a-million space is acceptable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationCode(String);

impl ValidationCode {
    /// Draws a uniform random 6-digit code
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(format!("{:06}", rng.gen_range(0..1_000_000_u32)))
    }

    /// Wraps an existing code string; `None` unless it is exactly 6
    /// decimal digits
    #[must_use]
    pub fn new(code: &str) -> Option<Self> {
        (code.len() == VALIDATION_CODE_DIGITS && code.bytes().all(|b| b.is_ascii_digit()))
            .then(|| Self(code.to_string()))
    }

    /// Compares a client-submitted code against this one
    #[must_use]
    pub fn matches(&self, submitted: &str) -> bool {
        self.0 == submitted
    }

    /// Returns the code as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn generated_codes_have_fixed_width() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let confirmation = ConfirmationCode::generate(&mut rng);
            assert_eq!(confirmation.as_str().len(), CONFIRMATION_CODE_DIGITS);
            assert!(confirmation.as_str().bytes().all(|b| b.is_ascii_digit()));

            let validation = ValidationCode::generate(&mut rng);
            assert_eq!(validation.as_str().len(), VALIDATION_CODE_DIGITS);
            assert!(validation.as_str().bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn leading_zeros_are_preserved() {
        let mut rng = StepRng::new(0, 0);
        let code = ConfirmationCode::generate(&mut rng);
        assert_eq!(code.as_str(), "0000");
        assert!(code.matches("0000"));
        assert!(!code.matches("0"));
    }

    #[test]
    fn new_rejects_malformed_codes() {
        assert!(ConfirmationCode::new("0420").is_some());
        assert!(ConfirmationCode::new("042").is_none());
        assert!(ConfirmationCode::new("04201").is_none());
        assert!(ConfirmationCode::new("o420").is_none());

        assert!(ValidationCode::new("000123").is_some());
        assert!(ValidationCode::new("00123").is_none());
        assert!(ValidationCode::new("1234567").is_none());
        assert!(ValidationCode::new("12e456").is_none());
    }

    #[test]
    fn matches_is_exact_string_equality() {
        let code = ValidationCode::new("004210").unwrap();
        assert!(code.matches("004210"));
        assert!(!code.matches("4210"));
        assert!(!code.matches("004211"));
    }
}
