//! Input checks run before anything is sent to the server.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::models::OrderDraft;

/// Country prefix prepended to national phone numbers.
pub const COUNTRY_PREFIX: &str = "+91";

pub const OTP_LENGTH: usize = 6;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Phone number is required")]
    PhoneRequired,

    #[error("Invalid Indian mobile number")]
    PhoneInvalid,

    #[error("Please enter the complete OTP")]
    OtpIncomplete,

    #[error("Please fill in all required fields")]
    OrderIncomplete(OrderDraftErrors),
}

/// Per-field messages for the order form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderDraftErrors {
    pub doctor: Option<String>,
    pub patient: Option<String>,
    pub hospital: Option<String>,
    pub image: Option<String>,
}

impl OrderDraftErrors {
    pub fn is_empty(&self) -> bool {
        self.doctor.is_none()
            && self.patient.is_none()
            && self.hospital.is_none()
            && self.image.is_none()
    }
}

lazy_static! {
    /// Ten digits, starting 6-9.
    static ref INDIAN_MOBILE_REGEX: Regex = Regex::new(r"^[6-9][0-9]{9}$").unwrap();
}

/// Validate a 10-digit national mobile number (no country prefix).
pub fn validate_phone(national: &str) -> Result<(), ValidationError> {
    if national.is_empty() {
        return Err(ValidationError::PhoneRequired);
    }
    if !INDIAN_MOBILE_REGEX.is_match(national) {
        return Err(ValidationError::PhoneInvalid);
    }
    Ok(())
}

/// Validate and prefix a national number, e.g. `9876543210` → `+919876543210`.
pub fn to_international(national: &str) -> Result<String, ValidationError> {
    validate_phone(national)?;
    Ok(format!("{}{}", COUNTRY_PREFIX, national))
}

/// An OTP is complete when it is exactly six ASCII digits.
pub fn validate_otp(code: &str) -> Result<(), ValidationError> {
    if code.len() == OTP_LENGTH && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::OtpIncomplete)
    }
}

impl OrderDraft {
    /// Check the required fields of the order form.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = |value: &str, message: &str| {
            value.trim().is_empty().then(|| message.to_string())
        };

        let errors = OrderDraftErrors {
            doctor: required(&self.doctor_name, "Doctor's name is required"),
            patient: required(&self.patient_name, "Patient name is required"),
            hospital: required(&self.hospital_address, "Hospital address is required"),
            image: self
                .prescription_urls
                .iter()
                .all(|u| u.trim().is_empty())
                .then(|| "Prescription photo is required".to_string()),
        };

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::OrderIncomplete(errors))
        }
    }
}
