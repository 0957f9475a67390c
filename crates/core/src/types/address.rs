//! Shipping address with the validation the checkout flow depends on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Address validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    /// A required field is empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// A shipping address as submitted at checkout.
///
/// Every field except `address_line2` is required. The checkout flow
/// copies the shipping address into the billing address on submission;
/// there is no separate billing-address entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ShippingAddress {
    pub full_name: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
}

impl ShippingAddress {
    /// Check that all required fields are present and non-blank.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::MissingField` naming the first empty
    /// required field.
    pub fn validate(&self) -> Result<(), AddressError> {
        let required: [(&'static str, &str); 7] = [
            ("full_name", &self.full_name),
            ("address_line1", &self.address_line1),
            ("city", &self.city),
            ("state", &self.state),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
            ("phone", &self.phone),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AddressError::MissingField(name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Ada Lovelace".to_string(),
            address_line1: "1 Analytical Way".to_string(),
            address_line2: None,
            city: "London".to_string(),
            state: "LDN".to_string(),
            postal_code: "E1 6AN".to_string(),
            country: "GB".to_string(),
            phone: "+44 20 7946 0000".to_string(),
        }
    }

    #[test]
    fn test_complete_address_is_valid() {
        assert_eq!(complete_address().validate(), Ok(()));
    }

    #[test]
    fn test_line2_is_optional() {
        let mut address = complete_address();
        address.address_line2 = Some("Flat 4".to_string());
        assert_eq!(address.validate(), Ok(()));
    }

    #[test]
    fn test_blank_required_field_is_rejected() {
        let mut address = complete_address();
        address.postal_code = "   ".to_string();
        assert_eq!(
            address.validate(),
            Err(AddressError::MissingField("postal_code"))
        );
    }

    #[test]
    fn test_missing_phone_is_rejected() {
        let mut address = complete_address();
        address.phone = String::new();
        assert_eq!(address.validate(), Err(AddressError::MissingField("phone")));
    }
}
