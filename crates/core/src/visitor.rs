//! Visitor descriptive payload and its validation rules.
//!
//! The payload is opaque to the state machine: it is validated once at
//! request creation and carried through untouched.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// VisitorCategory
// ---------------------------------------------------------------------------

/// Category of a visitor at the gate.
///
/// The category drives the approval timeout (see
/// [`TimeoutPolicy`](crate::timeouts::TimeoutPolicy)) but has no effect on
/// the state machine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitorCategory {
    Guest,
    Cab,
    Delivery,
    Serviceman,
}

impl VisitorCategory {
    /// Stable string form, used in storage and notification payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            VisitorCategory::Guest => "guest",
            VisitorCategory::Cab => "cab",
            VisitorCategory::Delivery => "delivery",
            VisitorCategory::Serviceman => "serviceman",
        }
    }
}

impl std::fmt::Display for VisitorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VisitorCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guest" => Ok(VisitorCategory::Guest),
            "cab" => Ok(VisitorCategory::Cab),
            "delivery" => Ok(VisitorCategory::Delivery),
            "serviceman" => Ok(VisitorCategory::Serviceman),
            other => Err(format!("unknown visitor category '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// VisitorPayload
// ---------------------------------------------------------------------------

/// Descriptive details of the visitor, immutable once the request exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct VisitorPayload {
    /// Visitor display name. Required, non-blank.
    #[validate(length(min = 1, max = 120, message = "name must be 1-120 characters"))]
    pub name: String,

    /// What kind of visitor this is (guest, cab, delivery, serviceman).
    pub category: VisitorCategory,

    /// Vehicle registration, when the visitor arrives by vehicle.
    #[validate(length(max = 20, message = "vehicle number must be at most 20 characters"))]
    pub vehicle_number: Option<String>,

    /// Employer or platform (e.g. the delivery or cab company).
    #[validate(length(max = 120, message = "company must be at most 120 characters"))]
    pub company: Option<String>,
}

impl VisitorPayload {
    /// Validate required fields, mapping failures into the domain error.
    pub fn check(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidVisitorPayload(
                "name must not be blank".to_string(),
            ));
        }
        self.validate()
            .map_err(|e| CoreError::InvalidVisitorPayload(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str) -> VisitorPayload {
        VisitorPayload {
            name: name.to_string(),
            category: VisitorCategory::Delivery,
            vehicle_number: None,
            company: Some("Zomato".to_string()),
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(payload("Ravi").check().is_ok());
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = payload("").check().unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(payload("   ").check().is_err());
    }

    #[test]
    fn overlong_vehicle_number_is_rejected() {
        let mut p = payload("Ravi");
        p.vehicle_number = Some("X".repeat(21));
        assert!(p.check().is_err());
    }

    #[test]
    fn category_round_trips_through_string_form() {
        for cat in [
            VisitorCategory::Guest,
            VisitorCategory::Cab,
            VisitorCategory::Delivery,
            VisitorCategory::Serviceman,
        ] {
            assert_eq!(cat.as_str().parse::<VisitorCategory>(), Ok(cat));
        }
        assert!("drone".parse::<VisitorCategory>().is_err());
    }
}
