//! Form payloads submitted to the controllers.

use crate::error::{DeskError, Result};
use crate::models::{Bus, ComplaintStatus, FeeStatus, Student};
use crate::validation::InputValidator;

/// Inline marker on one form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Run every check and keep the failures, one marker per field.
fn collect(checks: impl IntoIterator<Item = Result<()>>) -> Vec<FieldError> {
    checks
        .into_iter()
        .filter_map(|check| match check {
            Err(DeskError::Validation { field, message }) => Some(FieldError { field, message }),
            Err(other) => Some(FieldError {
                field: "form",
                message: other.to_string(),
            }),
            Ok(()) => None,
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub bus_id: Option<String>,
    /// `None` keeps the current status, or `Paid` for a new student
    pub fee_status: Option<FeeStatus>,
}

impl StudentForm {
    #[must_use]
    pub fn validate(&self) -> Vec<FieldError> {
        collect([
            InputValidator::validate_name(&self.name),
            InputValidator::validate_email(&self.email),
            InputValidator::validate_phone(&self.phone),
        ])
    }

    /// Form prefilled from an existing student
    #[must_use]
    pub fn from_student(student: &Student) -> Self {
        Self {
            name: student.name.clone(),
            email: student.email.clone(),
            phone: student.phone.clone(),
            bus_id: student.bus_id.clone(),
            fee_status: Some(student.fee_status),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusForm {
    pub bus_number: String,
    pub route: String,
    /// Raw capacity input; empty means 0
    pub capacity: String,
    pub incharge_name: Option<String>,
}

impl BusForm {
    #[must_use]
    pub fn validate(&self) -> Vec<FieldError> {
        collect([
            InputValidator::validate_bus_number(&self.bus_number),
            InputValidator::validate_route(&self.route),
            InputValidator::parse_capacity(&self.capacity).map(|_| ()),
        ])
    }

    #[must_use]
    pub fn from_bus(bus: &Bus) -> Self {
        Self {
            bus_number: bus.bus_number.clone(),
            route: bus.route.clone(),
            capacity: if bus.capacity == 0 {
                String::new()
            } else {
                bus.capacity.to_string()
            },
            incharge_name: bus.incharge_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintForm {
    pub subject: String,
    pub description: String,
}

impl ComplaintForm {
    /// Both fields are required; each missing one gets its own marker.
    #[must_use]
    pub fn validate(&self) -> Vec<FieldError> {
        collect([
            InputValidator::validate_subject(&self.subject),
            InputValidator::validate_description(&self.description),
        ])
    }
}

/// In-charge update of a complaint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdateForm {
    pub status: ComplaintStatus,
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_form_marks_each_bad_field() {
        let form = StudentForm {
            name: "  ".to_string(),
            email: "nope".to_string(),
            ..StudentForm::default()
        };
        let fields: Vec<_> = form.validate().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "email"]);
    }

    #[test]
    fn test_bus_form_accepts_empty_capacity() {
        let form = BusForm {
            bus_number: "BUS-104".to_string(),
            route: "Ring Road".to_string(),
            ..BusForm::default()
        };
        assert!(form.validate().is_empty());
    }

    #[test]
    fn test_complaint_form_requires_both_fields() {
        assert_eq!(ComplaintForm::default().validate().len(), 2);
    }
}
