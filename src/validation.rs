use crate::error::{DeskError, Result};

/// Field-level checks for the dashboard forms
///
/// Every failure is a [`DeskError::Validation`] naming the offending field,
/// which the controllers turn into an inline marker.
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

/// Shortest password the registration form accepts
pub const MIN_PASSWORD_LEN: usize = 6;

impl InputValidator {
    fn required(field: &'static str, value: &str, label: &str, max: usize) -> Result<()> {
        if value.trim().is_empty() {
            return Err(DeskError::validation(field, format!("{label} is required")));
        }
        if value.chars().count() > max {
            return Err(DeskError::validation(
                field,
                format!("{label} too long (max {max} characters)"),
            ));
        }
        Ok(())
    }

    /// Validate a person's name
    pub fn validate_name(name: &str) -> Result<()> {
        Self::required("name", name, "Name", 100)?;

        if name.contains('\0') || name.contains('\r') || name.contains('\n') {
            return Err(DeskError::validation("name", "Name contains invalid characters"));
        }

        Ok(())
    }

    /// Validate phone number format; an empty phone is allowed
    pub fn validate_phone(phone: &str) -> Result<()> {
        if phone.trim().is_empty() {
            return Ok(());
        }

        let cleaned = phone
            .chars()
            .filter(|c| {
                c.is_ascii_digit() || *c == '+' || *c == '-' || *c == '(' || *c == ')' || *c == ' '
            })
            .collect::<String>();
        if cleaned.len() != phone.len() {
            return Err(DeskError::validation("phone", "Phone number contains invalid characters"));
        }

        let digits_only = cleaned.chars().filter(char::is_ascii_digit).count();
        if !(7..=15).contains(&digits_only) {
            return Err(DeskError::validation(
                "phone",
                "Phone number must be between 7 and 15 digits",
            ));
        }

        Ok(())
    }

    /// Validate email format
    pub fn validate_email(email: &str) -> Result<()> {
        Self::required("email", email, "Email", 254)?;

        let parts: Vec<&str> = email.trim().split('@').collect();
        if parts.len() != 2 {
            return Err(DeskError::validation("email", "Email must have exactly one @ symbol"));
        }

        let local_part = parts[0];
        let domain_part = parts[1];

        if local_part.is_empty() || local_part.len() > 64 {
            return Err(DeskError::validation("email", "Email local part invalid"));
        }

        if domain_part.is_empty() || !domain_part.contains('.') {
            return Err(DeskError::validation("email", "Email domain invalid"));
        }

        Ok(())
    }

    pub fn validate_bus_number(bus_number: &str) -> Result<()> {
        Self::required("bus_number", bus_number, "Bus number", 20)
    }

    pub fn validate_route(route: &str) -> Result<()> {
        Self::required("route", route, "Route", 200)
    }

    /// Parse a capacity field. Empty input means 0, as the bus form treats it.
    pub fn parse_capacity(raw: &str) -> Result<u32> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(0);
        }
        raw.parse::<u32>()
            .map_err(|_| DeskError::validation("capacity", "Capacity must be a whole number"))
    }

    pub fn validate_subject(subject: &str) -> Result<()> {
        Self::required("subject", subject, "Subject", 200)
    }

    pub fn validate_description(description: &str) -> Result<()> {
        Self::required("description", description, "Description", 2000)
    }

    /// Notification body
    pub fn validate_message(message: &str) -> Result<()> {
        Self::required("message", message, "Message", 1000)
    }

    /// Manually typed attendance code
    pub fn validate_attendance_code(code: &str) -> Result<()> {
        Self::required("code", code, "Attendance code", 200)
    }

    /// Validate a new password and its confirmation
    pub fn validate_password(password: &str, confirm: &str) -> Result<()> {
        if password != confirm {
            return Err(DeskError::validation("confirm_password", "Passwords do not match!"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DeskError::validation(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters long!"),
            ));
        }
        Ok(())
    }

    /// Sanitize text input
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t' || *c == '\r')
            .collect::<String>()
            .trim()
            .to_string()
    }
}
