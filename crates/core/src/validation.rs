//! Validation of the create/edit dialog forms.
//!
//! Forms are checked client-side before submission so that obvious mistakes
//! are reported next to the offending input without a server round-trip.
//! Server-side 422 responses are mapped onto the same [`FieldErrors`] shape
//! by `console-client`.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::CoreError;
use crate::permissions::{is_valid_code, CODE_RE};
use crate::roles::is_valid_scope;
use crate::types::{DbId, FieldErrors};
use crate::user::VALID_STATUSES;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const ORGANIZATION_STATUSES: &[&str] = &["active", "inactive", "trial", "suspended"];

pub const CLIENT_STATUSES: &[&str] = &["active", "inactive"];

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("valid regex"));

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid regex"));

static ROLE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserForm {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(
        length(min = 3, max = 50, message = "Username must be 3 to 50 characters"),
        regex(path = *USERNAME_RE, message = "Username may only contain letters, digits, '.', '_' and '-'")
    )]
    pub username: String,
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub password_confirmation: String,
    #[validate(length(min = 1, message = "Select a role"))]
    pub role: String,
    #[validate(custom(function = "validate_user_status"))]
    pub status: String,
    pub organization_id: Option<DbId>,
    #[serde(default)]
    #[validate(custom(function = "validate_permission_codes"))]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_password_change"))]
pub struct UpdateUserForm {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(
        length(min = 3, max = 50, message = "Username must be 3 to 50 characters"),
        regex(path = *USERNAME_RE, message = "Username may only contain letters, digits, '.', '_' and '-'")
    )]
    pub username: String,
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    /// Left empty to keep the current password.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<String>,
    #[validate(length(min = 1, message = "Select a role"))]
    pub role: String,
    #[validate(custom(function = "validate_user_status"))]
    pub status: String,
    pub organization_id: Option<DbId>,
    #[serde(default)]
    #[validate(custom(function = "validate_permission_codes"))]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrganizationForm {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: String,
    #[validate(regex(path = *SLUG_RE, message = "Slug may only contain lowercase letters, digits and single dashes"))]
    pub slug: String,
    #[validate(custom(function = "validate_organization_status"))]
    pub status: String,
    pub plan: Option<String>,
    #[validate(email(message = "Enter a valid billing email address"))]
    pub billing_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RoleForm {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: String,
    #[validate(regex(path = *ROLE_CODE_RE, message = "Code must be lowercase snake_case"))]
    pub code: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_permission_codes"))]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PermissionForm {
    #[validate(regex(path = *CODE_RE, message = "Code must look like 'module.action'"))]
    pub code: String,
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: String,
    #[validate(length(max = 50))]
    pub module: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClientForm {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(max = 150))]
    pub company: Option<String>,
    #[validate(custom(function = "validate_client_status"))]
    pub status: String,
    pub organization_id: Option<DbId>,
}

/// Assign a role to a user, with the pivot attributes.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RoleAssignmentForm {
    pub role_id: DbId,
    #[validate(custom(function = "validate_scope"))]
    pub scope: String,
    #[serde(default)]
    pub is_primary: bool,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Validate a form, collecting every failing field.
pub fn validate_form<T: Validate>(form: &T) -> Result<(), CoreError> {
    form.validate()
        .map_err(|errors| CoreError::InvalidFields(field_errors(&errors)))
}

/// Flatten validator output into field -> messages. Rules without a
/// message fall back to their code.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages = errors
                .iter()
                .map(|error| match &error.message {
                    Some(message) => message.to_string(),
                    None => error.code.to_string(),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Custom rules
// ---------------------------------------------------------------------------

fn one_of(value: &str, allowed: &[&str], code: &'static str) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        let mut error = ValidationError::new(code);
        error.message = Some(Cow::Owned(format!(
            "Must be one of: {}",
            allowed.join(", ")
        )));
        Err(error)
    }
}

fn validate_user_status(status: &str) -> Result<(), ValidationError> {
    one_of(status, VALID_STATUSES, "status")
}

fn validate_organization_status(status: &str) -> Result<(), ValidationError> {
    one_of(status, ORGANIZATION_STATUSES, "status")
}

fn validate_client_status(status: &str) -> Result<(), ValidationError> {
    one_of(status, CLIENT_STATUSES, "status")
}

fn validate_scope(scope: &str) -> Result<(), ValidationError> {
    if is_valid_scope(scope) {
        Ok(())
    } else {
        Err(ValidationError::new("scope").with_message(Cow::Borrowed("Unknown role scope")))
    }
}

fn validate_permission_codes(codes: &[String]) -> Result<(), ValidationError> {
    match codes.iter().find(|code| !is_valid_code(code)) {
        None => Ok(()),
        Some(bad) => Err(ValidationError::new("permission_code")
            .with_message(Cow::Owned(format!("'{bad}' is not a valid permission code")))),
    }
}

fn validate_password_change(form: &UpdateUserForm) -> Result<(), ValidationError> {
    if form.password.is_some() && form.password != form.password_confirmation {
        return Err(ValidationError::new("password_confirmation")
            .with_message(Cow::Borrowed("Passwords do not match")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn create_form() -> CreateUserForm {
        CreateUserForm {
            email: "ada@example.com".into(),
            username: "ada.lovelace".into(),
            first_name: Some("Ada".into()),
            last_name: None,
            password: "correct horse".into(),
            password_confirmation: "correct horse".into(),
            role: "member".into(),
            status: "active".into(),
            organization_id: Some(1),
            permissions: vec!["users.view".into()],
        }
    }

    #[test]
    fn valid_create_form_passes() {
        assert!(validate_form(&create_form()).is_ok());
    }

    #[test]
    fn create_form_reports_each_bad_field() {
        let mut form = create_form();
        form.email = "not-an-email".into();
        form.password_confirmation = "different".into();
        form.status = "banned".into();
        form.permissions.push("Users".into());

        let errors = match validate_form(&form) {
            Err(CoreError::InvalidFields(errors)) => errors,
            other => panic!("expected field errors, got {other:?}"),
        };

        assert_eq!(errors["email"], vec!["Enter a valid email address"]);
        assert_eq!(errors["password_confirmation"], vec!["Passwords do not match"]);
        assert!(errors["status"][0].contains("active"));
        assert!(errors["permissions"][0].contains("'Users'"));
        assert!(!errors.contains_key("username"));
    }

    #[test]
    fn short_username_rejected() {
        let mut form = create_form();
        form.username = "ab".into();
        assert_matches!(validate_form(&form), Err(CoreError::InvalidFields(e)) if e.contains_key("username"));
    }

    #[test]
    fn update_form_without_password_passes() {
        let form = UpdateUserForm {
            email: "ada@example.com".into(),
            username: "ada".into(),
            first_name: None,
            last_name: None,
            password: None,
            password_confirmation: None,
            role: "member".into(),
            status: "inactive".into(),
            organization_id: None,
            permissions: Vec::new(),
        };
        assert!(validate_form(&form).is_ok());

        let changed = UpdateUserForm {
            password: Some("new password".into()),
            password_confirmation: Some("other".into()),
            ..form
        };
        assert!(validate_form(&changed).is_err());
    }

    #[test]
    fn organization_slug_format() {
        let form = OrganizationForm {
            name: "Acme".into(),
            slug: "Acme Corp".into(),
            status: "trial".into(),
            plan: None,
            billing_email: None,
        };
        assert_matches!(validate_form(&form), Err(CoreError::InvalidFields(e)) if e.contains_key("slug"));
    }

    #[test]
    fn permission_form_code_format() {
        let ok = PermissionForm {
            code: "billing.refund".into(),
            name: "Refund".into(),
            module: Some("billing".into()),
        };
        assert!(validate_form(&ok).is_ok());

        let bad = PermissionForm {
            code: "refund".into(),
            ..ok
        };
        assert!(validate_form(&bad).is_err());
    }

    #[test]
    fn role_form_code_and_permissions() {
        let form = RoleForm {
            name: "Support".into(),
            code: "support-team".into(),
            description: None,
            permissions: vec!["clients.view".into()],
        };
        assert_matches!(validate_form(&form), Err(CoreError::InvalidFields(e)) if e.contains_key("code"));
    }

    #[test]
    fn client_and_assignment_forms() {
        let client = ClientForm {
            name: "Widget Inc".into(),
            email: "ops@widget.test".into(),
            company: None,
            status: "archived".into(),
            organization_id: None,
        };
        assert!(validate_form(&client).is_err());

        let assignment = RoleAssignmentForm {
            role_id: 3,
            scope: "organization".into(),
            is_primary: true,
        };
        assert!(validate_form(&assignment).is_ok());

        let bad_scope = RoleAssignmentForm {
            scope: "planet".into(),
            ..assignment
        };
        assert!(validate_form(&bad_scope).is_err());
    }
}
