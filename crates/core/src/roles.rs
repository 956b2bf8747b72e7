//! Scopes stored on the user/role pivot.

/// Platform-wide assignment.
pub const SCOPE_GLOBAL: &str = "global";

/// Assignment bound to the user's organization.
pub const SCOPE_ORGANIZATION: &str = "organization";

pub const VALID_SCOPES: &[&str] = &[SCOPE_GLOBAL, SCOPE_ORGANIZATION];

pub fn is_valid_scope(scope: &str) -> bool {
    VALID_SCOPES.contains(&scope)
}
