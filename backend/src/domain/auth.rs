//! Authenticated caller attached to a request by the authentication layer.

/// Caller identity as seen by the audit trail.
///
/// The service never authenticates requests itself; an outer layer inserts
/// this value into the request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Login name.
    pub username: String,
    /// Human-readable name.
    pub display_name: String,
    /// Contact address.
    pub email: String,
}

impl AuthUser {
    /// Label stored in audit records: `"<display name> <email>"`.
    ///
    /// # Examples
    /// ```
    /// use account_service::domain::AuthUser;
    ///
    /// let user = AuthUser {
    ///     username: "ada".into(),
    ///     display_name: "Ada Lovelace".into(),
    ///     email: "ada@example.com".into(),
    /// };
    /// assert_eq!(user.audit_label(), "Ada Lovelace ada@example.com");
    /// ```
    pub fn audit_label(&self) -> String {
        format!("{} {}", self.display_name, self.email)
    }
}
