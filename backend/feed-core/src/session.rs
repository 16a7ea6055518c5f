/// Authenticated-session context
///
/// Passed to provider construction instead of being looked up globally, so
/// callers (and tests) decide which user is acting.
use crate::models::UserId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    user_id: Option<UserId>,
}

impl SessionContext {
    /// No user signed in
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn authenticated(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }
}
