//! The caller identity bound to a request by the authentication middleware.

use crate::users::User;

/// Who is making the current request.
///
/// Requests without an `Authorization` header are [`Identity::Anonymous`];
/// a valid bearer token resolves to [`Identity::User`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    User(User),
}

impl Identity {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::Anonymous => None,
            Identity::User(user) => Some(user),
        }
    }
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Identity::User(user)
    }
}
