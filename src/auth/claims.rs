use serde::{Deserialize, Serialize};

use crate::users::repo_types::{Role, User};

/// Identity carried by an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for SessionClaims {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// `user` object of a token as decoded; presence is checked by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUser {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

#[cfg(test)]
impl TokenUser {
    /// The full claim set, when every field is present.
    pub fn session(&self) -> Option<SessionClaims> {
        Some(SessionClaims {
            id: self.id?,
            name: self.name.clone()?,
            email: self.email.clone()?,
            role: self.role?,
        })
    }
}

impl From<&SessionClaims> for TokenUser {
    fn from(session: &SessionClaims) -> Self {
        Self {
            id: Some(session.id),
            name: Some(session.name.clone()),
            email: Some(session.email.clone()),
            role: Some(session.role),
        }
    }
}

/// JWT payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user: TokenUser,
    pub iat: usize, // issued at (unix timestamp)
    pub exp: usize, // expires at (unix timestamp)
    pub iss: String,
    pub aud: String,
}
