//! Shared domain enumerations stored as plain document fields.

use serde::{Deserialize, Serialize};

/// Role stored on a user profile. Only the literal `admin` grants admin rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    #[default]
    Member,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Member => "member",
        }
    }

    /// Interpret a raw `role` field. Unknown or missing values are members.
    pub fn from_field(value: Option<&str>) -> Self {
        match value {
            Some("admin") => UserRole::Admin,
            _ => UserRole::Member,
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// Which per-user membership set a toggle or filter refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipKind {
    Liked,
    Favorites,
}

impl MembershipKind {
    /// Name of the profile field that stores this set.
    pub fn field(self) -> &'static str {
        match self {
            MembershipKind::Liked => "likedPosts",
            MembershipKind::Favorites => "favoritePosts",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_literal_admin_is_admin() {
        assert!(UserRole::from_field(Some("admin")).is_admin());
        assert!(!UserRole::from_field(Some("Admin")).is_admin());
        assert!(!UserRole::from_field(Some("editor")).is_admin());
        assert!(!UserRole::from_field(None).is_admin());
    }
}
