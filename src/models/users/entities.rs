use serde::{Deserialize, Serialize};

use crate::errors::{EvalSystemError, Result};

// 用户角色
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,  // 普通用户（学生）
    Admin, // 管理员
}

impl UserRole {
    pub const USER: &'static str = "user";
    pub const ADMIN: &'static str = "admin";
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::User => write!(f, "{}", UserRole::USER),
            UserRole::Admin => write!(f, "{}", UserRole::ADMIN),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            UserRole::USER => Ok(UserRole::User),
            UserRole::ADMIN => Ok(UserRole::Admin),
            _ => Err(format!("Invalid user role: '{s}'. Supported roles: user, admin")),
        }
    }
}

/// 身份层交给核心的调用方上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    pub role: UserRole,
}

impl Identity {
    pub fn new(user_id: i64, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn user(user_id: i64) -> Self {
        Self::new(user_id, UserRole::User)
    }

    pub fn admin(user_id: i64) -> Self {
        Self::new(user_id, UserRole::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// 仅管理员可执行的操作
    pub fn require_admin(&self, action: &str) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(EvalSystemError::authorization(format!(
                "Only administrators can {action}"
            )))
        }
    }

    /// 资源所有者或管理员可执行的操作
    pub fn require_owner_or_admin(&self, owner_id: i64, action: &str) -> Result<()> {
        if self.is_admin() || self.user_id == owner_id {
            Ok(())
        } else {
            Err(EvalSystemError::authorization(format!(
                "Only the author or an administrator can {action}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_through_strings() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!(UserRole::User.to_string(), "user");
        assert!("teacher".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_admin_guard() {
        assert!(Identity::admin(1).require_admin("approve").is_ok());
        let err = Identity::user(2).require_admin("approve").unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Forbidden);
        assert!(Identity::user(2).require_owner_or_admin(2, "edit").is_ok());
        assert!(Identity::user(3).require_owner_or_admin(2, "edit").is_err());
    }
}
