//! Shared domain enumerations aligned with the backend actor's wire values.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the order can still move to another status.
    pub fn is_open(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }
}

impl TryFrom<&str> for OrderStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    User,
    Guest,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
            UserRole::Guest => "guest",
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl TryFrom<&str> for UserRole {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(UserRole::Admin),
            "user" => Ok(UserRole::User),
            "guest" => Ok(UserRole::Guest),
            _ => Err(()),
        }
    }
}

/// Where a transcript entry originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageOrigin {
    Own,
    Remote,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_round_trips() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::try_from(status.as_str()), Ok(status));
        }
        assert!(OrderStatus::try_from("shipped").is_err());
    }

    #[test]
    fn user_role_round_trips() {
        for role in [UserRole::Admin, UserRole::User, UserRole::Guest] {
            assert_eq!(UserRole::try_from(role.as_str()), Ok(role));
        }
        assert!(UserRole::try_from("owner").is_err());
    }

    #[test]
    fn open_statuses() {
        assert!(OrderStatus::Pending.is_open());
        assert!(OrderStatus::Confirmed.is_open());
        assert!(!OrderStatus::Completed.is_open());
        assert!(!OrderStatus::Cancelled.is_open());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&OrderStatus::Cancelled).expect("serialize status");
        assert_eq!(json, "\"cancelled\"");
        let role: UserRole = serde_json::from_str("\"guest\"").expect("deserialize role");
        assert_eq!(role, UserRole::Guest);
    }
}
