//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ValueObjectError;

/// User identifier value object.
///
/// Represents the portal-wide numeric id of a student or mentor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(u64);

impl UserId {
    /// Create a new UserId.
    ///
    /// # Returns
    ///
    /// A Result containing the UserId or an error if validation fails
    pub fn new(id: u64) -> Result<Self, ValueObjectError> {
        if id == 0 {
            return Err(ValueObjectError::UserIdZero);
        }
        Ok(Self(id))
    }

    /// Get the inner numeric value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cohort identifier value object.
///
/// A cohort is a group of students taught together; cohort channels carry
/// schedule and quiz updates shared by the whole group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CohortId(u64);

impl CohortId {
    /// Create a new CohortId.
    pub fn new(id: u64) -> Result<Self, ValueObjectError> {
        if id == 0 {
            return Err(ValueObjectError::CohortIdZero);
        }
        Ok(Self(id))
    }

    /// Get the inner numeric value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CohortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of an authenticated portal user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Mentor,
}

impl Role {
    /// Get the wire representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Mentor => "mentor",
        }
    }

    /// Parse a role from its wire representation.
    pub fn parse(s: &str) -> Result<Self, ValueObjectError> {
        match s {
            "student" => Ok(Role::Student),
            "mentor" => Ok(Role::Mentor),
            other => Err(ValueObjectError::RoleUnknown(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Connection identifier value object.
///
/// Identifies one live transport, not one user: a user with two browser tabs
/// holds two ConnectionIds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Generate a fresh random connection id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of an interest channel.
///
/// Channels group live connections sharing a delivery interest. They exist
/// only while at least one connection is joined (lazy creation, GC on empty).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelName {
    /// All connections of one role: `role:student` / `role:mentor`
    Role(Role),
    /// One user's private channel (all of their tabs): `user:<id>`
    User(UserId),
    /// One cohort's shared channel: `cohort:<id>`
    Cohort(CohortId),
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelName::Role(role) => write!(f, "role:{}", role),
            ChannelName::User(id) => write!(f, "user:{}", id),
            ChannelName::Cohort(id) => write!(f, "cohort:{}", id),
        }
    }
}

/// Verified identity attached to a live connection.
///
/// Produced by the credential verifier during the handshake; the rest of the
/// subsystem trusts it without re-checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
    pub name: String,
    pub cohort: Option<CohortId>,
}

impl Identity {
    /// The private channel this identity owns.
    pub fn private_channel(&self) -> ChannelName {
        ChannelName::User(self.user_id)
    }

    /// The role-wide channel every connection of this identity auto-joins.
    pub fn role_channel(&self) -> ChannelName {
        ChannelName::Role(self.role)
    }
}

/// Timestamp value object.
///
/// Represents a Unix timestamp in milliseconds (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a new Timestamp from a millisecond Unix timestamp.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the inner i64 value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_new_success() {
        // テスト項目: 有効なユーザー ID を作成できる
        // when (操作):
        let result = UserId::new(5);

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(result.unwrap().value(), 5);
    }

    #[test]
    fn test_user_id_new_zero_fails() {
        // テスト項目: 0 のユーザー ID は作成できない
        // when (操作):
        let result = UserId::new(0);

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), ValueObjectError::UserIdZero);
    }

    #[test]
    fn test_cohort_id_new_zero_fails() {
        // テスト項目: 0 のコホート ID は作成できない
        // when (操作):
        let result = CohortId::new(0);

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), ValueObjectError::CohortIdZero);
    }

    #[test]
    fn test_role_parse() {
        // テスト項目: ロール文字列のパースと未知ロールのエラー
        // then (期待する結果):
        assert_eq!(Role::parse("student").unwrap(), Role::Student);
        assert_eq!(Role::parse("mentor").unwrap(), Role::Mentor);
        assert_eq!(
            Role::parse("admin").unwrap_err(),
            ValueObjectError::RoleUnknown("admin".to_string())
        );
    }

    #[test]
    fn test_connection_id_uniqueness() {
        // テスト項目: ConnectionId::generate() は毎回異なる ID を生成する
        // when (操作):
        let id1 = ConnectionId::generate();
        let id2 = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_channel_name_display() {
        // テスト項目: チャンネル名がワイヤ表記の文字列になる
        // given (前提条件):
        let user = UserId::new(5).unwrap();
        let cohort = CohortId::new(2).unwrap();

        // then (期待する結果):
        assert_eq!(ChannelName::Role(Role::Mentor).to_string(), "role:mentor");
        assert_eq!(ChannelName::User(user).to_string(), "user:5");
        assert_eq!(ChannelName::Cohort(cohort).to_string(), "cohort:2");
    }

    #[test]
    fn test_identity_channels() {
        // テスト項目: Identity から自分のチャンネルが導出できる
        // given (前提条件):
        let identity = Identity {
            user_id: UserId::new(3).unwrap(),
            role: Role::Mentor,
            name: "anzai".to_string(),
            cohort: None,
        };

        // then (期待する結果):
        assert_eq!(
            identity.private_channel(),
            ChannelName::User(UserId::new(3).unwrap())
        );
        assert_eq!(identity.role_channel(), ChannelName::Role(Role::Mentor));
    }

    #[test]
    fn test_timestamp_ordering() {
        // テスト項目: タイムスタンプは順序付けできる
        // given (前提条件):
        let ts1 = Timestamp::new(1000);
        let ts2 = Timestamp::new(2000);

        // then (期待する結果):
        assert!(ts1 < ts2);
        assert!(ts2 > ts1);
    }
}
