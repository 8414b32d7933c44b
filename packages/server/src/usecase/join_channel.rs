//! UseCase: チャンネル参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinChannelUseCase::execute() メソッド
//! - 認可ルール（自分の個人チャンネル以外への参加拒否）と参加の冪等性
//!
//! ### なぜこのテストが必要か
//! - 個人チャンネルの認可は情報漏洩（他ユーザーの存在の列挙）を防ぐ境界
//! - 拒否はエラーとして表面化させない（サイレント拒否）ことの保証
//! - 再接続時の再参加が no-op であることの保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：自分の個人チャンネル・コホートチャンネルへの参加
//! - 異常系：他ユーザーの個人チャンネル、ロール違いのチャンネルへの参加試行
//! - エッジケース：参加済みチャンネルへの再参加、解除済み接続からの参加

use std::sync::Arc;

use crate::domain::{ChannelName, CohortId, ConnectionId, ConnectionRegistry, Role, UserId};

/// A subscription request decoded from a client control message.
///
/// Mentor/student requests name the private channel they want; the
/// authorization below checks both the role and the id against the
/// connection's verified identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeRequest {
    Mentor(UserId),
    Student(UserId),
    Cohort(CohortId),
}

/// Result of a join attempt.
///
/// Rejections carry no detail on purpose: the client is never told whether
/// the channel (or the user behind it) exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Fresh membership was created
    Joined(ChannelName),
    /// The connection was already a member (idempotent re-join)
    AlreadyJoined(ChannelName),
    /// Unauthorized request or unknown connection; silently dropped
    Rejected,
}

/// チャンネル参加のユースケース
pub struct JoinChannelUseCase {
    /// Registry（共有可変状態の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
}

impl JoinChannelUseCase {
    /// 新しい JoinChannelUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// チャンネル参加を実行
    ///
    /// 認可ルール：個人チャンネル（mentor/student）は検証済み Identity の
    /// ロールと ID が完全一致する場合のみ。コホートチャンネルは認証済み
    /// 接続なら誰でも参加できる。拒否はサイレント（ログのみ）。
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        request: SubscribeRequest,
    ) -> JoinOutcome {
        let Some(identity) = self.registry.identity_of(connection_id).await else {
            tracing::debug!(
                "join rejected: connection '{}' is not registered",
                connection_id
            );
            return JoinOutcome::Rejected;
        };

        let channel = match request {
            SubscribeRequest::Mentor(target) => {
                if identity.role != Role::Mentor || identity.user_id != target {
                    tracing::debug!(
                        "join rejected: '{}' ({}) requested mentor channel of user {}",
                        identity.user_id,
                        identity.role,
                        target
                    );
                    return JoinOutcome::Rejected;
                }
                ChannelName::User(target)
            }
            SubscribeRequest::Student(target) => {
                if identity.role != Role::Student || identity.user_id != target {
                    tracing::debug!(
                        "join rejected: '{}' ({}) requested student channel of user {}",
                        identity.user_id,
                        identity.role,
                        target
                    );
                    return JoinOutcome::Rejected;
                }
                ChannelName::User(target)
            }
            SubscribeRequest::Cohort(cohort) => ChannelName::Cohort(cohort),
        };

        match self.registry.join_channel(connection_id, channel).await {
            Ok(true) => JoinOutcome::Joined(channel),
            Ok(false) => JoinOutcome::AlreadyJoined(channel),
            Err(e) => {
                // The connection raced an unregister between the identity
                // lookup and the join; treated like any other rejection.
                tracing::debug!("join rejected: {}", e);
                JoinOutcome::Rejected
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Identity, Timestamp};
    use crate::infrastructure::registry::InMemoryConnectionRegistry;
    use kakehashi_shared::time::now_millis;
    use tokio::sync::mpsc;

    fn identity(id: u64, role: Role) -> Identity {
        Identity {
            user_id: UserId::new(id).unwrap(),
            role,
            name: format!("user-{id}"),
            cohort: None,
        }
    }

    async fn connect(
        registry: &Arc<InMemoryConnectionRegistry>,
        who: Identity,
    ) -> ConnectionId {
        let (tx, _rx) = mpsc::unbounded_channel();
        // _rx is dropped; these tests only look at membership, not delivery
        registry
            .add_connection(who, tx, Timestamp::new(now_millis()))
            .await
    }

    #[tokio::test]
    async fn test_join_own_private_channel() {
        // テスト項目: 学生が自分の個人チャンネルに参加できる
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let usecase = JoinChannelUseCase::new(registry.clone());
        let id = connect(&registry, identity(5, Role::Student)).await;

        // when (操作):
        let outcome = usecase
            .execute(id, SubscribeRequest::Student(UserId::new(5).unwrap()))
            .await;

        // then (期待する結果):
        let expected = ChannelName::User(UserId::new(5).unwrap());
        assert_eq!(outcome, JoinOutcome::Joined(expected));
        assert_eq!(registry.channel_members(expected).await, vec![id]);
    }

    #[tokio::test]
    async fn test_student_cannot_join_other_mentor_channel() {
        // テスト項目: student id 5 の subscribe:mentor(7) は silent 拒否され、
        //             mentor:7 のチャンネル会員に一切現れない
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let usecase = JoinChannelUseCase::new(registry.clone());
        let id = connect(&registry, identity(5, Role::Student)).await;

        // when (操作):
        let outcome = usecase
            .execute(id, SubscribeRequest::Mentor(UserId::new(7).unwrap()))
            .await;

        // then (期待する結果):
        assert_eq!(outcome, JoinOutcome::Rejected);
        assert!(
            registry
                .channel_members(ChannelName::User(UserId::new(7).unwrap()))
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_mentor_cannot_join_other_mentor_channel() {
        // テスト項目: ロールが一致しても ID が違う個人チャンネルは拒否される
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let usecase = JoinChannelUseCase::new(registry.clone());
        let id = connect(&registry, identity(3, Role::Mentor)).await;

        // when (操作):
        let outcome = usecase
            .execute(id, SubscribeRequest::Mentor(UserId::new(7).unwrap()))
            .await;

        // then (期待する結果):
        assert_eq!(outcome, JoinOutcome::Rejected);
    }

    #[tokio::test]
    async fn test_student_cannot_claim_student_channel_of_other() {
        // テスト項目: 同ロール・別 ID の個人チャンネルも拒否される
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let usecase = JoinChannelUseCase::new(registry.clone());
        let id = connect(&registry, identity(5, Role::Student)).await;

        // when (操作):
        let outcome = usecase
            .execute(id, SubscribeRequest::Student(UserId::new(6).unwrap()))
            .await;

        // then (期待する結果):
        assert_eq!(outcome, JoinOutcome::Rejected);
    }

    #[tokio::test]
    async fn test_any_connection_can_join_cohort() {
        // テスト項目: コホートチャンネルは認証済み接続なら参加できる
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let usecase = JoinChannelUseCase::new(registry.clone());
        let id = connect(&registry, identity(5, Role::Student)).await;

        // when (操作):
        let outcome = usecase
            .execute(id, SubscribeRequest::Cohort(CohortId::new(2).unwrap()))
            .await;

        // then (期待する結果):
        assert_eq!(
            outcome,
            JoinOutcome::Joined(ChannelName::Cohort(CohortId::new(2).unwrap()))
        );
    }

    #[tokio::test]
    async fn test_rejoin_is_acknowledged_as_noop() {
        // テスト項目: 再接続時の再参加は AlreadyJoined（会員は集合のまま）
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let usecase = JoinChannelUseCase::new(registry.clone());
        let id = connect(&registry, identity(5, Role::Student)).await;
        let request = SubscribeRequest::Student(UserId::new(5).unwrap());
        usecase.execute(id, request).await;

        // when (操作):
        let outcome = usecase.execute(id, request).await;

        // then (期待する結果):
        let channel = ChannelName::User(UserId::new(5).unwrap());
        assert_eq!(outcome, JoinOutcome::AlreadyJoined(channel));
        assert_eq!(registry.channel_members(channel).await.len(), 1);
    }

    #[tokio::test]
    async fn test_join_after_unregister_is_rejected() {
        // テスト項目: 解除済み接続からの参加要求は拒否される
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let usecase = JoinChannelUseCase::new(registry.clone());
        let id = connect(&registry, identity(5, Role::Student)).await;
        registry.remove_connection(id).await;

        // when (操作):
        let outcome = usecase
            .execute(id, SubscribeRequest::Student(UserId::new(5).unwrap()))
            .await;

        // then (期待する結果):
        assert_eq!(outcome, JoinOutcome::Rejected);
    }
}
