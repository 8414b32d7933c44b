//! UseCase: 接続登録処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RegisterConnectionUseCase::execute() メソッド
//! - 認証済み接続の登録と role チャンネルへの自動参加
//!
//! ### なぜこのテストが必要か
//! - 登録直後から role 宛イベントを受信できることを保証
//! - 同一ユーザーの複数接続（複数タブ）が共存できることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：ハンドシェイク成功後の登録
//! - エッジケース：同一 Identity での 2 本目の接続

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::domain::{ChannelName, ConnectionId, ConnectionRegistry, Identity, Timestamp};
use kakehashi_shared::time::now_millis;

/// 接続登録のユースケース
///
/// 認証はハンドシェイク側（infrastructure::auth）で完了している前提。
/// 検証済み Identity を受け取り、登録と `role:<role>` への自動参加を行う。
pub struct RegisterConnectionUseCase {
    /// Registry（共有可変状態の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
}

impl RegisterConnectionUseCase {
    /// 新しい RegisterConnectionUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 接続登録を実行
    ///
    /// # Returns
    ///
    /// 接続 ID と、サーバー側で自動参加したチャンネルのリスト
    pub async fn execute(
        &self,
        identity: Identity,
        sender: UnboundedSender<String>,
    ) -> (ConnectionId, Vec<ChannelName>) {
        let role_channel = identity.role_channel();
        let connected_at = Timestamp::new(now_millis());

        let connection_id = self
            .registry
            .add_connection(identity, sender, connected_at)
            .await;

        // Auto-join the role channel; the connection was registered above so
        // this cannot miss unless it raced an unregister, which we tolerate.
        let mut joined = Vec::new();
        match self.registry.join_channel(connection_id, role_channel).await {
            Ok(_) => joined.push(role_channel),
            Err(e) => {
                tracing::warn!("auto-join of '{}' failed: {}", role_channel, e);
            }
        }

        (connection_id, joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, UserId};
    use crate::infrastructure::registry::InMemoryConnectionRegistry;
    use tokio::sync::mpsc;

    fn mentor_identity(id: u64) -> Identity {
        Identity {
            user_id: UserId::new(id).unwrap(),
            role: Role::Mentor,
            name: format!("mentor-{id}"),
            cohort: None,
        }
    }

    #[tokio::test]
    async fn test_register_auto_joins_role_channel() {
        // テスト項目: 登録時に role:<role> チャンネルへ自動参加する
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let usecase = RegisterConnectionUseCase::new(registry.clone());
        let (tx, _rx) = mpsc::unbounded_channel();

        // when (操作):
        let (connection_id, joined) = usecase.execute(mentor_identity(3), tx).await;

        // then (期待する結果):
        assert_eq!(joined, vec![ChannelName::Role(Role::Mentor)]);
        let members = registry
            .channel_members(ChannelName::Role(Role::Mentor))
            .await;
        assert_eq!(members, vec![connection_id]);
    }

    #[tokio::test]
    async fn test_register_same_identity_twice() {
        // テスト項目: 同一 Identity の 2 本目の接続（2 つ目のタブ）も登録できる
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let usecase = RegisterConnectionUseCase::new(registry.clone());
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();

        // when (操作):
        let (tab1, _) = usecase.execute(mentor_identity(3), tx1).await;
        let (tab2, _) = usecase.execute(mentor_identity(3), tx2).await;

        // then (期待する結果): 別々の接続として両方とも登録される
        assert_ne!(tab1, tab2);
        assert_eq!(registry.count_connections().await, 2);
        assert_eq!(
            registry
                .channel_members(ChannelName::Role(Role::Mentor))
                .await
                .len(),
            2
        );
    }
}
