//! UseCase: 接続解除処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - UnregisterConnectionUseCase::execute() メソッド
//! - 接続の解除と全チャンネルからの退出
//!
//! ### なぜこのテストが必要か
//! - transport エラーと明示 close の両方から呼ばれるため、冪等性が必須
//! - 解除後の接続に配信されないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：切断時の解除
//! - エッジケース：二重解除、未登録 ID の解除

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry};

/// 接続解除のユースケース
pub struct UnregisterConnectionUseCase {
    /// Registry（共有可変状態の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
}

impl UnregisterConnectionUseCase {
    /// 新しい UnregisterConnectionUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 接続解除を実行（冪等）
    pub async fn execute(&self, connection_id: ConnectionId) {
        self.registry.remove_connection(connection_id).await;
    }

    /// 残りの接続数を取得
    pub async fn count_remaining_connections(&self) -> usize {
        self.registry.count_connections().await
    }
}
