//! UseCase: イベント配信処理（Event Dispatcher）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DispatchEventUseCase::emit() / dispatch() メソッド
//! - ターゲット解決（ルーティングテーブル）と live 接続へのファンアウト
//!
//! ### なぜこのテストが必要か
//! - REST ハンドラのコミット後に呼ばれるため、配信失敗を呼び元に
//!   伝播させないこと（best-effort）が契約
//! - 1 接続の送信失敗が他の接続への配信を妨げないことを保証
//! - オフライン接続がイベントを「取り逃がす」こと（キューなし・再送なし）を保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：個人チャンネル・ロールチャンネル宛の配信
//! - 異常系：切断済み transport への送信失敗
//! - エッジケース：ターゲットチャンネルが空（誰も受け取らない）

use std::sync::Arc;

use crate::domain::{
    ConnectionRegistry, DomainEvent, EventContext, EventKind, TargetSpec, Timestamp,
};
use crate::infrastructure::dto::websocket::EventEnvelope;
use kakehashi_shared::time::now_millis;

/// Delivery outcome of one dispatch. Informational only; never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchReport {
    /// Live connections resolved from the target channels
    pub resolved: usize,
    /// Deliveries handed to a transport queue successfully
    pub delivered: usize,
    /// Deliveries dropped because the transport was already gone
    pub failed: usize,
}

/// イベント配信のユースケース
///
/// REST 層がコミット後に呼ぶ唯一の入口。グローバルな socket サーバー
/// シングルトンではなく、明示的に構築して渡す（依存注入）。
pub struct DispatchEventUseCase {
    /// Registry（共有可変状態の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
}

impl DispatchEventUseCase {
    /// 新しい DispatchEventUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// イベントを発行する
    ///
    /// サーバー時刻で `occurred_at` を採番し、イベント種別ごとの正規の
    /// ルーティングルール（EventKind::targets）でターゲットを解決して
    /// 配信する。配信失敗でエラーを返すことはない。
    pub async fn emit(
        &self,
        kind: EventKind,
        context: &EventContext,
        payload: serde_json::Value,
    ) -> DispatchReport {
        let event = DomainEvent::new(kind, payload, Timestamp::new(now_millis()));
        let spec = kind.targets(context);
        self.dispatch(&event, &spec).await
    }

    /// 配信プリミティブ：解決済みターゲットへのファンアウト
    ///
    /// ターゲットチャンネルの和集合にいる live 接続それぞれに、一度だけ
    /// シリアライズした封筒を送る。live でない接続は単にイベントを
    /// 取り逃がす（at-most-once、best-effort）。
    ///
    /// 解決と送信は registry 側で同一ロック配下にまとめて行われるため、
    /// 並行する dispatch 同士は全順序づけられ、各接続のキューには
    /// dispatch 順にイベントが積まれる（接続内 FIFO）。
    pub async fn dispatch(&self, event: &DomainEvent, spec: &TargetSpec) -> DispatchReport {
        let envelope = EventEnvelope {
            r#type: event.kind,
            payload: event.payload.clone(),
            timestamp: event.occurred_at.value(),
        };
        let serialized = serde_json::to_string(&envelope).unwrap();

        let receipt = self
            .registry
            .deliver_to_channels(spec.channels(), serialized)
            .await;

        // A failing connection must not prevent delivery to the others.
        for connection_id in &receipt.failed {
            tracing::warn!(
                "failed to deliver '{}' to connection '{}'",
                event.kind,
                connection_id
            );
        }

        tracing::debug!(
            "dispatched '{}' to {} connection(s) ({} failed)",
            event.kind,
            receipt.delivered,
            receipt.failed.len()
        );

        DispatchReport {
            resolved: receipt.resolved,
            delivered: receipt.delivered,
            failed: receipt.failed.len(),
        }
    }
}
