//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層（ハンドシェイク・ソケットループ・HTTP ハンドラ）から呼び出され、
//! Domain 層を操作します。

pub mod dispatch_event;
pub mod join_channel;
pub mod register_connection;
pub mod unregister_connection;

pub use dispatch_event::{DispatchEventUseCase, DispatchReport};
pub use join_channel::{JoinChannelUseCase, JoinOutcome, SubscribeRequest};
pub use register_connection::RegisterConnectionUseCase;
pub use unregister_connection::UnregisterConnectionUseCase;
