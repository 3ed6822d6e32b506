//! MessagePusher trait 定義
//!
//! ドメイン層が必要とする「接続中クライアントへの通知」のインターフェース。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{error::MessagePushError, value_object::ConnectionId};

/// Outbound channel of one connection (serialized JSON frames)
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Delivers serialized messages to connected clients
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続を登録（以後 push / broadcast の対象になる）
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続の登録を解除
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 特定の接続にメッセージを送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続にメッセージを送信（一部の失敗は許容）
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// 登録中の全ての接続 ID
    async fn connected_client_ids(&self) -> Vec<ConnectionId>;
}
