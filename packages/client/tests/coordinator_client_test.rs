//! Client components against an in-process coordinator.

use std::{sync::Arc, time::Duration};

use cuepoint_client::{clock_sync::ClockSyncEstimator, error::ClientError, session::fetch_room};
use cuepoint_server::{
    domain::{Room, RoomId, Timestamp},
    infrastructure::{
        dto::websocket::{ClientMessage, ServerMessage},
        message_pusher::WebSocketMessagePusher,
    },
    ui::router,
    usecase::{SessionCoordinator, SyncClockUseCase},
};
use cuepoint_shared::time::{Clock, SystemClock};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::{connect_async, tungstenite::Message};

async fn start_server() -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let room = Room::new(
        RoomId::new("lobby".to_string()).unwrap(),
        Timestamp::new(clock.now_millis()),
    );
    let coordinator = SessionCoordinator::new(
        room,
        Arc::new(WebSocketMessagePusher::default()),
        clock.clone(),
    );
    let app = router(coordinator, Arc::new(SyncClockUseCase::new(clock)));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, handle)
}

#[tokio::test]
async fn test_fetch_room_returns_snapshot() {
    // テスト項目: /api/room から初期状態のルーム snapshot を取得できる
    // given (前提条件):
    let (addr, handle) = start_server().await;
    let http = reqwest::Client::new();

    // when (操作):
    let room = fetch_room(&http, &format!("http://{}/api/room", addr))
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(room.id, "lobby");
    assert_eq!(room.target_time, None);
    assert!(room.participants.is_empty());
    handle.abort();
}

#[tokio::test]
async fn test_fetch_room_failure_is_reported() {
    // テスト項目: 存在しないパスへの取得は SnapshotFetch エラーになる
    // given (前提条件):
    let (addr, handle) = start_server().await;
    let http = reqwest::Client::new();

    // when (操作):
    let result = fetch_room(&http, &format!("http://{}/api/missing", addr)).await;

    // then (期待する結果):
    assert!(matches!(result, Err(ClientError::SnapshotFetch(_))));
    handle.abort();
}

#[tokio::test]
async fn test_estimator_calibrates_against_coordinator() {
    // テスト項目: 同一マシン上のコーディネーターに対してオフセットがほぼ 0 に推定される
    // given (前提条件):
    let (addr, handle) = start_server().await;
    let (mut ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    let mut estimator = ClockSyncEstimator::new(Arc::new(SystemClock));

    // when (操作):
    let request = estimator.request_sync();
    let json = serde_json::to_string(&ClientMessage::SyncRequest(request)).unwrap();
    ws.send(Message::Text(json.into())).await.unwrap();

    let mut offset = None;
    while offset.is_none() {
        let frame = tokio::time::timeout(Duration::from_secs(3), ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let Message::Text(text) = frame else {
            continue;
        };
        match serde_json::from_str::<ServerMessage>(&text).unwrap() {
            ServerMessage::ServerTime(server_time) => estimator.on_server_time(&server_time),
            ServerMessage::SyncResponse(response) => {
                offset = estimator.on_sync_response(&response);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    // then (期待する結果):
    let offset = offset.unwrap();
    assert!(offset.abs() < 1_000.0, "offset was {}", offset);
    assert!(estimator.is_calibrated());
    handle.abort();
}
