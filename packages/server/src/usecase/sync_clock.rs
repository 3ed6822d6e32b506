//! UseCase: 時刻同期（NTP 風のラウンドトリップ）への応答
//!
//! クライアントは送信時刻と相関 ID を送り、サーバー時刻付きでそのまま返してもらうことで
//! オフセットを推定します。サーバー側は状態を持ちません。

use std::{sync::Arc, time::Instant};

use cuepoint_shared::time::{Clock, timestamp_to_rfc3339};

use crate::infrastructure::dto::{
    http::TimeResponse,
    websocket::{Ping, Pong, ServerTime, SyncRequest, SyncResponse},
};

/// Answers clock-synchronization probes with the coordinator's time
pub struct SyncClockUseCase {
    clock: Arc<dyn Clock>,
    /// Origin of the monotonic "hrtime" readings
    started: Instant,
}

impl SyncClockUseCase {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            started: Instant::now(),
        }
    }

    /// Monotonic nanoseconds since the coordinator started, as a decimal string
    fn hrtime(&self) -> String {
        self.started.elapsed().as_nanos().to_string()
    }

    /// Seconds since the coordinator started
    pub fn uptime_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// sync-request → sync-response
    pub fn respond(&self, request: SyncRequest) -> SyncResponse {
        SyncResponse {
            client_request_time: request.client_time,
            server_time: self.clock.now_millis(),
            server_hr_time: self.hrtime(),
            sequence_id: request.sequence_id,
        }
    }

    /// ping → pong
    pub fn pong(&self, ping: Ping) -> Pong {
        Pong {
            client_time: ping.timestamp,
            server_time: self.clock.now_millis(),
        }
    }

    /// Greeting pushed to every new connection
    pub fn server_time(&self) -> ServerTime {
        ServerTime {
            timestamp: self.clock.now_millis(),
            hrtime: self.hrtime(),
        }
    }

    /// `GET /api/time`
    pub fn time(&self) -> TimeResponse {
        let timestamp = self.clock.now_millis();
        TimeResponse {
            timestamp,
            hrtime: self.hrtime(),
            iso: timestamp_to_rfc3339(timestamp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuepoint_shared::time::FixedClock;

    #[test]
    fn test_respond_echoes_request_fields() {
        // テスト項目: sync-response がクライアント時刻と相関 ID をそのまま返す
        // given (前提条件):
        let usecase = SyncClockUseCase::new(Arc::new(FixedClock::new(5_000)));
        let request = SyncRequest {
            client_time: 1_234,
            sequence_id: "probe-7".to_string(),
        };

        // when (操作):
        let response = usecase.respond(request);

        // then (期待する結果):
        assert_eq!(response.client_request_time, 1_234);
        assert_eq!(response.server_time, 5_000);
        assert_eq!(response.sequence_id, "probe-7");
        assert!(response.server_hr_time.parse::<u128>().is_ok());
    }

    #[test]
    fn test_hrtime_is_monotonic() {
        // テスト項目: hrtime は単調増加する
        // given (前提条件):
        let usecase = SyncClockUseCase::new(Arc::new(FixedClock::new(0)));

        // when (操作):
        let first: u128 = usecase.server_time().hrtime.parse().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second: u128 = usecase.server_time().hrtime.parse().unwrap();

        // then (期待する結果):
        assert!(second > first);
    }

    #[test]
    fn test_pong_and_time_use_injected_clock() {
        // テスト項目: pong と /api/time が注入された時計の時刻を返す
        // given (前提条件):
        let usecase = SyncClockUseCase::new(Arc::new(FixedClock::new(1672531200000)));

        // when (操作):
        let pong = usecase.pong(Ping {
            timestamp: Some(99),
        });
        let time = usecase.time();

        // then (期待する結果):
        assert_eq!(pong.client_time, Some(99));
        assert_eq!(pong.server_time, 1672531200000);
        assert_eq!(time.iso, "2023-01-01T00:00:00.000Z");
    }
}
