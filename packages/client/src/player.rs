//! Headless media player for the CLI.

use std::time::Instant;

use crate::{error::PlaybackError, playback::MediaPlayer};

/// Position advances with wall time while playing; nothing is decoded.
#[derive(Debug, Default)]
pub struct SimulatedPlayer {
    media: Option<String>,
    /// Position at the last seek / pause
    base_position: f64,
    /// Set while playing
    playing_since: Option<Instant>,
}

impl SimulatedPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a media file, stopping and rewinding
    pub fn load(&mut self, media_file_name: impl Into<String>) {
        self.media = Some(media_file_name.into());
        self.base_position = 0.0;
        self.playing_since = None;
    }

    pub fn media_file_name(&self) -> Option<&str> {
        self.media.as_deref()
    }
}

impl MediaPlayer for SimulatedPlayer {
    fn has_media(&self) -> bool {
        self.media.is_some()
    }

    fn current_position(&self) -> f64 {
        match self.playing_since {
            Some(since) => self.base_position + since.elapsed().as_secs_f64(),
            None => self.base_position,
        }
    }

    fn seek(&mut self, position: f64) {
        self.base_position = position.max(0.0);
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        if self.media.is_none() {
            return Err(PlaybackError::NoMedia);
        }
        if self.playing_since.is_none() {
            self.playing_since = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.base_position = self.current_position();
        self.playing_since = None;
    }

    fn is_paused(&self) -> bool {
        self.playing_since.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_without_media_is_rejected() {
        // テスト項目: メディア未ロードで再生すると NoMedia エラーになる
        // given (前提条件):
        let mut player = SimulatedPlayer::new();

        // when (操作):
        let result = player.play();

        // then (期待する結果):
        assert_eq!(result, Err(PlaybackError::NoMedia));
        assert!(player.is_paused());
    }

    #[test]
    fn test_seek_while_paused_sets_position() {
        // テスト項目: 停止中のシークで位置がそのまま設定され、負の値は 0 になる
        // given (前提条件):
        let mut player = SimulatedPlayer::new();
        player.load("movie.mp4");

        // when (操作):
        player.seek(12.5);
        let positive = player.current_position();
        player.seek(-3.0);
        let negative = player.current_position();

        // then (期待する結果):
        assert_eq!(positive, 12.5);
        assert_eq!(negative, 0.0);
    }

    #[test]
    fn test_position_advances_while_playing() {
        // テスト項目: 再生中は位置が進み、一時停止で止まる
        // given (前提条件):
        let mut player = SimulatedPlayer::new();
        player.load("movie.mp4");
        player.seek(5.0);

        // when (操作):
        player.play().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(30));
        player.pause();
        let paused_at = player.current_position();
        std::thread::sleep(std::time::Duration::from_millis(30));

        // then (期待する結果):
        assert!(paused_at > 5.0);
        assert_eq!(player.current_position(), paused_at);
        assert!(player.is_paused());
    }

    #[test]
    fn test_load_rewinds_and_stops() {
        // テスト項目: 別ファイルをロードすると停止して先頭に戻る
        // given (前提条件):
        let mut player = SimulatedPlayer::new();
        player.load("a.mp4");
        player.seek(30.0);
        player.play().unwrap();

        // when (操作):
        player.load("b.mp4");

        // then (期待する結果):
        assert_eq!(player.media_file_name(), Some("b.mp4"));
        assert_eq!(player.current_position(), 0.0);
        assert!(player.is_paused());
    }
}
