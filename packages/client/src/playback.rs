//! Client-side playback control.
//!
//! Turns coordinator events into local player commands. All positions are
//! media seconds; all instants are coordinator epoch milliseconds as
//! returned by [`crate::clock_sync::ClockSyncEstimator::synced_now`].

use cuepoint_server::infrastructure::dto::websocket::{
    CountdownStarted, PlaybackStart, RoomSnapshot, RoomStatus,
};

use crate::{
    display::{DisplayTicker, DisplayTimer},
    error::PlaybackError,
};

/// Drift below this many seconds is tolerated on a manual resume.
pub const DRIFT_THRESHOLD_SECS: f64 = 1.0;

/// Local media playback engine
#[cfg_attr(test, mockall::automock)]
pub trait MediaPlayer: Send {
    fn has_media(&self) -> bool;
    /// Current position in seconds
    fn current_position(&self) -> f64;
    fn seek(&mut self, position: f64);
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
}

/// Where a playback-start should put the local media, in seconds (never negative)
pub fn compute_seek_position(event: &PlaybackStart, synced_now: i64) -> f64 {
    let position = match (event.immediate, event.seek_to) {
        (true, Some(seek_to)) => seek_to,
        _ => (synced_now - event.target_time) as f64 / 1000.0,
    };
    position.max(0.0)
}

/// A phase event received before the room's target time was known
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredEvent {
    Countdown(CountdownStarted),
    PlaybackStart(PlaybackStart),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackOutcome {
    /// Nothing changed on the player
    Idle,
    /// Countdown display armed for `target_time`
    CountdownArmed { target_time: i64 },
    /// Player is running from `position`
    Started { position: f64 },
    /// The local player refused to start
    Rejected(PlaybackError),
    /// Fetch the room snapshot, then hand the event to `resume_deferred`
    Deferred(DeferredEvent),
}

pub struct ClientPlaybackController<P: MediaPlayer> {
    player: P,
    ticker: DisplayTicker,
    room: Option<RoomSnapshot>,
    target_time: Option<i64>,
    joined: bool,
    resync_offered: bool,
}

impl<P: MediaPlayer> ClientPlaybackController<P> {
    pub fn new(player: P) -> Self {
        Self {
            player,
            ticker: DisplayTicker::new(),
            room: None,
            target_time: None,
            joined: false,
            resync_offered: false,
        }
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn room(&self) -> Option<&RoomSnapshot> {
        self.room.as_ref()
    }

    pub fn target_time(&self) -> Option<i64> {
        self.target_time
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub fn resync_offered(&self) -> bool {
        self.resync_offered
    }

    pub fn display_timer(&self) -> Option<DisplayTimer> {
        self.ticker.active()
    }

    fn is_playing(&self) -> bool {
        self.room
            .as_ref()
            .is_some_and(|room| room.status == RoomStatus::Playing)
    }

    /// Joining needs a known room and a loaded media file
    pub fn can_join(&self) -> bool {
        self.room.is_some() && self.player.has_media() && !self.joined
    }

    /// Advance the display timer
    pub fn tick(&mut self, synced_now: i64) -> Option<String> {
        self.ticker.tick(synced_now)
    }

    /// Adopt an authoritative snapshot (`room-updated`, `room-setup` or a fetch)
    pub fn apply_snapshot(&mut self, room: RoomSnapshot) {
        self.target_time = room.target_time;
        match (room.status, room.target_time) {
            (RoomStatus::Countdown, Some(target_time)) => {
                self.ticker.start(DisplayTimer::Countdown { target_time });
            }
            (RoomStatus::Playing, _) => {
                if let Some(origin) = room.started_at {
                    self.ticker.start(DisplayTimer::Elapsed { origin });
                }
            }
            _ => self.ticker.clear(),
        }
        self.room = Some(room);
    }

    /// `room-joined`: join in progress when the room is already playing
    pub fn on_room_joined(&mut self, room: RoomSnapshot) -> PlaybackOutcome {
        self.joined = true;
        let playing = room.status == RoomStatus::Playing;
        let position = room.current_position.max(0.0);
        self.apply_snapshot(room);

        if !playing {
            return PlaybackOutcome::Idle;
        }
        self.start_at(position)
    }

    pub fn on_countdown_started(&mut self, event: CountdownStarted) -> PlaybackOutcome {
        if self.target_time.is_none() {
            return PlaybackOutcome::Deferred(DeferredEvent::Countdown(event));
        }
        self.target_time = Some(event.target_time);
        self.ticker.start(DisplayTimer::Countdown {
            target_time: event.target_time,
        });
        PlaybackOutcome::CountdownArmed {
            target_time: event.target_time,
        }
    }

    pub fn on_playback_start(&mut self, event: PlaybackStart, synced_now: i64) -> PlaybackOutcome {
        if self.target_time.is_none() {
            return PlaybackOutcome::Deferred(DeferredEvent::PlaybackStart(event));
        }
        self.target_time = Some(event.target_time);

        let position = compute_seek_position(&event, synced_now);
        let origin = synced_now - (position * 1000.0).round() as i64;
        self.ticker.start(DisplayTimer::Elapsed { origin });
        if let Some(room) = self.room.as_mut() {
            room.status = RoomStatus::Playing;
            room.started_at = Some(event.start_time);
        }

        if !self.joined {
            return PlaybackOutcome::Idle;
        }
        self.start_at(position)
    }

    /// Continue an event parked by `Deferred` once the snapshot fetch settles.
    ///
    /// A failed fetch (`None`) drops the event.
    pub fn resume_deferred(
        &mut self,
        event: DeferredEvent,
        room: Option<RoomSnapshot>,
        synced_now: i64,
    ) -> PlaybackOutcome {
        let Some(room) = room else {
            tracing::warn!("Dropping {:?}: room snapshot unavailable", event);
            return PlaybackOutcome::Idle;
        };
        self.apply_snapshot(room);

        match event {
            DeferredEvent::Countdown(event) => {
                self.target_time.get_or_insert(event.target_time);
                self.on_countdown_started(event)
            }
            DeferredEvent::PlaybackStart(event) => {
                self.target_time.get_or_insert(event.target_time);
                self.on_playback_start(event, synced_now)
            }
        }
    }

    /// `room-reconfigured`: stop everything before the new snapshot arrives
    pub fn on_room_reconfigured(&mut self) {
        self.ticker.clear();
        self.target_time = None;
        self.resync_offered = false;
        self.player.pause();
        self.player.seek(0.0);
    }

    /// Leave the room locally; returns `false` if not joined
    pub fn leave(&mut self) -> bool {
        if !self.joined {
            return false;
        }
        self.joined = false;
        self.ticker.clear();
        self.resync_offered = false;
        self.player.pause();
        self.player.seek(0.0);
        true
    }

    /// Local pause while the room plays; returns whether a resync is now offered
    pub fn on_local_pause(&mut self) -> bool {
        self.player.pause();
        if self.joined && self.is_playing() {
            self.resync_offered = true;
        }
        self.resync_offered
    }

    /// Local resume; corrects the position only when drift exceeds the threshold.
    ///
    /// Returns the corrected position, if a seek happened.
    pub fn on_local_play(&mut self, synced_now: i64) -> Result<Option<f64>, PlaybackError> {
        self.player.play()?;
        self.resync_offered = false;

        let Some(target_time) = self.target_time.filter(|_| self.is_playing()) else {
            return Ok(None);
        };
        let expected = ((synced_now - target_time) as f64 / 1000.0).max(0.0);
        let drift = (expected - self.player.current_position()).abs();
        if drift <= DRIFT_THRESHOLD_SECS {
            return Ok(None);
        }
        tracing::info!("Correcting drift of {:.2}s", drift);
        self.player.seek(expected);
        Ok(Some(expected))
    }

    /// Manual resync to the coordinator's timeline
    pub fn resync(&mut self, synced_now: i64) -> PlaybackOutcome {
        let Some(target_time) = self.target_time.filter(|_| self.is_playing()) else {
            return PlaybackOutcome::Idle;
        };
        self.resync_offered = false;
        let position = ((synced_now - target_time) as f64 / 1000.0).max(0.0);
        self.start_at(position)
    }

    fn start_at(&mut self, position: f64) -> PlaybackOutcome {
        self.player.seek(position);
        match self.player.play() {
            Ok(()) => PlaybackOutcome::Started { position },
            Err(e) => {
                tracing::warn!("Local playback failed: {}", e);
                PlaybackOutcome::Rejected(e)
            }
        }
    }
}
