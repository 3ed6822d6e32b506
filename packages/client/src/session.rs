//! WebSocket client session management.

use std::{sync::Arc, time::Duration};

use cuepoint_server::infrastructure::dto::{
    http::RoomResponse,
    websocket::{
        ClientMessage, JoinRoom, OffsetUpdate, PlaybackState, RoomSnapshot, ServerMessage,
        SetupRoom,
    },
};
use cuepoint_shared::time::{Clock, SystemClock};
use futures_util::{
    SinkExt, StreamExt,
    stream::SplitSink,
};
use tokio::{net::TcpStream, sync::mpsc, time::MissedTickBehavior};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};

use crate::{
    clock_sync::ClockSyncEstimator,
    command::{Command, HELP, setup_target_time},
    config::ClientConfig,
    display::DisplayTimer,
    error::ClientError,
    formatter::MessageFormatter,
    playback::{ClientPlaybackController, DeferredEvent, MediaPlayer, PlaybackOutcome},
    player::SimulatedPlayer,
    ui,
};

const DISPLAY_TICK: Duration = Duration::from_millis(100);

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// State that survives reconnects
pub struct ClientContext {
    pub estimator: ClockSyncEstimator,
    /// Media to (re)join with once the room is known
    pub media: Option<String>,
}

impl ClientContext {
    pub fn new(media: Option<String>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            estimator: ClockSyncEstimator::new(clock),
            media,
        }
    }
}

/// Result of a background `GET /api/room`
enum FetchResult {
    Refresh(Option<RoomSnapshot>),
    Deferred(DeferredEvent, Option<RoomSnapshot>),
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Fetch the authoritative room snapshot
pub async fn fetch_room(http: &reqwest::Client, url: &str) -> Result<RoomSnapshot, ClientError> {
    let response = http
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| ClientError::SnapshotFetch(e.to_string()))?;
    let body: RoomResponse = response
        .json()
        .await
        .map_err(|e| ClientError::SnapshotFetch(e.to_string()))?;
    Ok(body.room)
}

/// Run one connection until the user quits (`Ok`) or the connection is lost (`Err`)
pub async fn run_client_session(
    config: &ClientConfig,
    http: &reqwest::Client,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
    context: &mut ClientContext,
) -> Result<(), ClientError> {
    let (ws_stream, _) = connect_async(config.ws_url())
        .await
        .map_err(|e| ClientError::Connection(e.to_string()))?;

    tracing::info!("Connected to {}", config.ws_url());
    ui::show("Connected to the coordinator. Type 'help' for commands.");

    let (write, mut read) = ws_stream.split();
    let (fetch_tx, mut fetch_rx) = mpsc::unbounded_channel();
    let mut session = Session::new(config, http.clone(), write, fetch_tx, context);
    session.spawn_fetch(None);

    // first tick fires immediately
    let mut sync_timer = tokio::time::interval(config.sync_interval());
    let mut display_timer = tokio::time::interval(DISPLAY_TICK);
    display_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => session.handle_text(&text).await?,
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Server closed the connection");
                    return Err(ClientError::Connection("Connection closed".to_string()));
                }
                Some(Err(e)) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return Err(ClientError::Connection(e.to_string()));
                }
                Some(Ok(_)) => {}
            },
            _ = sync_timer.tick() => session.probe().await?,
            _ = display_timer.tick() => session.tick(),
            Some(fetched) = fetch_rx.recv() => session.handle_fetch(fetched).await?,
            line = input_rx.recv() => {
                let Some(line) = line else {
                    // input thread ended (Ctrl+C / Ctrl+D)
                    return Ok(());
                };
                if session.handle_line(&line).await? == Flow::Quit {
                    return Ok(());
                }
            }
        }
    }
}

struct Session<'a> {
    config: &'a ClientConfig,
    http: reqwest::Client,
    write: WsSink,
    fetch_tx: mpsc::UnboundedSender<FetchResult>,
    context: &'a mut ClientContext,
    controller: ClientPlaybackController<SimulatedPlayer>,
    join_pending: bool,
}

impl<'a> Session<'a> {
    fn new(
        config: &'a ClientConfig,
        http: reqwest::Client,
        write: WsSink,
        fetch_tx: mpsc::UnboundedSender<FetchResult>,
        context: &'a mut ClientContext,
    ) -> Self {
        context.estimator.reset();

        let mut player = SimulatedPlayer::new();
        if let Some(media) = &context.media {
            player.load(media.clone());
        }

        Self {
            config,
            http,
            write,
            fetch_tx,
            context,
            controller: ClientPlaybackController::new(player),
            join_pending: false,
        }
    }

    fn synced_now(&self) -> i64 {
        self.context.estimator.synced_now()
    }

    async fn send(&mut self, message: ClientMessage) -> Result<(), ClientError> {
        let json = match serde_json::to_string(&message) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize message: {}", e);
                return Ok(());
            }
        };
        tracing::debug!("Sending {}", json);

        self.write
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))
    }

    async fn probe(&mut self) -> Result<(), ClientError> {
        let request = self.context.estimator.request_sync();
        self.send(ClientMessage::SyncRequest(request)).await
    }

    fn tick(&mut self) {
        let label = match self.controller.display_timer() {
            Some(DisplayTimer::Countdown { .. }) => "Starts in",
            Some(DisplayTimer::Elapsed { .. }) => "Playing",
            None => return,
        };
        let now = self.synced_now();
        if let Some(text) = self.controller.tick(now) {
            ui::show(&format!("{} {}", label, text));
        }
    }

    /// Fetch the room snapshot in the background; `event` resumes once it lands
    fn spawn_fetch(&self, event: Option<DeferredEvent>) {
        let http = self.http.clone();
        let url = self.config.room_url();
        let tx = self.fetch_tx.clone();

        tokio::spawn(async move {
            let room = match fetch_room(&http, &url).await {
                Ok(room) => Some(room),
                Err(e) => {
                    tracing::warn!("{}", e);
                    None
                }
            };
            let result = match event {
                Some(event) => FetchResult::Deferred(event, room),
                None => FetchResult::Refresh(room),
            };
            if tx.send(result).is_err() {
                tracing::debug!("Session ended before the room snapshot arrived");
            }
        });
    }

    async fn handle_fetch(&mut self, fetched: FetchResult) -> Result<(), ClientError> {
        match fetched {
            FetchResult::Refresh(Some(room)) => {
                self.controller.apply_snapshot(room);
                self.maybe_auto_join().await
            }
            FetchResult::Refresh(None) => Ok(()),
            FetchResult::Deferred(event, room) => {
                let now = self.synced_now();
                let outcome = self.controller.resume_deferred(event, room, now);
                self.handle_outcome(outcome).await
            }
        }
    }

    async fn maybe_auto_join(&mut self) -> Result<(), ClientError> {
        if self.join_pending || !self.controller.can_join() {
            return Ok(());
        }
        let Some(media) = self.context.media.clone() else {
            return Ok(());
        };
        self.join_pending = true;
        self.send(ClientMessage::JoinRoom(JoinRoom {
            media_file_name: Some(media),
        }))
        .await
    }

    async fn report_state(&mut self, state: &str) -> Result<(), ClientError> {
        if !self.controller.is_joined() {
            return Ok(());
        }
        let message = ClientMessage::PlaybackState(PlaybackState {
            state: state.to_string(),
            current_time: self.controller.player().current_position(),
            timestamp: self.synced_now(),
        });
        self.send(message).await
    }

    async fn handle_outcome(&mut self, outcome: PlaybackOutcome) -> Result<(), ClientError> {
        match outcome {
            PlaybackOutcome::Idle => {}
            PlaybackOutcome::CountdownArmed { target_time } => {
                ui::show(&MessageFormatter::format_countdown(target_time));
            }
            PlaybackOutcome::Started { position } => {
                ui::show(&MessageFormatter::format_playback_started(position));
                self.report_state("playing").await?;
            }
            PlaybackOutcome::Rejected(e) => {
                ui::show(&format!("Playback failed: {}", e));
            }
            PlaybackOutcome::Deferred(event) => {
                tracing::debug!("Target time unknown, fetching room before {:?}", event);
                self.spawn_fetch(Some(event));
            }
        }
        Ok(())
    }

    async fn handle_text(&mut self, text: &str) -> Result<(), ClientError> {
        match serde_json::from_str::<ServerMessage>(text) {
            Ok(message) => self.handle_server_message(message).await,
            Err(e) => {
                tracing::debug!("Unrecognized server message: {}", e);
                ui::show(&MessageFormatter::format_raw_message(text));
                Ok(())
            }
        }
    }

    async fn handle_server_message(&mut self, message: ServerMessage) -> Result<(), ClientError> {
        match message {
            ServerMessage::ServerTime(server_time) => {
                self.context.estimator.on_server_time(&server_time);
            }
            ServerMessage::SyncResponse(response) => {
                if let Some(offset) = self.context.estimator.on_sync_response(&response) {
                    self.send(ClientMessage::OffsetUpdate(OffsetUpdate { offset }))
                        .await?;
                }
            }
            ServerMessage::Pong(pong) => {
                tracing::debug!("Pong at coordinator time {}", pong.server_time);
            }
            ServerMessage::RoomSetup(envelope) => {
                ui::show(&format!(
                    "Room configured for {}",
                    envelope
                        .room
                        .target_time
                        .map(cuepoint_shared::time::timestamp_to_rfc3339)
                        .unwrap_or_default()
                ));
                self.controller.apply_snapshot(envelope.room);
            }
            ServerMessage::RoomUpdated(envelope) => {
                self.controller.apply_snapshot(envelope.room);
                self.maybe_auto_join().await?;
            }
            ServerMessage::RoomJoined(envelope) => {
                self.join_pending = false;
                ui::show(&MessageFormatter::format_room(&envelope.room));
                let outcome = self.controller.on_room_joined(envelope.room);
                self.handle_outcome(outcome).await?;
            }
            ServerMessage::CountdownStarted(event) => {
                let outcome = self.controller.on_countdown_started(event);
                self.handle_outcome(outcome).await?;
            }
            ServerMessage::PlaybackStart(event) => {
                let now = self.synced_now();
                let outcome = self.controller.on_playback_start(event, now);
                self.handle_outcome(outcome).await?;
            }
            ServerMessage::ParticipantJoined(event) => {
                ui::show(&MessageFormatter::format_participant_joined(&event));
            }
            ServerMessage::ParticipantLeft(event) => {
                ui::show(&MessageFormatter::format_participant_left(&event));
            }
            ServerMessage::RoomReconfigured => {
                self.controller.on_room_reconfigured();
                ui::show("Room reconfigured, waiting for a new start time");
            }
            ServerMessage::ParticipantState(event) => {
                ui::show(&MessageFormatter::format_participant_state(&event));
            }
            ServerMessage::Error(error) => {
                ui::show(&format!("Coordinator error: {}", error.message));
            }
        }
        Ok(())
    }

    async fn handle_line(&mut self, line: &str) -> Result<Flow, ClientError> {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                ui::show(&e.to_string());
                return Ok(Flow::Continue);
            }
        };

        match command {
            Command::Join(file) => {
                if self.controller.is_joined() {
                    ui::show("Already in the room, 'leave' first");
                    return Ok(Flow::Continue);
                }
                self.controller.player_mut().load(file.clone());
                self.context.media = Some(file);
                if self.controller.room().is_none() {
                    ui::show("Room state not known yet, joining once it arrives");
                    self.spawn_fetch(None);
                    return Ok(Flow::Continue);
                }
                self.maybe_auto_join().await?;
            }
            Command::Leave => {
                self.context.media = None;
                if self.controller.leave() {
                    self.send(ClientMessage::LeaveRoom).await?;
                    ui::show("Left the room");
                } else {
                    ui::show("Not in the room");
                }
            }
            Command::Setup { delay_secs } => {
                let Some(target_time) = setup_target_time(self.synced_now(), delay_secs) else {
                    ui::show(&format!("setup {} is out of range, nothing sent", delay_secs));
                    return Ok(Flow::Continue);
                };
                self.send(ClientMessage::SetupRoom(SetupRoom {
                    target_time: Some(target_time),
                }))
                .await?;
            }
            Command::SetupAt(target_time) => {
                self.send(ClientMessage::SetupRoom(SetupRoom {
                    target_time: Some(target_time),
                }))
                .await?;
            }
            Command::Reconfigure => self.send(ClientMessage::ReconfigureRoom).await?,
            Command::Pause => {
                let offered = self.controller.on_local_pause();
                self.report_state("paused").await?;
                if offered {
                    ui::show("Paused. Type 'resync' to rejoin the room's timeline");
                } else {
                    ui::show("Paused");
                }
            }
            Command::Play => {
                let now = self.synced_now();
                match self.controller.on_local_play(now) {
                    Ok(corrected) => {
                        if let Some(position) = corrected {
                            ui::show(&format!("Resumed, corrected drift to {:.2}s", position));
                        } else {
                            ui::show("Resumed");
                        }
                        self.report_state("playing").await?;
                    }
                    Err(e) => ui::show(&format!("Playback failed: {}", e)),
                }
            }
            Command::Resync => {
                let now = self.synced_now();
                match self.controller.resync(now) {
                    PlaybackOutcome::Idle => ui::show("Nothing to resync, the room is not playing"),
                    outcome => self.handle_outcome(outcome).await?,
                }
            }
            Command::Sync => self.probe().await?,
            Command::Status => ui::show(&self.status()),
            Command::Help => ui::show(HELP),
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn status(&self) -> String {
        let estimator = &self.context.estimator;
        let player = self.controller.player();
        let mut output = match self.controller.room() {
            Some(room) => MessageFormatter::format_room(room),
            None => "Room state unknown\n".to_string(),
        };
        output.push_str(&MessageFormatter::format_clock(
            estimator.offset_millis(),
            estimator.last_rtt_millis(),
        ));
        output.push_str(&format!(
            "\nMedia: {} ({}, {:.1}s){}",
            player.media_file_name().unwrap_or("none"),
            if player.is_paused() { "paused" } else { "playing" },
            player.current_position(),
            if self.controller.is_joined() {
                ", joined"
            } else {
                ""
            }
        ));
        if self.controller.resync_offered() {
            output.push_str("\nOut of sync, type 'resync'");
        }
        output
    }
}
