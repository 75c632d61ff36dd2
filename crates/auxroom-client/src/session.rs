//! Room session runtime.
//!
//! One tokio task per session owns the engine and all I/O state; a
//! `tokio::select!` loop multiplexes transport events, the playback poll
//! timer, the progress tick, and user commands. Processing one event fully -
//! including republishing [`RoomState`] - before accepting the next gives the
//! engine its single-threaded consistency without any locks.
//!
//! Consumers hold a [`RoomSession`] handle: a command channel in, a
//! `watch::Receiver<RoomState>` out. Snapshots are replaced wholesale and
//! never mutated in place.

use std::{future::Future, pin::Pin};

use auxroom_core::{
    ConnectionStatus, RoomIdentity, RoomState, SendError, SessionAction, SessionConfig,
    SessionCore, SessionEvent, env::Environment,
};
use auxroom_proto::playback::NowPlayingResponse;
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
    time::{MissedTickBehavior, Sleep},
};
use url::Url;

use crate::{DirectoryClient, DirectoryError, PlaybackClient, SystemEnv, transport::Transport};

type ConnectFuture = Pin<Box<dyn Future<Output = Result<Transport, crate::TransportError>> + Send>>;
type FetchFuture = Pin<Box<dyn Future<Output = Result<NowPlayingResponse, reqwest::Error>> + Send>>;

/// Endpoints and tunables for opening room sessions.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the HTTP services (directory, playback provider).
    pub http_base: Url,
    /// Base URL of the WebSocket endpoint.
    pub ws_base: Url,
    /// Engine tunables.
    pub session: SessionConfig,
}

impl ClientConfig {
    /// Config with default session tunables.
    pub fn new(http_base: Url, ws_base: Url) -> Self {
        Self { http_base, ws_base, session: SessionConfig::default() }
    }
}

/// Commands from the handle into the session task.
enum Command {
    SendChat { text: String, reply: oneshot::Sender<Result<(), SendError>> },
    RefreshPlayback,
    Close { reply: oneshot::Sender<()> },
}

/// Handle to one live room session.
///
/// Dropping the handle tears the session down; [`RoomSession::close`] does
/// the same but waits until the task has fully stopped, guaranteeing no
/// state update is published afterwards.
pub struct RoomSession {
    commands: mpsc::Sender<Command>,
    state_rx: watch::Receiver<RoomState>,
    task: JoinHandle<()>,
}

impl RoomSession {
    /// Look up the room in the directory and open a session for it.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::RoomNotFound`] if the room does not exist - the
    /// caller shows a terminal "can't find room" state, distinct from
    /// loading. Other directory failures are equally fatal to bootstrap.
    pub async fn open(
        config: ClientConfig,
        room_id: &str,
        sender_name: &str,
    ) -> Result<Self, DirectoryError> {
        let http = reqwest::Client::new();
        let directory = DirectoryClient::new(http.clone(), config.http_base.clone());
        let record = directory.fetch_room(room_id).await?;
        let identity =
            RoomIdentity { id: record.id, name: record.name, host_name: record.host_name };
        Self::open_with_identity(config, identity, sender_name).map_err(DirectoryError::from)
    }

    /// Open a session for a room whose metadata is already known.
    ///
    /// # Errors
    ///
    /// If the channel URL cannot be constructed from the config.
    pub fn open_with_identity(
        config: ClientConfig,
        identity: RoomIdentity,
        sender_name: &str,
    ) -> Result<Self, url::ParseError> {
        let ws_url = config.ws_base.join(&format!("ws/rooms/{}", identity.id))?;
        let http = reqwest::Client::new();
        let playback = PlaybackClient::new(http, &config.http_base)?;

        let env = SystemEnv::new();
        let core = SessionCore::new(env.clone(), identity, sender_name.to_owned(), config.session);
        let (state_tx, state_rx) = watch::channel(core.snapshot(env.now()));
        let (command_tx, command_rx) = mpsc::channel(16);

        let task = tokio::spawn(run(core, env, ws_url, playback, state_tx, command_rx));
        Ok(Self { commands: command_tx, state_rx, task })
    }

    /// Subscribe to state snapshots.
    ///
    /// The receiver always observes a state reflecting every processed
    /// event; intermediate snapshots may be superseded before a slow reader
    /// wakes, which is exactly the replace-wholesale contract.
    pub fn subscribe(&self) -> watch::Receiver<RoomState> {
        self.state_rx.clone()
    }

    /// Current state snapshot.
    pub fn state(&self) -> RoomState {
        self.state_rx.borrow().clone()
    }

    /// Send one chat message.
    ///
    /// # Errors
    ///
    /// - [`SendError::EmptyText`] if the text trims to nothing.
    /// - [`SendError::NotConnected`] while the channel is down; the message
    ///   is not queued for later delivery.
    pub async fn send_chat(&self, text: &str) -> Result<(), SendError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::SendChat { text: text.to_owned(), reply })
            .await
            .map_err(|_| SendError::NotConnected)?;
        response.await.map_err(|_| SendError::NotConnected)?
    }

    /// Request an immediate playback poll, subject to the single-in-flight
    /// rule.
    pub async fn refresh_playback(&self) {
        let _ = self.commands.send(Command::RefreshPlayback).await;
    }

    /// Tear the session down.
    ///
    /// When this returns, the poll timer is stopped, the transport is closed
    /// without further reconnection, and no more snapshots will be
    /// published - even if an in-flight network response arrives later.
    pub async fn close(self) {
        let (reply, done) = oneshot::channel();
        if self.commands.send(Command::Close { reply }).await.is_ok() {
            let _ = done.await;
        }
        let _ = self.task.await;
    }
}

/// Transport-side state of the session loop.
///
/// Pending futures live inside the variant so `select!` cancellation never
/// loses progress: re-polling resumes the same sleep, handshake, or read.
enum Link {
    /// No connection and nothing scheduled.
    Idle,
    /// Waiting out a reconnect backoff.
    Waiting(Pin<Box<Sleep>>),
    /// Handshake in flight.
    Connecting(ConnectFuture),
    /// Channel established.
    Open(Transport),
}

enum LinkEvent {
    /// Backoff elapsed; the next attempt should start.
    AttemptDue,
    /// Handshake completed.
    Opened,
    /// Handshake failed.
    Failed,
    /// One inbound text frame.
    Frame(String),
    /// An open connection ended (error or close, local policy treats both
    /// the same).
    Lost,
}

async fn link_event(link: &mut Link) -> LinkEvent {
    match link {
        Link::Idle => std::future::pending().await,
        Link::Waiting(sleep) => {
            sleep.as_mut().await;
            *link = Link::Idle;
            LinkEvent::AttemptDue
        },
        Link::Connecting(handshake) => match handshake.as_mut().await {
            Ok(transport) => {
                *link = Link::Open(transport);
                LinkEvent::Opened
            },
            Err(error) => {
                tracing::debug!(%error, "room channel connect failed");
                *link = Link::Idle;
                LinkEvent::Failed
            },
        },
        Link::Open(transport) => match transport.next_text().await {
            Some(text) => LinkEvent::Frame(text),
            None => {
                *link = Link::Idle;
                LinkEvent::Lost
            },
        },
    }
}

async fn fetch_done(
    in_flight: &mut Option<FetchFuture>,
) -> Result<NowPlayingResponse, reqwest::Error> {
    match in_flight {
        Some(fetch) => fetch.as_mut().await,
        // Guarded by `if in_flight.is_some()` in the select arm.
        None => std::future::pending().await,
    }
}

fn begin_connect(url: &Url) -> Link {
    Link::Connecting(Box::pin(Transport::connect(url.clone())))
}

fn apply(
    actions: Vec<SessionAction>,
    core: &SessionCore<SystemEnv>,
    env: &SystemEnv,
    state_tx: &watch::Sender<RoomState>,
    link: &mut Link,
) {
    for action in actions {
        match action {
            SessionAction::PublishState => {
                state_tx.send_replace(core.snapshot(env.now()));
            },
            SessionAction::ScheduleReconnect(delay) => {
                *link = Link::Waiting(Box::pin(tokio::time::sleep(delay)));
            },
        }
    }
}

#[allow(clippy::too_many_lines)]
async fn run(
    mut core: SessionCore<SystemEnv>,
    env: SystemEnv,
    ws_url: Url,
    playback: PlaybackClient,
    state_tx: watch::Sender<RoomState>,
    mut commands: mpsc::Receiver<Command>,
) {
    let mut link = Link::Idle;
    let mut in_flight: Option<FetchFuture> = None;

    let mut poll_timer = tokio::time::interval(core.config().poll_interval);
    poll_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut progress_timer = tokio::time::interval(core.config().progress_tick);
    progress_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    apply(core.start(), &core, &env, &state_tx, &mut link);
    link = begin_connect(&ws_url);

    loop {
        tokio::select! {
            command = commands.recv() => {
                match command {
                    Some(Command::SendChat { text, reply }) => {
                        let result = core.send_chat(&text);
                        match result {
                            Ok(json) => {
                                // Local echo first, transmission second.
                                state_tx.send_replace(core.snapshot(env.now()));
                                let send_failed = match &mut link {
                                    Link::Open(transport) => {
                                        transport.send_text(json).await.is_err()
                                    },
                                    // Connected status implies an open link.
                                    _ => true,
                                };
                                let _ = reply.send(Ok(()));
                                if send_failed {
                                    link = Link::Idle;
                                    let actions = core.handle(SessionEvent::TransportLost);
                                    apply(actions, &core, &env, &state_tx, &mut link);
                                }
                            },
                            Err(error) => {
                                let _ = reply.send(Err(error));
                            },
                        }
                    },
                    Some(Command::RefreshPlayback) => {
                        if in_flight.is_none() {
                            let client = playback.clone();
                            in_flight = Some(Box::pin(async move { client.fetch().await }));
                        }
                    },
                    Some(Command::Close { reply }) => {
                        apply(core.close(), &core, &env, &state_tx, &mut link);
                        let _ = reply.send(());
                        break;
                    },
                    // Handle dropped: same as an explicit close.
                    None => {
                        apply(core.close(), &core, &env, &state_tx, &mut link);
                        break;
                    },
                }
            },

            event = link_event(&mut link) => {
                let actions = match event {
                    LinkEvent::AttemptDue => {
                        let actions = core.handle(SessionEvent::BackoffElapsed);
                        if core.connection_status() == ConnectionStatus::Connecting {
                            link = begin_connect(&ws_url);
                        }
                        actions
                    },
                    LinkEvent::Opened => core.handle(SessionEvent::TransportOpened),
                    LinkEvent::Failed | LinkEvent::Lost => {
                        core.handle(SessionEvent::TransportLost)
                    },
                    LinkEvent::Frame(raw) => {
                        core.handle(SessionEvent::FrameReceived { raw })
                    },
                };
                apply(actions, &core, &env, &state_tx, &mut link);
            },

            _ = poll_timer.tick() => {
                if in_flight.is_none() {
                    let client = playback.clone();
                    in_flight = Some(Box::pin(async move { client.fetch().await }));
                } else {
                    // Skip-if-busy: never more than one fetch outstanding.
                    tracing::debug!("playback fetch still outstanding, skipping poll tick");
                }
            },

            result = fetch_done(&mut in_flight), if in_flight.is_some() => {
                in_flight = None;
                match result {
                    Ok(response) => {
                        let actions = core.handle(SessionEvent::PollCompleted {
                            response,
                            now: env.now(),
                        });
                        apply(actions, &core, &env, &state_tx, &mut link);
                    },
                    Err(error) => {
                        // Previous snapshot is retained; staleness threshold
                        // takes it from here.
                        tracing::warn!(%error, "playback poll failed");
                    },
                }
            },

            _ = progress_timer.tick() => {
                let actions = core.handle(SessionEvent::ProgressTick { now: env.now() });
                apply(actions, &core, &env, &state_tx, &mut link);
            },
        }
    }
    // Dropping the link closes the socket; dropping the fetch future cancels
    // it. Nothing outlives this task.
}
