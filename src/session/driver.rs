//! One async task per client session.
//!
//! The task is the only owner of the transport. Callers talk to it through a
//! [`SessionHandle`] and hear back through a stream of [`SessionEvent`]s;
//! commands and transport frames are handled strictly one at a time.

use crate::{
    config::ClientConfig,
    error::{ClientError, TransportError},
    game::snapshot::GameSnapshot,
    matchmaking::QueueInfo,
    protocol::{ClientMsg, ServerMsg},
    session::{
        machine::{CloseCause, ConnectionState, Next, SessionMachine},
        store::LocalStore,
    },
    ws::{self, Connector, Link, TransportEvent},
};
use std::sync::Arc;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{sleep_until, Instant},
};

/// Screens the app can be on, as far as session lifetime is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Battle,
    PostGame,
    Other,
}

/// Where the app must go in response to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigate {
    Login,
    Dashboard,
    Battle,
    PostGame,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Login(String),
    FindMatch,
    Leave,
    Send(ClientMsg),
    /// The app navigated away from `view`.
    LeaveView(View),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged(ConnectionState),
    Status {
        info: QueueInfo,
        message: Option<String>,
    },
    GameStarted {
        player_id: String,
        snapshot: GameSnapshot,
    },
    Snapshot(GameSnapshot),
    GameOver(GameSnapshot),
    ActionRejected(String),
    MatchmakingFailed(String),
    ServerError(String),
    OpponentLeft,
    AuthRequired(String),
    Disconnected(Option<String>),
    /// A connect attempt failed before the socket opened.
    ConnectFailed(TransportError),
    /// An outbound message could not be handed to the transport.
    Undelivered(ClientMsg),
}

impl SessionEvent {
    /// The failure this event reports, if it reports one.
    pub fn error(&self) -> Option<ClientError> {
        let err = match self {
            SessionEvent::ActionRejected(reason) => ClientError::ActionRejected {
                reason: reason.clone(),
            },
            SessionEvent::MatchmakingFailed(reason) => ClientError::Matchmaking {
                reason: reason.clone(),
            },
            SessionEvent::ServerError(reason) => ClientError::Server {
                reason: reason.clone(),
            },
            SessionEvent::OpponentLeft => ClientError::OpponentLeft,
            SessionEvent::AuthRequired(reason) => ClientError::Auth {
                reason: reason.clone(),
            },
            SessionEvent::Disconnected(_) => ClientError::Transport(TransportError::Closed),
            SessionEvent::ConnectFailed(e) => ClientError::Transport(e.clone()),
            _ => return None,
        };
        Some(err)
    }

    /// Fatal errors and match boundaries move the app; everything else is
    /// shown in place.
    pub fn navigation(&self) -> Option<Navigate> {
        match self {
            SessionEvent::GameStarted { .. } => Some(Navigate::Battle),
            SessionEvent::GameOver(_) => Some(Navigate::PostGame),
            _ => match self.error().filter(ClientError::is_fatal)? {
                ClientError::Auth { .. } => Some(Navigate::Login),
                _ => Some(Navigate::Dashboard),
            },
        }
    }
}

/// Cheap, cloneable sender side of a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Never waits; a full or closed command channel is an error.
    pub fn command(&self, cmd: SessionCommand) -> Result<(), ClientError> {
        self.commands.try_send(cmd).map_err(|e| {
            log::warn!("session command dropped: {e}");
            ClientError::SessionClosed
        })
    }

    pub fn login(&self, token: &str) -> Result<(), ClientError> {
        self.command(SessionCommand::Login(token.to_owned()))
    }

    pub fn find_match(&self) -> Result<(), ClientError> {
        self.command(SessionCommand::FindMatch)
    }

    pub fn leave(&self) -> Result<(), ClientError> {
        self.command(SessionCommand::Leave)
    }

    pub fn send(&self, msg: ClientMsg) -> Result<(), ClientError> {
        self.command(SessionCommand::Send(msg))
    }

    pub fn leave_view(&self, view: View) -> Result<(), ClientError> {
        self.command(SessionCommand::LeaveView(view))
    }
}

/// Channel pair for tests and embedders that drive a session by hand.
pub fn handle_pair(capacity: usize) -> (SessionHandle, mpsc::Receiver<SessionCommand>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (SessionHandle { commands: tx }, rx)
}

/// Starts the session task.
pub fn spawn<C: Connector>(
    config: ClientConfig,
    connector: C,
    store: Box<dyn LocalStore>,
) -> (SessionHandle, mpsc::Receiver<SessionEvent>, JoinHandle<()>) {
    let (handle, commands) = handle_pair(config.channel_capacity);
    let (events_tx, events_rx) = mpsc::channel(config.channel_capacity);
    let (connected_tx, connected_rx) = mpsc::channel(4);

    let driver = Driver {
        machine: SessionMachine::new(config.reconnect, store),
        connector: Arc::new(connector),
        ws_url: config.ws_url,
        events: events_tx,
        link: None,
        generation: 0,
        retry_at: None,
        game_over: false,
        connected_tx,
    };
    let task = tokio::spawn(driver.run(commands, connected_rx));
    (handle, events_rx, task)
}

type ConnectResult = (u64, Result<Link, TransportError>);

struct Driver<C> {
    machine: SessionMachine,
    connector: Arc<C>,
    ws_url: String,
    events: mpsc::Sender<SessionEvent>,
    link: Option<Link>,
    /// Bumped on every connect or teardown; stale connect results are dropped.
    generation: u64,
    retry_at: Option<Instant>,
    game_over: bool,
    connected_tx: mpsc::Sender<ConnectResult>,
}

async fn next_inbound(link: &mut Option<Link>) -> TransportEvent {
    match link {
        Some(l) => l
            .inbound
            .recv()
            .await
            .unwrap_or(TransportEvent::Closed(None)),
        None => std::future::pending().await,
    }
}

impl<C: Connector> Driver<C> {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut connected: mpsc::Receiver<ConnectResult>,
    ) {
        let before = self.machine.state();
        match self.machine.resume() {
            Ok(next) => self.apply(next),
            Err(e) => self.emit(SessionEvent::AuthRequired(e.to_string())).await,
        }
        self.report_state(before).await;

        loop {
            let before = self.machine.state();
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.on_command(cmd).await,
                    None => break,
                },
                Some((generation, result)) = connected.recv() => {
                    self.on_connect_result(generation, result).await;
                }
                ev = next_inbound(&mut self.link) => self.on_transport(ev).await,
                () = sleep_until(self.retry_at.unwrap_or_else(Instant::now)), if self.retry_at.is_some() => {
                    self.retry_at = None;
                    let next = self.machine.on_backoff_elapsed();
                    self.apply(next);
                }
            }
            self.report_state(before).await;
        }

        self.teardown();
        log::info!("session task stopped");
    }

    async fn on_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Login(token) => self.machine.set_token(&token),
            SessionCommand::FindMatch => match self.machine.request_match() {
                Ok(next) => self.apply(next),
                Err(e) => self.emit(SessionEvent::AuthRequired(e.to_string())).await,
            },
            SessionCommand::Leave => {
                let next = self.machine.leave();
                self.apply(next);
            }
            SessionCommand::Send(msg) => self.send(msg).await,
            SessionCommand::LeaveView(view) => {
                if view == View::Battle && self.game_over {
                    log::info!("leaving finished battle, relinquishing session");
                    let next = self.machine.leave();
                    self.apply(next);
                }
            }
        }
    }

    async fn send(&mut self, msg: ClientMsg) {
        let Some(link) = self.link.as_ref() else {
            log::warn!("not connected, cannot send {msg:?}");
            self.emit(SessionEvent::Undelivered(msg)).await;
            return;
        };
        let text = match msg.encode() {
            Ok(text) => text,
            Err(e) => {
                log::error!("could not encode {msg:?}: {e}");
                self.emit(SessionEvent::Undelivered(msg)).await;
                return;
            }
        };
        if let Err(e) = link.outbound.try_send(text) {
            log::warn!("outbound frame dropped: {e}");
            self.emit(SessionEvent::Undelivered(msg)).await;
        }
    }

    async fn on_connect_result(&mut self, generation: u64, result: Result<Link, TransportError>) {
        if generation != self.generation {
            log::debug!("dropping stale connect result #{generation}");
            return;
        }
        match result {
            Ok(link) => match self.machine.on_open() {
                Next::Disconnect => drop(link),
                next => {
                    self.link = Some(link);
                    self.apply(next);
                }
            },
            Err(TransportError::Unauthorized { status }) => {
                let next = self.machine.on_closed(CloseCause::Auth);
                self.apply(next);
                self.emit(SessionEvent::AuthRequired(format!(
                    "server refused credentials ({status})"
                )))
                .await;
            }
            Err(e) => {
                log::warn!("connect failed: {e}");
                let next = self.machine.on_closed(CloseCause::Transport);
                self.apply(next);
                self.emit(SessionEvent::ConnectFailed(e)).await;
            }
        }
    }

    async fn on_transport(&mut self, ev: TransportEvent) {
        match ev {
            TransportEvent::Text(text) => match ServerMsg::decode(&text) {
                Ok(msg) => self.on_server_msg(msg).await,
                Err(e) => log::warn!("undecodable frame dropped: {e}"),
            },
            TransportEvent::Closed(reason) => {
                self.link = None;
                // a finished match is not worth reconnecting to
                let cause = if self.game_over {
                    CloseCause::Left
                } else {
                    CloseCause::Transport
                };
                let next = self.machine.on_closed(cause);
                self.apply(next);
                self.emit(SessionEvent::Disconnected(reason)).await;
            }
        }
    }

    async fn on_server_msg(&mut self, msg: ServerMsg) {
        log::debug!("inbound {msg:?}");
        match msg {
            ServerMsg::Status(status) => {
                self.machine.on_status(&status);
                let info = self.machine.queue_info().clone();
                self.emit(SessionEvent::Status {
                    info,
                    message: status.message,
                })
                .await;
            }
            ServerMsg::GameStart { your_id, state } => {
                self.game_over = state.is_game_over;
                if self.machine.on_match_found(&your_id) {
                    self.emit(SessionEvent::GameStarted {
                        player_id: your_id,
                        snapshot: state,
                    })
                    .await;
                }
            }
            ServerMsg::GameUpdate { state } => {
                if state.is_game_over {
                    self.game_over = true;
                    self.emit(SessionEvent::GameOver(state)).await;
                } else {
                    self.emit(SessionEvent::Snapshot(state)).await;
                }
            }
            ServerMsg::ActionError { message } => {
                self.emit(SessionEvent::ActionRejected(message)).await;
            }
            ServerMsg::MatchmakingError { message } => {
                let next = self.machine.on_closed(CloseCause::MatchmakingFailure);
                self.apply(next);
                self.emit(SessionEvent::MatchmakingFailed(message)).await;
            }
            ServerMsg::OpponentDisconnected => {
                let next = self.machine.on_closed(CloseCause::OpponentLeft);
                self.apply(next);
                self.emit(SessionEvent::OpponentLeft).await;
            }
            ServerMsg::Error { message } => {
                let next = self.machine.on_closed(CloseCause::ServerError);
                self.apply(next);
                self.emit(SessionEvent::ServerError(message)).await;
            }
        }
    }

    fn apply(&mut self, next: Next) {
        match next {
            Next::Connect => self.start_connect(),
            Next::Wait(delay) => self.retry_at = Some(Instant::now() + delay),
            Next::Disconnect => self.teardown(),
            Next::Nothing => {}
        }
    }

    fn start_connect(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        let url = ws::endpoint(&self.ws_url, self.machine.token().unwrap_or_default());
        let connector = Arc::clone(&self.connector);
        let done = self.connected_tx.clone();
        tokio::spawn(async move {
            let result = match url {
                Ok(url) => connector.connect(url).await,
                Err(e) => Err(e),
            };
            let _ = done.send((generation, result)).await;
        });
    }

    fn teardown(&mut self) {
        self.generation += 1;
        self.retry_at = None;
        if self.link.take().is_some() {
            log::debug!("transport dropped");
        }
        if self.machine.state() == ConnectionState::Idle {
            self.game_over = false;
        }
    }

    async fn report_state(&mut self, before: ConnectionState) {
        let now = self.machine.state();
        if now != before {
            self.emit(SessionEvent::StateChanged(now)).await;
        }
    }

    async fn emit(&self, ev: SessionEvent) {
        if self.events.send(ev).await.is_err() {
            log::debug!("event receiver gone");
        }
    }
}
