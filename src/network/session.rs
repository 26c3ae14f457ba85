//! Session Coordinator
//!
//! A single task owns the session state. Connection tasks talk to it through
//! a [`SessionHandle`]; the coordinator interleaves those commands with its
//! three periodic timers, so every mutation and every broadcast happens in
//! one place, one at a time.

use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::{env_parse, ConfigError};
use crate::core::rng::{time_seed, DeterministicRng};
use crate::game::events::SessionEvent;
use crate::game::maze::MazeDimensions;
use crate::game::state::{ClientId, SessionState};
use crate::game::tick::win_check;
use crate::network::protocol::{Frame, MapSnapshot, PositionUpdate, ServerMessage};
use crate::{POSITION_BROADCAST_MS, SCOREBOARD_BROADCAST_MS, WIN_CHECK_MS};

/// Configuration for the session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Size of the first maze.
    pub initial_dimensions: MazeDimensions,
    /// Floor for mazes carved after a win.
    pub min_dimensions: MazeDimensions,
    /// Period of the `clients` broadcast.
    pub position_broadcast_interval: Duration,
    /// Period of exit detection.
    pub win_check_interval: Duration,
    /// Period of the `scoreboard` broadcast.
    pub scoreboard_interval: Duration,
    /// PRNG seed. `None` seeds from the clock.
    pub seed: Option<u64>,
    /// Command queue capacity.
    pub command_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_dimensions: MazeDimensions::default(),
            min_dimensions: MazeDimensions::default(),
            position_broadcast_interval: Duration::from_millis(POSITION_BROADCAST_MS),
            win_check_interval: Duration::from_millis(WIN_CHECK_MS),
            scoreboard_interval: Duration::from_millis(SCOREBOARD_BROADCAST_MS),
            seed: None,
            command_buffer: 1024,
        }
    }
}

impl SessionConfig {
    /// Create config from environment variables.
    ///
    /// Reads `MAZE_RACE_SEED`, `MAZE_RACE_ROWS` and `MAZE_RACE_COLS`.
    /// Initial dimensions are forced odd and at least 3.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let rows = env_parse::<usize>("MAZE_RACE_ROWS")?.unwrap_or(defaults.initial_dimensions.rows);
        let cols = env_parse::<usize>("MAZE_RACE_COLS")?.unwrap_or(defaults.initial_dimensions.cols);

        Ok(Self {
            initial_dimensions: MazeDimensions::new(rows, cols).normalized(3),
            seed: env_parse::<u64>("MAZE_RACE_SEED")?,
            ..defaults
        })
    }
}

/// Session errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// The coordinator task has stopped.
    #[error("Session coordinator closed")]
    CoordinatorClosed,
}

/// Commands accepted by the coordinator.
#[derive(Debug)]
pub enum SessionCommand {
    /// A client connected; `outbox` delivers encoded messages to it.
    Connect {
        /// Transport-assigned identity.
        client_id: ClientId,
        /// Outbound queue for this client.
        outbox: mpsc::Sender<Frame>,
    },
    /// A client reported its position.
    Update {
        /// Reporting client.
        client_id: ClientId,
        /// Reported timestamp and position.
        update: PositionUpdate,
    },
    /// A client disconnected.
    Disconnect {
        /// Departed client.
        client_id: ClientId,
    },
    /// Read the current maze snapshot.
    Snapshot {
        /// Reply channel.
        reply: oneshot::Sender<MapSnapshot>,
    },
}

/// Cloneable front door to a running coordinator.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| SessionError::CoordinatorClosed)
    }

    /// Register a client.
    pub async fn connect(
        &self,
        client_id: ClientId,
        outbox: mpsc::Sender<Frame>,
    ) -> Result<(), SessionError> {
        self.send(SessionCommand::Connect { client_id, outbox }).await
    }

    /// Forward a position report.
    pub async fn update_position(
        &self,
        client_id: ClientId,
        update: PositionUpdate,
    ) -> Result<(), SessionError> {
        self.send(SessionCommand::Update { client_id, update }).await
    }

    /// Unregister a client.
    pub async fn disconnect(&self, client_id: ClientId) -> Result<(), SessionError> {
        self.send(SessionCommand::Disconnect { client_id }).await
    }

    /// Fetch the current maze snapshot.
    pub async fn map_snapshot(&self) -> Result<MapSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| SessionError::CoordinatorClosed)
    }
}

/// Owner of the session state.
pub struct SessionCoordinator {
    config: SessionConfig,
    state: SessionState,
    outboxes: BTreeMap<ClientId, mpsc::Sender<Frame>>,
    commands: mpsc::Receiver<SessionCommand>,
    /// Encoded `map` message for the current maze, built on first use.
    cached_map: Option<Frame>,
}

impl SessionCoordinator {
    /// Create a coordinator and its handle. Nothing runs until [`run`](Self::run).
    pub fn new(config: SessionConfig) -> (Self, SessionHandle) {
        let (tx, commands) = mpsc::channel(config.command_buffer.max(1));
        let seed = config.seed.unwrap_or_else(time_seed);
        let state = SessionState::new(config.initial_dimensions, DeterministicRng::new(seed));

        info!(
            "Session created: {}x{} maze, seed {}",
            state.maze().height(),
            state.maze().width(),
            seed
        );

        let coordinator = Self {
            config,
            state,
            outboxes: BTreeMap::new(),
            commands,
            cached_map: None,
        };
        (coordinator, SessionHandle { tx })
    }

    /// Create a coordinator and run it on its own task.
    pub fn spawn(config: SessionConfig) -> (SessionHandle, JoinHandle<()>) {
        let (coordinator, handle) = Self::new(config);
        let task = tokio::spawn(coordinator.run());
        (handle, task)
    }

    /// Process commands and timers until every handle is dropped.
    pub async fn run(mut self) {
        let mut positions = periodic(self.config.position_broadcast_interval);
        let mut win_checks = periodic(self.config.win_check_interval);
        let mut scoreboards = periodic(self.config.scoreboard_interval);

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => break,
                    }
                }
                _ = positions.tick() => self.broadcast_positions(),
                _ = win_checks.tick() => self.run_win_check(),
                _ = scoreboards.tick() => self.broadcast_scoreboard(),
            }
        }

        info!("Session coordinator stopped");
    }

    /// Apply one command.
    pub fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Connect { client_id, outbox } => {
                info!("Client {} joined", client_id);
                self.outboxes.insert(client_id.clone(), outbox);
                let events = self.state.connect(client_id);
                self.dispatch(events);
            }
            SessionCommand::Update { client_id, update } => {
                if !self.state.update_position(&client_id, update.t, update.p) {
                    debug!("Ignoring update from unknown client {}", client_id);
                }
            }
            SessionCommand::Disconnect { client_id } => {
                self.outboxes.remove(&client_id);
                let events = self.state.disconnect(&client_id);
                if !events.is_empty() {
                    info!("Client {} left", client_id);
                }
                self.dispatch(events);
            }
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(MapSnapshot::from_maze(self.state.maze()));
            }
        }
    }

    /// Send every client's last report to everyone.
    pub fn broadcast_positions(&self) {
        if self.outboxes.is_empty() {
            return;
        }
        self.broadcast(&ServerMessage::clients(&self.state));
    }

    /// Look for a client on the exit; start the next round if found.
    pub fn run_win_check(&mut self) {
        let result = win_check(&mut self.state, self.config.min_dimensions);
        self.dispatch(result.events);
    }

    /// Send the scoreboard to everyone.
    pub fn broadcast_scoreboard(&self) {
        if self.outboxes.is_empty() {
            return;
        }
        self.broadcast(&ServerMessage::scoreboard(&self.state));
    }

    /// Current session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Turn session events into outbound messages.
    fn dispatch(&mut self, events: Vec<SessionEvent>) {
        for event in events {
            match event {
                SessionEvent::ClientJoined { client_id } => {
                    if let Some(map) = self.map_frame() {
                        self.send_frame(&client_id, map);
                    }
                    self.send_to(&client_id, &ServerMessage::Id(client_id.clone()));
                }
                SessionEvent::ClientRemoved { client_id } => {
                    self.broadcast(&ServerMessage::RemoveClient(client_id));
                }
                SessionEvent::Winner { client_id } => {
                    info!(
                        "Client {} reached the exit (score {})",
                        client_id,
                        self.state.score(&client_id).unwrap_or_default()
                    );
                    self.broadcast(&ServerMessage::Winner(client_id));
                }
                SessionEvent::MazeRegenerated { rows, cols } => {
                    info!("New maze {}x{} for {} clients", rows, cols, self.state.client_count());
                    self.cached_map = None;
                    if let Some(map) = self.map_frame() {
                        self.broadcast_frame(&map);
                    }
                }
                SessionEvent::ScoreboardChanged => {
                    self.broadcast_scoreboard();
                }
            }
        }
    }

    /// Encoded `map` message for the current maze.
    fn map_frame(&mut self) -> Option<Frame> {
        if self.cached_map.is_none() {
            self.cached_map = encode(&ServerMessage::map(&self.state));
        }
        self.cached_map.clone()
    }

    /// Best-effort send to one client.
    fn send_to(&self, client_id: &ClientId, message: &ServerMessage) {
        if let Some(frame) = encode(message) {
            self.send_frame(client_id, frame);
        }
    }

    fn send_frame(&self, client_id: &ClientId, frame: Frame) {
        if let Some(outbox) = self.outboxes.get(client_id) {
            deliver(client_id, outbox, frame);
        }
    }

    /// Best-effort send to every client. Encodes once.
    fn broadcast(&self, message: &ServerMessage) {
        if let Some(frame) = encode(message) {
            self.broadcast_frame(&frame);
        }
    }

    fn broadcast_frame(&self, frame: &Frame) {
        for (client_id, outbox) in &self.outboxes {
            deliver(client_id, outbox, Frame::clone(frame));
        }
    }
}

/// Interval whose first tick is one period from now.
fn periodic(period: Duration) -> Interval {
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticks
}

fn encode(message: &ServerMessage) -> Option<Frame> {
    match message.to_frame() {
        Ok(frame) => Some(frame),
        Err(e) => {
            error!("Failed to serialize message: {}", e);
            None
        }
    }
}

fn deliver(client_id: &ClientId, outbox: &mpsc::Sender<Frame>, frame: Frame) {
    match outbox.try_send(frame) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => debug!("Outbox full for {}, dropping message", client_id),
        Err(TrySendError::Closed(_)) => debug!("Outbox closed for {}", client_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::core::position::Position;

    fn create_test_coordinator() -> (SessionCoordinator, SessionHandle) {
        SessionCoordinator::new(SessionConfig {
            seed: Some(4242),
            ..Default::default()
        })
    }

    fn connect(coordinator: &mut SessionCoordinator, id: &str) -> mpsc::Receiver<Frame> {
        let (tx, rx) = mpsc::channel(64);
        coordinator.handle_command(SessionCommand::Connect {
            client_id: ClientId::from(id),
            outbox: tx,
        });
        rx
    }

    fn drain_frames(rx: &mut mpsc::Receiver<Frame>) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    fn drain(rx: &mut mpsc::Receiver<Frame>) -> Vec<ServerMessage> {
        drain_frames(rx)
            .iter()
            .map(|frame| ServerMessage::from_json(frame).unwrap())
            .collect()
    }

    fn event_name(frame: &Frame) -> String {
        let value: serde_json::Value = serde_json::from_str(frame).unwrap();
        value["event"].as_str().unwrap().to_string()
    }

    fn report(coordinator: &mut SessionCoordinator, id: &str, p: Option<Position>) {
        coordinator.handle_command(SessionCommand::Update {
            client_id: ClientId::from(id),
            update: PositionUpdate { t: Some(1.0), p },
        });
    }

    fn exit_position(coordinator: &SessionCoordinator) -> Position {
        let exit = coordinator.state().maze().exit();
        Position::new(exit.x as f64, exit.y as f64, 0.0)
    }

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.position_broadcast_interval, Duration::from_millis(50));
        assert_eq!(config.win_check_interval, Duration::from_millis(100));
        assert_eq!(config.scoreboard_interval, Duration::from_millis(1000));
        assert_eq!(config.min_dimensions, MazeDimensions::square(11));
        assert_eq!(config.initial_dimensions, MazeDimensions::square(11));
    }

    #[test]
    fn test_connect_sends_map_id_and_scoreboard() {
        let (mut coordinator, _handle) = create_test_coordinator();
        let mut rx = connect(&mut coordinator, "alpha");

        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 3);
        assert!(matches!(&messages[0], ServerMessage::Map(s) if s.width == 11 && s.height == 11));
        assert!(matches!(&messages[1], ServerMessage::Id(id) if id.as_str() == "alpha"));
        match &messages[2] {
            ServerMessage::Scoreboard(board) => {
                assert_eq!(board.get(&ClientId::from("alpha")), Some(&0));
            }
            other => panic!("expected scoreboard, got {:?}", other),
        }
    }

    #[test]
    fn test_connect_broadcasts_scoreboard_to_others() {
        let (mut coordinator, _handle) = create_test_coordinator();
        let mut first = connect(&mut coordinator, "alpha");
        drain(&mut first);

        let _second = connect(&mut coordinator, "beta");

        let messages = drain(&mut first);
        assert_eq!(messages.len(), 1);
        assert!(matches!(&messages[0], ServerMessage::Scoreboard(board) if board.len() == 2));
    }

    #[test]
    fn test_position_broadcast_with_no_clients() {
        let (coordinator, _handle) = create_test_coordinator();
        // Nobody to receive it, but it must not fail.
        coordinator.broadcast_positions();
        assert_eq!(coordinator.state().client_count(), 0);
    }

    #[test]
    fn test_position_broadcast_carries_reports() {
        let (mut coordinator, _handle) = create_test_coordinator();
        let mut rx = connect(&mut coordinator, "alpha");
        drain(&mut rx);

        report(&mut coordinator, "alpha", Some(Position::new(1.0, -1.0, 0.0)));
        coordinator.broadcast_positions();

        let messages = drain(&mut rx);
        match &messages[..] {
            [ServerMessage::Clients(clients)] => {
                let entry = &clients[&ClientId::from("alpha")];
                assert_eq!(entry.t, Some(1.0));
                assert_eq!(entry.p, Some(Position::new(1.0, -1.0, 0.0)));
            }
            other => panic!("unexpected messages {:?}", other),
        }
    }

    #[test]
    fn test_update_from_unknown_client_ignored() {
        let (mut coordinator, _handle) = create_test_coordinator();
        report(&mut coordinator, "ghost", Some(Position::default()));
        assert_eq!(coordinator.state().client_count(), 0);
    }

    #[test]
    fn test_win_scenario() {
        let (mut coordinator, _handle) = create_test_coordinator();
        let mut rx = connect(&mut coordinator, "runner");
        drain(&mut rx);

        let at_exit = exit_position(&coordinator);
        report(&mut coordinator, "runner", Some(at_exit));
        coordinator.run_win_check();

        let messages = drain(&mut rx);
        let winners: Vec<_> = messages
            .iter()
            .filter_map(|m| match m {
                ServerMessage::Winner(id) => Some(id.as_str().to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(winners, vec!["runner".to_string()]);

        assert!(matches!(&messages[0], ServerMessage::Winner(_)));
        match &messages[1] {
            ServerMessage::Map(snapshot) => {
                assert!(snapshot.width >= 11 && snapshot.width % 2 == 1);
                assert!(snapshot.height >= 11 && snapshot.height % 2 == 1);
                assert!(snapshot.walkable_positions.contains(&snapshot.exit));
            }
            other => panic!("expected map, got {:?}", other),
        }
        match &messages[2] {
            ServerMessage::Scoreboard(board) => {
                assert_eq!(board.get(&ClientId::from("runner")), Some(&1));
            }
            other => panic!("expected scoreboard, got {:?}", other),
        }
        assert_eq!(coordinator.state().score(&ClientId::from("runner")), Some(1));
    }

    #[test]
    fn test_win_check_without_winner_is_silent() {
        let (mut coordinator, _handle) = create_test_coordinator();
        let mut rx = connect(&mut coordinator, "idle");
        drain(&mut rx);

        coordinator.run_win_check();
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_disconnect_scenario() {
        let (mut coordinator, _handle) = create_test_coordinator();
        let _gone = connect(&mut coordinator, "a");
        let mut stay = connect(&mut coordinator, "b");
        drain(&mut stay);

        coordinator.handle_command(SessionCommand::Disconnect { client_id: ClientId::from("a") });
        let messages = drain(&mut stay);
        assert!(matches!(&messages[0], ServerMessage::RemoveClient(id) if id.as_str() == "a"));

        coordinator.broadcast_scoreboard();
        let messages = drain(&mut stay);
        match &messages[..] {
            [ServerMessage::Scoreboard(board)] => {
                assert_eq!(board.len(), 1);
                assert_eq!(board.get(&ClientId::from("b")), Some(&0));
            }
            other => panic!("unexpected messages {:?}", other),
        }
    }

    #[test]
    fn test_double_disconnect_broadcasts_once() {
        let (mut coordinator, _handle) = create_test_coordinator();
        let _gone = connect(&mut coordinator, "a");
        let mut stay = connect(&mut coordinator, "b");
        drain(&mut stay);

        coordinator.handle_command(SessionCommand::Disconnect { client_id: ClientId::from("a") });
        coordinator.handle_command(SessionCommand::Disconnect { client_id: ClientId::from("a") });

        let removals = drain(&mut stay)
            .into_iter()
            .filter(|m| matches!(m, ServerMessage::RemoveClient(_)))
            .count();
        assert_eq!(removals, 1);
    }

    #[test]
    fn test_full_outbox_does_not_block() {
        let (mut coordinator, _handle) = create_test_coordinator();
        let (tx, _rx) = mpsc::channel(1);
        coordinator.handle_command(SessionCommand::Connect {
            client_id: ClientId::from("slow"),
            outbox: tx,
        });

        for _ in 0..10 {
            coordinator.broadcast_positions();
        }
        assert_eq!(coordinator.state().client_count(), 1);
    }

    #[test]
    fn test_win_broadcast_shares_one_map_frame() {
        let (mut coordinator, _handle) = create_test_coordinator();
        let mut outboxes: Vec<_> = (0..20)
            .map(|i| connect(&mut coordinator, &format!("c{i:02}")))
            .collect();
        for rx in &mut outboxes {
            drain(rx);
        }

        let at_exit = exit_position(&coordinator);
        report(&mut coordinator, "c00", Some(at_exit));
        coordinator.run_win_check();

        let maps: Vec<Frame> = outboxes
            .iter_mut()
            .map(|rx| {
                drain_frames(rx)
                    .into_iter()
                    .find(|frame| event_name(frame) == "map")
                    .unwrap()
            })
            .collect();
        assert_eq!(maps.len(), 20);
        assert!(maps.iter().all(|frame| Arc::ptr_eq(frame, &maps[0])));

        // A later joiner reuses the cached frame for the current maze.
        let mut late = connect(&mut coordinator, "late");
        let joined = drain_frames(&mut late);
        assert!(Arc::ptr_eq(&joined[0], &maps[0]));
    }

    #[test]
    fn test_position_broadcast_shares_one_frame() {
        let (mut coordinator, _handle) = create_test_coordinator();
        let mut a = connect(&mut coordinator, "a");
        let mut b = connect(&mut coordinator, "b");
        drain(&mut a);
        drain(&mut b);

        coordinator.broadcast_positions();

        let from_a = drain_frames(&mut a);
        let from_b = drain_frames(&mut b);
        assert_eq!((from_a.len(), from_b.len()), (1, 1));
        assert!(Arc::ptr_eq(&from_a[0], &from_b[0]));
        assert_eq!(event_name(&from_a[0]), "clients");
    }

    #[test]
    fn test_same_seed_same_first_maze() {
        let (first, _h1) = create_test_coordinator();
        let (second, _h2) = create_test_coordinator();
        assert_eq!(first.state().maze(), second.state().maze());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_cadence() {
        let start = Instant::now();
        let (handle, _task) = SessionCoordinator::spawn(SessionConfig {
            seed: Some(31),
            ..Default::default()
        });

        let (tx, mut rx) = mpsc::channel(256);
        let runner = ClientId::from("runner");
        handle.connect(runner.clone(), tx).await.unwrap();
        let exit = handle.map_snapshot().await.unwrap().exit;
        handle
            .update_position(runner.clone(), PositionUpdate {
                t: Some(1.0),
                p: Some(Position::new(exit.x as f64, exit.y as f64, 0.0)),
            })
            .await
            .unwrap();

        // (event, ms since start) for everything up to the first periodic scoreboard.
        let mut seen: Vec<(String, u128)> = Vec::new();
        while let Some(frame) = rx.recv().await {
            let elapsed = start.elapsed().as_millis();
            let name = event_name(&frame);
            let done = name == "scoreboard" && elapsed >= 1000;
            seen.push((name, elapsed));
            if done {
                break;
            }
        }

        let times = |event: &str| -> Vec<u128> {
            seen.iter().filter(|(n, _)| n == event).map(|(_, t)| *t).collect()
        };
        let near = |actual: u128, expected: u128| actual >= expected && actual <= expected + 2;

        let clients = times("clients");
        assert!(near(clients[0], 50), "first clients at {}ms", clients[0]);
        assert!(near(clients[1], 100), "second clients at {}ms", clients[1]);

        let winners = times("winner");
        assert!(near(winners[0], 100), "winner at {}ms", winners[0]);

        let scoreboards = times("scoreboard");
        assert!(near(scoreboards[0], 0), "connect scoreboard at {}ms", scoreboards[0]);
        assert!(scoreboards.iter().any(|t| near(*t, 100)), "no scoreboard after the win");
        assert!(near(*scoreboards.last().unwrap(), 1000));
        assert!(!scoreboards.iter().any(|t| *t > 2 && *t < 100), "scoreboard before any tick");
    }

    #[tokio::test]
    async fn test_handle_round_trip() {
        let (handle, task) = SessionCoordinator::spawn(SessionConfig {
            seed: Some(7),
            ..Default::default()
        });

        let (tx, mut rx) = mpsc::channel(64);
        handle.connect(ClientId::from("alpha"), tx).await.unwrap();

        let first = ServerMessage::from_json(&rx.recv().await.unwrap()).unwrap();
        let ServerMessage::Map(pushed) = first else { panic!("expected map first") };

        let queried = handle.map_snapshot().await.unwrap();
        assert_eq!(queried, pushed);

        // Periodic position broadcast eventually arrives.
        let clients = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let frame = rx.recv().await.unwrap();
                if let Ok(ServerMessage::Clients(c)) = ServerMessage::from_json(&frame) {
                    return c;
                }
            }
        })
        .await
        .unwrap();
        assert!(clients.contains_key(&ClientId::from("alpha")));

        drop(handle);
        tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_closed_coordinator_reports_error() {
        let (coordinator, handle) = create_test_coordinator();
        drop(coordinator);

        let result = handle.disconnect(ClientId::from("x")).await;
        assert!(matches!(result, Err(SessionError::CoordinatorClosed)));
    }
}
