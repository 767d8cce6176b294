//! Asynchronous world regeneration
//!
//! Regenerating the world takes long enough to freeze the display, so
//! it runs on a background thread in a fire-and-poll pattern: the
//! coordinator hands the worker an owned clone of the engine, the
//! worker reports ordered stage messages over an mpsc channel, and the
//! main loop drains the channel non-blockingly once per tick. Nothing
//! is shared by reference across the thread boundary - snapshots and
//! the finished engine travel by value.
//!
//! At most one regeneration is in flight; a request while one is
//! running is rejected. The previous layers stay on screen until the
//! worker's `Done` arrives, so a crashed or timed-out worker never
//! leaves a torn frame.

use crate::world::{EntitySnapshot, TerrainSnapshot, WorldState};
use std::fmt;

#[cfg(not(target_arch = "wasm32"))]
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
#[cfg(not(target_arch = "wasm32"))]
use std::thread;
#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

/// Which sub-phase of a regeneration the main loop is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenStage {
    AwaitingTerrain,
    AwaitingEntities,
}

impl RegenStage {
    /// Human-readable label for the progress overlay.
    pub fn label(&self) -> &'static str {
        match self {
            RegenStage::AwaitingTerrain => "Regenerating terrain...",
            RegenStage::AwaitingEntities => "Regenerating entities...",
        }
    }
}

/// Overlay state machine driven by the coordinator and consumed by the
/// presenter. Exactly one instance exists, owned by the app state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Idle,
    Regenerating(RegenStage),
}

impl OverlayState {
    pub fn is_idle(&self) -> bool {
        matches!(self, OverlayState::Idle)
    }
}

/// Ordered progress signal from the worker. Snapshot payloads ride on
/// the stage messages; `Done` carries the finished engine so the main
/// loop can swap it in wholesale.
#[derive(Debug)]
pub enum StageMessage {
    TerrainReady(TerrainSnapshot),
    EntitiesReady(EntitySnapshot),
    Done(Box<WorldState>),
}

/// Everything a completed regeneration hands back to the main loop.
/// `terrain` is None when the request preserved the existing terrain.
#[derive(Debug)]
pub struct RegenOutcome {
    pub terrain: Option<TerrainSnapshot>,
    pub entities: EntitySnapshot,
    pub world: Box<WorldState>,
}

/// Regeneration error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenError {
    /// A second request arrived while one was in flight; ignored
    AlreadyInProgress,
    /// The worker dropped its channel before sending `Done`
    WorkerDied,
    /// The worker exceeded the configured deadline
    TimedOut,
}

impl fmt::Display for RegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegenError::AlreadyInProgress => write!(f, "regeneration already in progress"),
            RegenError::WorkerDied => write!(f, "regeneration worker died before finishing"),
            RegenError::TimedOut => write!(f, "regeneration timed out"),
        }
    }
}

impl std::error::Error for RegenError {}

/// Result of one per-tick poll (fire-and-poll pattern).
#[derive(Debug)]
pub enum RegenStatus {
    /// No regeneration in flight
    Idle,
    /// Still working; the stage the main loop is waiting on
    Pending(RegenStage),
    /// Finished; the caller swaps the outcome in
    Ready(RegenOutcome),
    /// Gave up; the caller returns to idle and keeps the old layers
    Error(RegenError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Native: background thread + mpsc channel
// ─────────────────────────────────────────────────────────────────────────────

/// One in-flight regeneration: the receive side of the worker channel
/// plus the stage guard that keeps out-of-order messages harmless.
#[cfg(not(target_arch = "wasm32"))]
struct Inflight {
    receiver: Receiver<StageMessage>,
    preserve_terrain: bool,
    started: Instant,
    stage: RegenStage,
    terrain: Option<TerrainSnapshot>,
    entities: Option<EntitySnapshot>,
}

#[cfg(not(target_arch = "wasm32"))]
impl Inflight {
    /// Apply one message under the stage guard. A message that does not
    /// match the awaited stage (out-of-order delivery, duplicates) is
    /// dropped without effect. Returns the outcome once `Done` lands
    /// after a valid `EntitiesReady`.
    fn apply(&mut self, message: StageMessage) -> Option<RegenOutcome> {
        match message {
            StageMessage::TerrainReady(snapshot) => {
                if self.stage == RegenStage::AwaitingTerrain && !self.preserve_terrain {
                    self.terrain = Some(snapshot);
                    self.stage = RegenStage::AwaitingEntities;
                }
                None
            }
            StageMessage::EntitiesReady(snapshot) => {
                if self.stage == RegenStage::AwaitingEntities && self.entities.is_none() {
                    self.entities = Some(snapshot);
                }
                None
            }
            StageMessage::Done(world) => self.entities.take().map(|entities| RegenOutcome {
                terrain: self.terrain.take(),
                entities,
                world,
            }),
        }
    }
}

/// Coordinator for the one-at-a-time background regeneration.
#[cfg(not(target_arch = "wasm32"))]
pub struct RegenCoordinator {
    inflight: Option<Inflight>,
    timeout: Duration,
}

#[cfg(not(target_arch = "wasm32"))]
impl RegenCoordinator {
    pub fn new(timeout: Duration) -> Self {
        Self { inflight: None, timeout }
    }

    /// Whether a regeneration is currently in flight.
    pub fn is_regenerating(&self) -> bool {
        self.inflight.is_some()
    }

    /// Launch a regeneration on a background thread. The worker owns an
    /// independent clone of the engine; the caller's copy stays valid
    /// until the outcome is swapped in.
    pub fn start(&mut self, world: &WorldState, preserve_terrain: bool) -> Result<(), RegenError> {
        if self.inflight.is_some() {
            return Err(RegenError::AlreadyInProgress);
        }
        let mut world = world.clone();
        self.start_with_worker(preserve_terrain, move |sender| {
            if !preserve_terrain {
                world.regenerate_terrain();
                let _ = sender.send(StageMessage::TerrainReady(world.terrain_snapshot()));
            }
            world.regenerate_entities();
            let _ = sender.send(StageMessage::EntitiesReady(world.entity_snapshot()));
            let _ = sender.send(StageMessage::Done(Box::new(world)));
        })
    }

    /// Launch with a caller-supplied worker. This is the seam the tests
    /// use to feed the stage guard hostile message orders.
    pub fn start_with_worker<F>(&mut self, preserve_terrain: bool, worker: F) -> Result<(), RegenError>
    where
        F: FnOnce(Sender<StageMessage>) + Send + 'static,
    {
        if self.inflight.is_some() {
            return Err(RegenError::AlreadyInProgress);
        }
        let (sender, receiver) = channel();
        thread::spawn(move || worker(sender));
        self.inflight = Some(Inflight {
            receiver,
            preserve_terrain,
            started: Instant::now(),
            stage: if preserve_terrain {
                RegenStage::AwaitingEntities
            } else {
                RegenStage::AwaitingTerrain
            },
            terrain: None,
            entities: None,
        });
        Ok(())
    }

    /// Drain the worker channel without blocking. Call once per tick.
    pub fn poll(&mut self) -> RegenStatus {
        let Some(mut inflight) = self.inflight.take() else {
            return RegenStatus::Idle;
        };

        loop {
            match inflight.receiver.try_recv() {
                Ok(message) => {
                    if let Some(outcome) = inflight.apply(message) {
                        return RegenStatus::Ready(outcome);
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    // Worker panicked or dropped the sender without Done
                    return RegenStatus::Error(RegenError::WorkerDied);
                }
            }
        }

        if inflight.started.elapsed() >= self.timeout {
            // Abandon the worker; its later sends go nowhere
            return RegenStatus::Error(RegenError::TimedOut);
        }

        let stage = inflight.stage;
        self.inflight = Some(inflight);
        RegenStatus::Pending(stage)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// WASM: no threads, regeneration runs synchronously on start
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(target_arch = "wasm32")]
pub struct RegenCoordinator {
    finished: Option<RegenOutcome>,
}

#[cfg(target_arch = "wasm32")]
impl RegenCoordinator {
    pub fn new(_timeout: std::time::Duration) -> Self {
        Self { finished: None }
    }

    pub fn is_regenerating(&self) -> bool {
        self.finished.is_some()
    }

    pub fn start(&mut self, world: &WorldState, preserve_terrain: bool) -> Result<(), RegenError> {
        if self.finished.is_some() {
            return Err(RegenError::AlreadyInProgress);
        }
        let mut world = world.clone();
        world.regenerate(preserve_terrain);
        let terrain = (!preserve_terrain).then(|| world.terrain_snapshot());
        let entities = world.entity_snapshot();
        self.finished = Some(RegenOutcome {
            terrain,
            entities,
            world: Box::new(world),
        });
        Ok(())
    }

    pub fn poll(&mut self) -> RegenStatus {
        match self.finished.take() {
            Some(outcome) => RegenStatus::Ready(outcome),
            None => RegenStatus::Idle,
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::config::WorldConfig;

    fn small_world() -> WorldState {
        WorldState::generate(&WorldConfig {
            width: 24,
            height: 24,
            depth: 10,
            entity_count: 4,
            spawn_zone: (2, 2, 20, 20),
            expected_death_age: 100,
            seed: Some(3),
        })
    }

    fn coordinator() -> RegenCoordinator {
        RegenCoordinator::new(Duration::from_secs(10))
    }

    /// Poll until the coordinator leaves Pending, with a test deadline.
    fn poll_to_completion(coordinator: &mut RegenCoordinator) -> RegenStatus {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match coordinator.poll() {
                RegenStatus::Pending(_) => {
                    assert!(Instant::now() < deadline, "regeneration never finished");
                    thread::sleep(Duration::from_millis(1));
                }
                status => return status,
            }
        }
    }

    #[test]
    fn test_full_regeneration_completes() {
        let world = small_world();
        let mut coordinator = coordinator();
        coordinator.start(&world, false).unwrap();

        match poll_to_completion(&mut coordinator) {
            RegenStatus::Ready(outcome) => {
                let terrain = outcome.terrain.expect("full regen produces terrain");
                assert!(terrain.shape_matches());
                assert_eq!(outcome.entities.len(), 4);
                assert_eq!(outcome.world.tick(), 0);
            }
            other => panic!("expected Ready, got {:?}", other),
        }
        assert!(!coordinator.is_regenerating());
    }

    #[test]
    fn test_preserve_terrain_sends_no_terrain() {
        let world = small_world();
        let mut coordinator = coordinator();
        coordinator.start(&world, true).unwrap();

        match poll_to_completion(&mut coordinator) {
            RegenStatus::Ready(outcome) => {
                assert!(outcome.terrain.is_none());
                assert_eq!(outcome.entities.len(), 4);
            }
            other => panic!("expected Ready, got {:?}", other),
        }
    }

    #[test]
    fn test_second_request_rejected_while_in_flight() {
        let world = small_world();
        let mut coordinator = coordinator();
        // Worker that never finishes while we check the gate
        coordinator
            .start_with_worker(false, |sender| {
                thread::sleep(Duration::from_millis(100));
                drop(sender);
            })
            .unwrap();

        assert_eq!(coordinator.start(&world, false), Err(RegenError::AlreadyInProgress));
        assert!(coordinator.is_regenerating());
    }

    #[test]
    fn test_out_of_order_and_duplicate_messages_are_dropped() {
        let world = small_world();
        let terrain = world.terrain_snapshot();
        let entities = world.entity_snapshot();
        let boxed = Box::new(world);

        let mut coordinator = coordinator();
        coordinator
            .start_with_worker(false, move |sender| {
                // Hostile order: entities first, a premature Done, then a
                // valid sequence with a duplicated TerrainReady.
                let _ = sender.send(StageMessage::EntitiesReady(entities.clone()));
                let _ = sender.send(StageMessage::Done(boxed.clone()));
                let _ = sender.send(StageMessage::TerrainReady(terrain.clone()));
                let _ = sender.send(StageMessage::TerrainReady(terrain));
                let _ = sender.send(StageMessage::EntitiesReady(entities));
                let _ = sender.send(StageMessage::Done(boxed));
            })
            .unwrap();

        match poll_to_completion(&mut coordinator) {
            RegenStatus::Ready(outcome) => {
                assert!(outcome.terrain.is_some());
                assert_eq!(outcome.entities.len(), 4);
            }
            other => panic!("expected Ready, got {:?}", other),
        }
        // Terminal state reached: nothing left in flight
        assert!(!coordinator.is_regenerating());
        assert!(matches!(coordinator.poll(), RegenStatus::Idle));
    }

    #[test]
    fn test_terrain_message_dropped_when_preserving() {
        let world = small_world();
        let terrain = world.terrain_snapshot();
        let entities = world.entity_snapshot();
        let boxed = Box::new(world);

        let mut coordinator = coordinator();
        coordinator
            .start_with_worker(true, move |sender| {
                let _ = sender.send(StageMessage::TerrainReady(terrain));
                let _ = sender.send(StageMessage::EntitiesReady(entities));
                let _ = sender.send(StageMessage::Done(boxed));
            })
            .unwrap();

        match poll_to_completion(&mut coordinator) {
            RegenStatus::Ready(outcome) => assert!(outcome.terrain.is_none()),
            other => panic!("expected Ready, got {:?}", other),
        }
    }

    #[test]
    fn test_worker_death_is_reported_once() {
        let mut coordinator = coordinator();
        coordinator.start_with_worker(false, |sender| drop(sender)).unwrap();

        match poll_to_completion(&mut coordinator) {
            RegenStatus::Error(RegenError::WorkerDied) => {}
            other => panic!("expected WorkerDied, got {:?}", other),
        }
        assert!(matches!(coordinator.poll(), RegenStatus::Idle));
    }

    #[test]
    fn test_timeout_returns_to_idle() {
        let mut coordinator = RegenCoordinator::new(Duration::from_millis(10));
        coordinator
            .start_with_worker(false, |sender| {
                thread::sleep(Duration::from_millis(500));
                drop(sender);
            })
            .unwrap();

        thread::sleep(Duration::from_millis(20));
        match coordinator.poll() {
            RegenStatus::Error(RegenError::TimedOut) => {}
            other => panic!("expected TimedOut, got {:?}", other),
        }
        assert!(matches!(coordinator.poll(), RegenStatus::Idle));
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(RegenStage::AwaitingTerrain.label(), "Regenerating terrain...");
        assert_eq!(RegenStage::AwaitingEntities.label(), "Regenerating entities...");
        assert!(OverlayState::Idle.is_idle());
        assert!(!OverlayState::Regenerating(RegenStage::AwaitingTerrain).is_idle());
    }
}
