use crate::config::ControllerConfig;
use crate::control_system::signal_head::{Direction, HeadId, Phase, SignalDisplay, SignalHead};
use crate::error::{ControllerError, Result};
use crate::global_variables::EVENT_CHANNEL_CAPACITY;
use crate::shared_data::{current_timestamp, ControllerSnapshot, TransitionCause, TransitionEvent};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, Instant};

// Owns one spawned timer task. Dropping the guard aborts the task; the
// generation lets a callback that already fired detect it was superseded.
struct TimerGuard {
    generation: u64,
    task: JoinHandle<()>,
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct ControllerState {
    phase: Phase,
    active_direction: Direction,
    // Last step dispatched along Green -> Yellow -> Red, drives next_state().
    cycle_step: Phase,
    heads: [SignalHead; 4],
    display: Box<dyn SignalDisplay>,
    yellow_timer: Option<TimerGuard>,
    auto_cycle: Option<TimerGuard>,
    generation: u64,
    shut_down: bool,
    events: broadcast::Sender<TransitionEvent>,
}

impl ControllerState {
    fn new(display: Box<dyn SignalDisplay>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let mut state = Self {
            phase: Phase::Green,
            active_direction: Direction::NorthSouth,
            cycle_step: Phase::Red,
            heads: HeadId::ALL.map(SignalHead::new),
            display,
            yellow_timer: None,
            auto_cycle: None,
            generation: 0,
            shut_down: false,
            events,
        };
        state.render();
        state
    }

    // Inactive pair goes red before the active pair changes, so no partial
    // frame ever shows both pairs non-red.
    fn render(&mut self) {
        let inactive = self.active_direction.other();
        let active = self.active_direction;
        let phase = self.phase;
        for (direction, shown) in [(inactive, Phase::Red), (active, phase)] {
            for id in direction.heads() {
                let head = &mut self.heads[head_index(id)];
                head.set_phase(shown, self.display.as_mut());
            }
        }
    }

    fn publish(&mut self, cause: TransitionCause) {
        log::info!(
            "{:?} now {} ({:?})",
            self.active_direction,
            self.phase,
            cause
        );
        let event = TransitionEvent {
            phase: self.phase,
            active_direction: self.active_direction,
            cause,
            timestamp: current_timestamp(),
        };
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn enter_green(&mut self, cause: TransitionCause) {
        self.phase = Phase::Green;
        self.cycle_step = Phase::Green;
        self.render();
        self.publish(cause);
    }

    fn enter_yellow(&mut self, cause: TransitionCause) {
        self.phase = Phase::Yellow;
        self.cycle_step = Phase::Yellow;
        self.render();
        self.publish(cause);
    }

    // Direction flip and the new pair's green happen in one render pass.
    fn hand_over(&mut self, cause: TransitionCause) {
        self.active_direction = self.active_direction.other();
        self.phase = Phase::Green;
        self.cycle_step = Phase::Red;
        self.render();
        self.publish(cause);
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn cancel_yellow_timer(&mut self) {
        if let Some(timer) = self.yellow_timer.take() {
            log::debug!("Cancelled yellow-expiry timer (generation {})", timer.generation);
        }
    }

    fn cancel_auto_cycle(&mut self) -> bool {
        match self.auto_cycle.take() {
            Some(timer) => {
                log::debug!("Cancelled auto cycle (generation {})", timer.generation);
                true
            }
            None => false,
        }
    }

    fn owns_auto_cycle(&self, generation: u64) -> bool {
        matches!(&self.auto_cycle, Some(timer) if timer.generation == generation)
    }

    fn fire_yellow_expiry(&mut self, generation: u64) {
        match &self.yellow_timer {
            Some(timer) if timer.generation == generation => {}
            _ => {
                log::debug!("Ignoring stale yellow-expiry timer (generation {})", generation);
                return;
            }
        }
        self.yellow_timer = None;
        self.hand_over(TransitionCause::YellowExpiry);
    }

    fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            phase: self.phase,
            active_direction: self.active_direction,
            auto_mode: self.auto_cycle.is_some(),
            yellow_timer_pending: self.yellow_timer.is_some(),
            heads: self.heads.iter().map(|h| (h.id(), h.phase())).collect(),
        }
    }
}

fn head_index(id: HeadId) -> usize {
    match id {
        HeadId::North => 0,
        HeadId::South => 1,
        HeadId::East => 2,
        HeadId::West => 3,
    }
}

fn lock_state(inner: &Mutex<ControllerState>) -> MutexGuard<'_, ControllerState> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives the four signal heads of a two-pair intersection.
///
/// Cloning yields another handle to the same controller. Every operation,
/// whether a manual command or a fired timer, runs under one lock, so
/// transitions are strictly serialized. Timer tasks hold only a weak
/// reference; once the last handle is dropped every pending timer is
/// aborted.
///
/// Any manual transition (`change_to_*`, `next_state`) cancels a running
/// auto cycle before it acts. Manual commands and the cycle never race.
#[derive(Clone)]
pub struct IntersectionController {
    inner: Arc<Mutex<ControllerState>>,
    runtime: Handle,
    config: ControllerConfig,
}

impl IntersectionController {
    /// Creates a controller on the current Tokio runtime with north-south
    /// green and east-west red.
    pub fn new(config: ControllerConfig, display: impl SignalDisplay + 'static) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| ControllerError::NoRuntime)?;
        Self::with_runtime(runtime, config, display)
    }

    /// Creates a controller whose timers run on `runtime`. Commands may then
    /// be issued from threads outside the runtime.
    pub fn with_runtime(
        runtime: Handle,
        config: ControllerConfig,
        display: impl SignalDisplay + 'static,
    ) -> Result<Self> {
        config.validate()?;
        let state = ControllerState::new(Box::new(display));
        Ok(Self {
            inner: Arc::new(Mutex::new(state)),
            runtime,
            config,
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        lock_state(&self.inner)
    }

    // Shared entry for every manual transition. Returns None once shut down.
    fn manual(&self) -> Option<MutexGuard<'_, ControllerState>> {
        let mut state = self.lock();
        if state.shut_down {
            log::warn!("Ignoring command, controller is shut down");
            return None;
        }
        if state.cancel_auto_cycle() {
            log::info!("Manual command overrides auto mode");
        }
        Some(state)
    }

    fn dispatch(&self, state: &mut ControllerState, step: Phase) {
        match step {
            Phase::Green => {
                state.cancel_yellow_timer();
                state.enter_green(TransitionCause::Manual);
            }
            Phase::Yellow => {
                state.enter_yellow(TransitionCause::Manual);
                self.arm_yellow_timer(state);
            }
            Phase::Red => {
                state.cancel_yellow_timer();
                state.hand_over(TransitionCause::Manual);
            }
        }
    }

    // Replaces any pending yellow timer, so at most one expiry is ever armed.
    fn arm_yellow_timer(&self, state: &mut ControllerState) {
        state.cancel_yellow_timer();
        let generation = state.next_generation();
        let inner = Arc::downgrade(&self.inner);
        let delay = self.config.yellow();
        let task = self.runtime.spawn(async move {
            sleep(delay).await;
            if let Some(inner) = inner.upgrade() {
                lock_state(&inner).fire_yellow_expiry(generation);
            }
        });
        state.yellow_timer = Some(TimerGuard { generation, task });
    }

    /// Shows green for the active direction. Green never expires on its own.
    pub fn change_to_green(&self) {
        if let Some(mut state) = self.manual() {
            self.dispatch(&mut state, Phase::Green);
        }
    }

    /// Shows yellow for the active direction and arms the yellow-expiry
    /// timer, replacing any timer a previous call armed.
    pub fn change_to_yellow(&self) {
        if let Some(mut state) = self.manual() {
            self.dispatch(&mut state, Phase::Yellow);
        }
    }

    /// Hands the intersection over: the other pair becomes active and green.
    pub fn change_to_red(&self) {
        if let Some(mut state) = self.manual() {
            self.dispatch(&mut state, Phase::Red);
        }
    }

    /// Dispatches the step after the last one along Green -> Yellow -> Red.
    ///
    /// The controller remembers the last step it dispatched, not the current
    /// phase: a fresh controller starts after Red, so its first call
    /// dispatches Green even though north-south already shows green.
    pub fn next_state(&self) {
        if let Some(mut state) = self.manual() {
            let step = state.cycle_step.next();
            self.dispatch(&mut state, step);
        }
    }

    /// Starts the repeating cycle, restarting it if one is already running.
    pub fn start_auto_mode(&self) {
        let mut state = self.lock();
        if state.shut_down {
            log::warn!("Ignoring auto mode start, controller is shut down");
            return;
        }
        if state.cancel_auto_cycle() {
            log::info!("Restarting auto mode");
        }
        state.cancel_yellow_timer();

        let generation = state.next_generation();
        let started = Instant::now();
        state.enter_green(TransitionCause::AutoCycle);

        let inner = Arc::downgrade(&self.inner);
        let task = self
            .runtime
            .spawn(run_auto_cycle(inner, generation, started, self.config));
        state.auto_cycle = Some(TimerGuard { generation, task });
        log::info!("Auto mode started");
    }

    /// Cancels the auto cycle and any pending yellow expiry. Nothing changes
    /// automatically after this returns.
    pub fn stop_auto_mode(&self) {
        let mut state = self.lock();
        let was_running = state.cancel_auto_cycle();
        state.cancel_yellow_timer();
        if was_running {
            log::info!("Auto mode stopped");
        }
    }

    /// Cancels every timer; later commands are ignored.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        state.cancel_auto_cycle();
        state.cancel_yellow_timer();
        state.shut_down = true;
        log::info!("Controller shut down");
    }

    pub fn get_state(&self) -> ControllerSnapshot {
        self.lock().snapshot()
    }

    pub fn get_phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn active_direction(&self) -> Direction {
        self.lock().active_direction
    }

    pub fn is_auto_mode(&self) -> bool {
        self.lock().auto_cycle.is_some()
    }

    /// Receives every transition published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<TransitionEvent> {
        self.lock().events.subscribe()
    }
}

// Green for `green`, yellow for `yellow`, then hand over; repeated. Deadlines
// are measured from `started` so the period does not drift.
async fn run_auto_cycle(
    inner: Weak<Mutex<ControllerState>>,
    generation: u64,
    started: Instant,
    config: ControllerConfig,
) {
    let mut step_start = started;
    loop {
        sleep_until(step_start + config.green()).await;
        if !apply_cycle_step(&inner, generation, Phase::Yellow) {
            return;
        }
        step_start += config.continuation();
        sleep_until(step_start).await;
        if !apply_cycle_step(&inner, generation, Phase::Red) {
            return;
        }
    }
}

fn apply_cycle_step(inner: &Weak<Mutex<ControllerState>>, generation: u64, step: Phase) -> bool {
    let Some(inner) = inner.upgrade() else {
        return false;
    };
    let mut state = lock_state(&inner);
    if !state.owns_auto_cycle(generation) {
        log::debug!("Ignoring stale auto cycle step (generation {})", generation);
        return false;
    }
    match step {
        Phase::Green => state.enter_green(TransitionCause::AutoCycle),
        Phase::Yellow => state.enter_yellow(TransitionCause::AutoCycle),
        Phase::Red => state.hand_over(TransitionCause::AutoCycle),
    }
    true
}
