//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a combat session
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays and scripted verification only work if a session is fully
//! deterministic. Sources of non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`skirmish_core::math::Fixed`]
//!   throughout, including the ray-casting trigonometry.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Participants live in a `Vec` in registration order.
//!
//! - **Wall-clock input timing**: The host hands in one input frame per
//!   tick, so a recorded frame list replays exactly.

use std::thread;

use skirmish_core::input::InputFrame;
use skirmish_core::session::CombatSession;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic session).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the session was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Session is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of ticks per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one tick (gets the tick index)
/// * `hash` - Function to compute the state hash
///
/// # Example
///
/// ```ignore
/// use skirmish_test_utils::determinism::verify_determinism;
/// use skirmish_test_utils::fixtures::{abc_session, started};
///
/// let result = verify_determinism(
///     5,
///     100,
///     || started(abc_session()),
///     |session, _| { session.tick(&InputFrame::idle()); },
///     |session| session.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for tick in 0..ticks {
            step(&mut state, tick);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Feed the same frame script to `runs` fresh sessions and compare hashes.
///
/// Frames are reused cyclically if the script is shorter than `ticks`.
pub fn verify_script_determinism<F>(
    setup_fn: F,
    frames: &[InputFrame],
    runs: usize,
) -> DeterminismResult
where
    F: Fn() -> CombatSession,
{
    verify_determinism(
        runs,
        frames.len() as u64,
        setup_fn,
        |session, tick| {
            if let Some(frame) = usize::try_from(tick).ok().and_then(|i| frames.get(i)) {
                session.tick(frame);
            }
        },
        CombatSession::state_hash,
    )
}

/// Run N sessions on scoped threads with the same frame script.
///
/// Returns one final hash per session.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_sessions_scoped<F>(
    setup_fn: F,
    frames: &[InputFrame],
    num_sessions: usize,
) -> Vec<u64>
where
    F: Fn() -> CombatSession + Sync,
{
    thread::scope(|s| {
        let handles: Vec<_> = (0..num_sessions)
            .map(|_| {
                s.spawn(|| {
                    let mut session = setup_fn();
                    for frame in frames {
                        session.tick(frame);
                    }
                    session.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|_| panic!("session thread panicked")))
            .collect()
    })
}

/// Compare two sessions frame by frame, finding the first divergence.
///
/// # Returns
///
/// `None` if both sessions stay identical, `Some(n)` if they differ
/// after `n` frames (0 means the initial states already differ).
pub fn find_first_divergence<F>(setup_fn: F, frames: &[InputFrame]) -> Option<u64>
where
    F: Fn() -> CombatSession,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for (n, frame) in (1u64..).zip(frames) {
        first.tick(frame);
        second.tick(frame);

        if first.state_hash() != second.state_hash() {
            return Some(n);
        }
    }

    None
}

/// Verify that a serialization round-trip preserves the session exactly,
/// and that the restored session keeps evolving identically.
pub fn verify_serialization_determinism<F>(setup_fn: F, frames: &[InputFrame]) -> bool
where
    F: Fn() -> CombatSession,
{
    let (before, after) = frames.split_at(frames.len() / 2);

    let mut session = setup_fn();
    for frame in before {
        session.tick(frame);
    }

    let Ok(bytes) = session.serialize() else {
        return false;
    };
    let Ok(mut restored) = CombatSession::deserialize(&bytes) else {
        return false;
    };
    if restored.state_hash() != session.state_hash() {
        return false;
    }

    for frame in after {
        session.tick(frame);
        restored.tick(frame);
    }

    restored.state_hash() == session.state_hash()
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of combat sessions.
pub mod strategies {
    use proptest::prelude::*;
    use skirmish_core::input::{Button, InputEvent, InputFrame, Key};
    use skirmish_core::math::{Fixed, Vec2Fixed};

    /// Generate a coordinate in an arena-sized range, in tenths.
    ///
    /// Range: -8.0 to 8.0
    pub fn arb_coordinate() -> impl Strategy<Value = Fixed> {
        (-80i32..=80i32).prop_map(|tenths| Fixed::from_num(tenths) / Fixed::from_num(10))
    }

    /// Generate a pointer position.
    pub fn arb_pointer() -> impl Strategy<Value = Vec2Fixed> {
        (arb_coordinate(), arb_coordinate()).prop_map(|(x, y)| Vec2Fixed::new(x, y))
    }

    /// Generate a stamina amount between 0 and 20.
    pub fn arb_stamina() -> impl Strategy<Value = Fixed> {
        (0i32..=20i32).prop_map(Fixed::from_num)
    }

    /// Generate a key the core reacts to.
    pub fn arb_key() -> impl Strategy<Value = Key> {
        prop_oneof![
            4 => (0u8..=9u8).prop_map(Key::Digit),
            2 => Just(Key::Cancel),
            1 => Just(Key::EndTurn),
            1 => Just(Key::Announce),
        ]
    }

    /// Generate a single input event.
    pub fn arb_input_event() -> impl Strategy<Value = InputEvent> {
        prop_oneof![
            4 => Just(InputEvent::PointerDown(Button::Primary)),
            1 => Just(InputEvent::PointerUp(Button::Primary)),
            1 => Just(InputEvent::PointerDown(Button::Secondary)),
            4 => arb_key().prop_map(InputEvent::KeyDown),
            2 => arb_key().prop_map(InputEvent::KeyUp),
        ]
    }

    /// Generate one tick's input.
    pub fn arb_input_frame() -> impl Strategy<Value = InputFrame> {
        (arb_pointer(), proptest::collection::vec(arb_input_event(), 0..4))
            .prop_map(|(pointer, events)| InputFrame { pointer, events })
    }

    /// Generate a script of frames.
    pub fn arb_frame_script(max_len: usize) -> impl Strategy<Value = Vec<InputFrame>> {
        proptest::collection::vec(arb_input_frame(), 0..max_len)
    }
}
