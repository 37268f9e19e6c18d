//! Background ambience: eligibility rules and single-instance lifecycle.
//!
//! The controller decides from the timer state and the user's preferences
//! whether ambience should be audible, and keeps at most one playing instance
//! on an [`AmbienceBackend`].

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rodio::Sink;
use tracing::{debug, warn};

use super::context::AudioContext;
use super::error::SoundError;
use super::synth::AmbienceSource;
use crate::types::{AmbiencePlayMode, AmbienceType, Phase};

// ============================================================================
// Backend capability
// ============================================================================

/// A playing ambience instance. Dropping the handle releases it.
pub trait AmbienceHandle {
    fn set_volume(&mut self, volume: f32);
    fn stop(&mut self);
}

/// Something that can start ambience instances.
pub trait AmbienceBackend {
    /// Starts an instance of `kind` at `volume`.
    fn start(&self, kind: AmbienceType, volume: f32) -> Result<Box<dyn AmbienceHandle>, SoundError>;

    /// Short name for logs and status output.
    fn name(&self) -> &'static str;
}

// ============================================================================
// Eligibility
// ============================================================================

/// Inputs to the ambience decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbienceInputs {
    pub enabled: bool,
    pub kind: AmbienceType,
    pub play_mode: AmbiencePlayMode,
    pub volume: f32,
    pub phase: Phase,
    pub is_running: bool,
}

/// Returns true when ambience should be audible.
///
/// Never true while the timer is idle; outside focus only in `Always` mode.
pub fn should_play(inputs: &AmbienceInputs) -> bool {
    inputs.is_running
        && inputs.enabled
        && inputs.kind != AmbienceType::None
        && (inputs.play_mode == AmbiencePlayMode::Always || inputs.phase == Phase::Focus)
}

/// Clamps a volume into `[0, 1]`. NaN becomes silence.
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

// ============================================================================
// AmbienceController
// ============================================================================

/// What a reconcile pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbienceAction {
    /// Nothing to change
    Idle,
    /// A new instance was started
    Started,
    /// The running instance only had its volume updated
    VolumeUpdated,
    /// The running instance was replaced with a different type
    Restarted,
    /// The running instance was stopped
    Stopped,
    /// Starting failed; nothing is playing
    Unavailable,
}

struct ActiveAmbience {
    kind: AmbienceType,
    handle: Box<dyn AmbienceHandle>,
}

/// Owns the single active ambience instance.
pub struct AmbienceController {
    backend: Box<dyn AmbienceBackend>,
    active: Option<ActiveAmbience>,
    volume: f32,
    /// Inputs of the last failed start. No retry until they change.
    failed: Option<AmbienceInputs>,
}

impl AmbienceController {
    pub fn new(backend: Box<dyn AmbienceBackend>) -> Self {
        Self {
            backend,
            active: None,
            volume: 0.0,
            failed: None,
        }
    }

    /// Type of the instance currently playing, if any.
    pub fn active_kind(&self) -> Option<AmbienceType> {
        self.active.as_ref().map(|a| a.kind)
    }

    /// Last applied volume.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Brings the playing instance in line with `inputs`.
    pub fn reconcile(&mut self, inputs: &AmbienceInputs) -> AmbienceAction {
        let volume = clamp_volume(inputs.volume);

        if !should_play(inputs) {
            self.failed = None;
            return if self.stop() {
                AmbienceAction::Stopped
            } else {
                AmbienceAction::Idle
            };
        }

        match self.active_kind() {
            Some(kind) if kind == inputs.kind => {
                if (self.volume - volume).abs() <= f32::EPSILON {
                    return AmbienceAction::Idle;
                }
                if let Some(active) = self.active.as_mut() {
                    active.handle.set_volume(volume);
                }
                self.volume = volume;
                AmbienceAction::VolumeUpdated
            }
            Some(_) => {
                self.stop();
                match self.start(inputs, volume) {
                    AmbienceAction::Started => AmbienceAction::Restarted,
                    other => other,
                }
            }
            None if self.failed.as_ref() == Some(inputs) => AmbienceAction::Idle,
            None => self.start(inputs, volume),
        }
    }

    fn start(&mut self, inputs: &AmbienceInputs, volume: f32) -> AmbienceAction {
        let kind = inputs.kind;
        match self.backend.start(kind, volume) {
            Ok(handle) => {
                debug!("Ambience started: {} ({:.2})", kind.as_str(), volume);
                self.active = Some(ActiveAmbience { kind, handle });
                self.volume = volume;
                self.failed = None;
                AmbienceAction::Started
            }
            Err(e) => {
                warn!("Failed to start ambience '{}': {}", kind.as_str(), e);
                self.failed = Some(*inputs);
                AmbienceAction::Unavailable
            }
        }
    }

    /// Stops the active instance. Returns true if one was playing.
    pub fn stop(&mut self) -> bool {
        match self.active.take() {
            Some(mut active) => {
                active.handle.stop();
                debug!("Ambience stopped: {}", active.kind.as_str());
                true
            }
            None => false,
        }
    }
}

impl Drop for AmbienceController {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// Rodio backend
// ============================================================================

/// Synthesized ambience on the shared rodio output stream.
pub struct RodioAmbienceBackend {
    ctx: Rc<AudioContext>,
}

impl RodioAmbienceBackend {
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no output device exists.
    pub fn new() -> Result<Self, SoundError> {
        Ok(Self {
            ctx: AudioContext::acquire()?,
        })
    }
}

/// Dropping the sink stops its source.
struct RodioAmbienceHandle {
    sink: Sink,
}

impl AmbienceHandle for RodioAmbienceHandle {
    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn stop(&mut self) {
        self.sink.stop();
    }
}

impl AmbienceBackend for RodioAmbienceBackend {
    fn start(&self, kind: AmbienceType, volume: f32) -> Result<Box<dyn AmbienceHandle>, SoundError> {
        let source = AmbienceSource::new(kind).ok_or(SoundError::UnsupportedAmbience(kind))?;
        let sink = self.ctx.new_sink()?;
        sink.set_volume(volume);
        sink.append(source);
        Ok(Box::new(RodioAmbienceHandle { sink }))
    }

    fn name(&self) -> &'static str {
        "rodio"
    }
}

// ============================================================================
// Silent backend
// ============================================================================

/// Backend used when no audio device exists. Instances are tracked but mute.
#[derive(Debug, Default)]
pub struct SilentAmbienceBackend;

struct SilentHandle;

impl AmbienceHandle for SilentHandle {
    fn set_volume(&mut self, _volume: f32) {}
    fn stop(&mut self) {}
}

impl AmbienceBackend for SilentAmbienceBackend {
    fn start(&self, kind: AmbienceType, _volume: f32) -> Result<Box<dyn AmbienceHandle>, SoundError> {
        if kind == AmbienceType::None {
            return Err(SoundError::UnsupportedAmbience(kind));
        }
        Ok(Box::new(SilentHandle))
    }

    fn name(&self) -> &'static str {
        "silent"
    }
}

/// Returns the rodio backend, or the silent one if audio is unavailable.
pub fn create_ambience_backend() -> Box<dyn AmbienceBackend> {
    match RodioAmbienceBackend::new() {
        Ok(backend) => Box::new(backend),
        Err(e) => {
            warn!("Audio not available, ambience muted: {} ({})", e, e.suggestion());
            Box::new(SilentAmbienceBackend)
        }
    }
}

// ============================================================================
// Mock backend
// ============================================================================

/// A call recorded by [`MockAmbienceBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum AmbienceCall {
    Start(AmbienceType, f32),
    SetVolume(AmbienceType, f32),
    Stop(AmbienceType),
}

/// Mock ambience backend for testing.
///
/// Clones share the same call log, so a test can keep one while the
/// controller owns another.
#[derive(Debug, Clone, Default)]
pub struct MockAmbienceBackend {
    calls: Arc<Mutex<Vec<AmbienceCall>>>,
    active: Arc<AtomicUsize>,
    attempts: Arc<AtomicUsize>,
    should_fail: Arc<AtomicBool>,
}

impl MockAmbienceBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Number of instances started and not yet released.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn calls(&self) -> Vec<AmbienceCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of start requests, failed ones included.
    #[must_use]
    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn start_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, AmbienceCall::Start(..)))
            .count()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn record(&self, call: AmbienceCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

struct MockHandle {
    kind: AmbienceType,
    backend: MockAmbienceBackend,
    released: bool,
}

impl MockHandle {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.backend.active.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl AmbienceHandle for MockHandle {
    fn set_volume(&mut self, volume: f32) {
        self.backend.record(AmbienceCall::SetVolume(self.kind, volume));
    }

    fn stop(&mut self) {
        self.backend.record(AmbienceCall::Stop(self.kind));
        self.release();
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl AmbienceBackend for MockAmbienceBackend {
    fn start(&self, kind: AmbienceType, volume: f32) -> Result<Box<dyn AmbienceHandle>, SoundError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SoundError::PlaybackError("Mock failure".to_string()));
        }
        if kind == AmbienceType::None {
            return Err(SoundError::UnsupportedAmbience(kind));
        }
        self.record(AmbienceCall::Start(kind, volume));
        self.active.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockHandle {
            kind,
            backend: self.clone(),
            released: false,
        }))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(kind: AmbienceType, phase: Phase, is_running: bool) -> AmbienceInputs {
        AmbienceInputs {
            enabled: true,
            kind,
            play_mode: AmbiencePlayMode::Focus,
            volume: 0.35,
            phase,
            is_running,
        }
    }

    fn controller() -> (AmbienceController, MockAmbienceBackend) {
        let backend = MockAmbienceBackend::new();
        let controller = AmbienceController::new(Box::new(backend.clone()));
        (controller, backend)
    }

    mod should_play_tests {
        use super::*;

        #[test]
        fn test_idle_never_plays() {
            for phase in [Phase::Focus, Phase::ShortBreak, Phase::LongBreak] {
                for play_mode in [AmbiencePlayMode::Focus, AmbiencePlayMode::Always] {
                    let i = AmbienceInputs {
                        play_mode,
                        ..inputs(AmbienceType::Rain, phase, false)
                    };
                    assert!(!should_play(&i));
                }
            }
        }

        #[test]
        fn test_focus_mode_only_in_focus() {
            assert!(!should_play(&inputs(AmbienceType::Rain, Phase::ShortBreak, true)));
            assert!(should_play(&inputs(AmbienceType::Rain, Phase::Focus, true)));
        }

        #[test]
        fn test_always_mode_plays_in_breaks() {
            let i = AmbienceInputs {
                play_mode: AmbiencePlayMode::Always,
                ..inputs(AmbienceType::Night, Phase::LongBreak, true)
            };
            assert!(should_play(&i));
        }

        #[test]
        fn test_disabled_or_none_never_plays() {
            let i = AmbienceInputs {
                enabled: false,
                ..inputs(AmbienceType::White, Phase::Focus, true)
            };
            assert!(!should_play(&i));
            assert!(!should_play(&inputs(AmbienceType::None, Phase::Focus, true)));
        }

        #[test]
        fn test_clamp_volume() {
            assert_eq!(clamp_volume(-0.5), 0.0);
            assert_eq!(clamp_volume(1.5), 1.0);
            assert_eq!(clamp_volume(0.35), 0.35);
            assert_eq!(clamp_volume(f32::NAN), 0.0);
        }
    }

    mod controller_tests {
        use super::*;

        #[test]
        fn test_start_when_eligible() {
            let (mut ctl, backend) = controller();

            let action = ctl.reconcile(&inputs(AmbienceType::Rain, Phase::Focus, true));

            assert_eq!(action, AmbienceAction::Started);
            assert_eq!(ctl.active_kind(), Some(AmbienceType::Rain));
            assert_eq!(backend.active_count(), 1);
            assert_eq!(backend.calls(), vec![AmbienceCall::Start(AmbienceType::Rain, 0.35)]);
        }

        #[test]
        fn test_same_type_only_updates_volume() {
            let (mut ctl, backend) = controller();
            ctl.reconcile(&inputs(AmbienceType::Rain, Phase::Focus, true));

            let louder = AmbienceInputs {
                volume: 0.8,
                ..inputs(AmbienceType::Rain, Phase::Focus, true)
            };
            assert_eq!(ctl.reconcile(&louder), AmbienceAction::VolumeUpdated);
            assert_eq!(ctl.reconcile(&louder), AmbienceAction::Idle);

            assert_eq!(backend.start_count(), 1);
            assert_eq!(backend.active_count(), 1);
            assert_eq!(ctl.volume(), 0.8);
        }

        #[test]
        fn test_type_change_restarts() {
            let (mut ctl, backend) = controller();
            ctl.reconcile(&inputs(AmbienceType::Rain, Phase::Focus, true));

            let action = ctl.reconcile(&inputs(AmbienceType::Night, Phase::Focus, true));

            assert_eq!(action, AmbienceAction::Restarted);
            assert_eq!(ctl.active_kind(), Some(AmbienceType::Night));
            assert_eq!(backend.active_count(), 1);
            assert_eq!(
                backend.calls(),
                vec![
                    AmbienceCall::Start(AmbienceType::Rain, 0.35),
                    AmbienceCall::Stop(AmbienceType::Rain),
                    AmbienceCall::Start(AmbienceType::Night, 0.35),
                ]
            );
        }

        #[test]
        fn test_pause_stops() {
            let (mut ctl, backend) = controller();
            ctl.reconcile(&inputs(AmbienceType::White, Phase::Focus, true));

            let action = ctl.reconcile(&inputs(AmbienceType::White, Phase::Focus, false));

            assert_eq!(action, AmbienceAction::Stopped);
            assert_eq!(ctl.active_kind(), None);
            assert_eq!(backend.active_count(), 0);
            assert_eq!(
                ctl.reconcile(&inputs(AmbienceType::White, Phase::Focus, false)),
                AmbienceAction::Idle
            );
        }

        #[test]
        fn test_volume_is_clamped() {
            let (mut ctl, backend) = controller();
            let loud = AmbienceInputs {
                volume: 3.0,
                ..inputs(AmbienceType::Rain, Phase::Focus, true)
            };

            ctl.reconcile(&loud);

            assert_eq!(backend.calls(), vec![AmbienceCall::Start(AmbienceType::Rain, 1.0)]);
        }

        #[test]
        fn test_backend_failure_leaves_nothing_active() {
            let (mut ctl, backend) = controller();
            backend.set_should_fail(true);

            let action = ctl.reconcile(&inputs(AmbienceType::Rain, Phase::Focus, true));

            assert_eq!(action, AmbienceAction::Unavailable);
            assert_eq!(ctl.active_kind(), None);
            assert_eq!(backend.active_count(), 0);

            backend.set_should_fail(false);
            assert_eq!(
                ctl.reconcile(&inputs(AmbienceType::White, Phase::Focus, true)),
                AmbienceAction::Started
            );
        }

        /// 起動に失敗した入力のままでは毎 tick 再試行しない
        #[test]
        fn test_failed_start_waits_for_input_change() {
            let (mut ctl, backend) = controller();
            backend.set_should_fail(true);
            let rain = inputs(AmbienceType::Rain, Phase::Focus, true);

            assert_eq!(ctl.reconcile(&rain), AmbienceAction::Unavailable);
            for _ in 0..5 {
                assert_eq!(ctl.reconcile(&rain), AmbienceAction::Idle);
            }
            assert_eq!(backend.attempt_count(), 1);

            let quieter = AmbienceInputs { volume: 0.2, ..rain };
            assert_eq!(ctl.reconcile(&quieter), AmbienceAction::Unavailable);
            assert_eq!(backend.attempt_count(), 2);

            // pausing clears the failure, so resuming tries again
            backend.set_should_fail(false);
            ctl.reconcile(&AmbienceInputs { is_running: false, ..quieter });
            assert_eq!(ctl.reconcile(&quieter), AmbienceAction::Started);
            assert_eq!(backend.attempt_count(), 3);
        }

        #[test]
        fn test_drop_releases_instance() {
            let (mut ctl, backend) = controller();
            ctl.reconcile(&inputs(AmbienceType::Rain, Phase::Focus, true));
            assert_eq!(backend.active_count(), 1);

            drop(ctl);

            assert_eq!(backend.active_count(), 0);
        }

        #[test]
        fn test_never_two_instances() {
            let (mut ctl, backend) = controller();
            let kinds = [
                AmbienceType::Rain,
                AmbienceType::Night,
                AmbienceType::White,
                AmbienceType::Rain,
            ];

            for kind in kinds {
                ctl.reconcile(&inputs(kind, Phase::Focus, true));
                assert!(backend.active_count() <= 1);
            }
            assert_eq!(backend.active_count(), 1);
        }
    }

    mod backend_tests {
        use super::*;

        #[test]
        fn test_silent_backend_rejects_none() {
            let backend = SilentAmbienceBackend;
            assert!(backend.start(AmbienceType::None, 0.5).is_err());
            assert!(backend.start(AmbienceType::Rain, 0.5).is_ok());
            assert_eq!(backend.name(), "silent");
        }

        #[test]
        fn test_create_backend_never_panics() {
            let backend = create_ambience_backend();
            assert!(["rodio", "silent"].contains(&backend.name()));
            AudioContext::shutdown();
        }
    }
}
