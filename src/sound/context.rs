//! Process-wide audio output shared by cue and ambience players.
//!
//! rodio's `OutputStream` is `!Send`, so the shared context lives in a
//! thread-local slot on the daemon thread. It is opened on first use and torn
//! down explicitly with [`AudioContext::shutdown`].

use std::cell::RefCell;
use std::rc::Rc;

use rodio::{OutputStream, OutputStreamHandle, Sink};
use tracing::debug;

use super::error::SoundError;

thread_local! {
    static SHARED: RefCell<Option<Rc<AudioContext>>> = const { RefCell::new(None) };
}

/// An open audio output stream.
pub struct AudioContext {
    /// The audio output stream (must be kept alive for playback).
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl AudioContext {
    /// Returns the shared context, opening the default output device on first use.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no output device can be opened.
    /// A failed attempt is not cached; the next call tries again.
    pub fn acquire() -> Result<Rc<AudioContext>, SoundError> {
        SHARED.with(|slot| {
            let mut slot = slot.borrow_mut();
            if let Some(ctx) = slot.as_ref() {
                return Ok(Rc::clone(ctx));
            }

            let (stream, handle) = OutputStream::try_default()
                .map_err(|e| SoundError::DeviceNotAvailable(e.to_string()))?;
            debug!("Audio output stream initialized");

            let ctx = Rc::new(AudioContext {
                _stream: stream,
                handle,
            });
            *slot = Some(Rc::clone(&ctx));
            Ok(ctx)
        })
    }

    /// Returns true if the shared context is currently open on this thread.
    pub fn is_open() -> bool {
        SHARED.with(|slot| slot.borrow().is_some())
    }

    /// Releases the shared slot.
    ///
    /// The stream closes once every outstanding `Rc` has been dropped.
    pub fn shutdown() {
        let released = SHARED.with(|slot| slot.borrow_mut().take());
        if released.is_some() {
            debug!("Audio output stream released");
        }
    }

    /// Creates a new sink on this output stream.
    pub fn new_sink(&self) -> Result<Sink, SoundError> {
        Sink::try_new(&self.handle).map_err(|e| SoundError::StreamError(e.to_string()))
    }
}

impl std::fmt::Debug for AudioContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioContext").finish_non_exhaustive()
    }
}
