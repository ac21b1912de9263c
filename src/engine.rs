use crate::Error;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;
use std::time::Duration;

/// State change reported by a [`PlaybackEngine`] to its listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// The engine started or stopped advancing playback.
    IsPlayingChanged(bool),
    /// The last item of the playlist reached its end.
    Ended,
    /// The engine hit an error it could not recover from.
    Error(String),
}

/// Callback registered with [`PlaybackEngine::add_listener`].
pub type Listener = Box<dyn FnMut(&PlaybackEvent)>;

/// Identifies a registered [`Listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// The media engine a [`Surface`](crate::Surface) drives.
///
/// Decoding and rendering stay inside the engine; the surface only issues
/// transport commands and queries state. Media items are addressed by playlist index.
pub trait PlaybackEngine {
    fn play(&mut self) -> Result<(), Error>;

    fn pause(&mut self) -> Result<(), Error>;

    /// Jumps to `position` within the playlist item at `index`.
    fn seek(&mut self, index: usize, position: Duration) -> Result<(), Error>;

    /// Loads the current item so that playback can start.
    fn prepare(&mut self) -> Result<(), Error>;

    fn current_position(&self) -> Result<Duration, Error>;

    /// Duration of the current item, zero when unknown (e.g. live sources).
    fn duration(&self) -> Result<Duration, Error>;

    fn current_index(&self) -> Result<usize, Error>;

    fn is_playing(&self) -> Result<bool, Error>;

    fn add_listener(&mut self, listener: Listener) -> ListenerId;

    fn remove_listener(&mut self, id: ListenerId);

    /// Frees the engine. Every later call may fail with [`Error::Released`].
    fn release(&mut self) -> Result<(), Error>;

    /// Dispatches pending engine state to listeners.
    ///
    /// Called on the UI thread before each surface update; engines that notify
    /// listeners synchronously can keep the default.
    fn pump_events(&mut self) {}
}

struct Slot<E: PlaybackEngine> {
    engine: RefCell<E>,
    released: Cell<bool>,
}

impl<E: PlaybackEngine> Drop for Slot<E> {
    fn drop(&mut self) {
        if !self.released.get() {
            if let Err(err) = self.engine.get_mut().release() {
                log::error!("failed to release playback engine on drop: {err}");
            }
        }
    }
}

/// Shared handle to a [`PlaybackEngine`].
///
/// The surface and the embedding application may both hold a handle. The
/// engine is released at most once: explicitly through [`EngineHandle::release`],
/// or when the last handle is dropped.
pub struct EngineHandle<E: PlaybackEngine>(Rc<Slot<E>>);

impl<E: PlaybackEngine> Clone for EngineHandle<E> {
    fn clone(&self) -> Self {
        EngineHandle(Rc::clone(&self.0))
    }
}

impl<E: PlaybackEngine> EngineHandle<E> {
    pub fn new(engine: E) -> Self {
        EngineHandle(Rc::new(Slot {
            engine: RefCell::new(engine),
            released: Cell::new(false),
        }))
    }

    /// Borrows the engine.
    ///
    /// # Panics
    ///
    /// Panics if the engine is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, E> {
        self.0.engine.borrow()
    }

    /// Mutably borrows the engine.
    ///
    /// # Panics
    ///
    /// Panics if the engine is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, E> {
        self.0.engine.borrow_mut()
    }

    /// Releases the engine unless it already was.
    ///
    /// Returns `true` if this call performed the release.
    pub fn release(&self) -> Result<bool, Error> {
        if self.0.released.replace(true) {
            return Ok(false);
        }
        self.0.engine.borrow_mut().release()?;
        Ok(true)
    }

    pub fn is_released(&self) -> bool {
        self.0.released.get()
    }

    /// Whether no other handle to this engine exists.
    pub fn is_sole_owner(&self) -> bool {
        Rc::strong_count(&self.0) == 1
    }
}

impl<E: PlaybackEngine> From<E> for EngineHandle<E> {
    fn from(engine: E) -> Self {
        EngineHandle::new(engine)
    }
}
