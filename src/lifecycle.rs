//! Host lifecycle notifications and the playback state that survives them.

use crate::engine::{EngineHandle, Listener, ListenerId, PlaybackEngine};
use crate::Error;
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Foreground transitions of the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Resume,
    Pause,
}

pub trait LifecycleObserver {
    fn on_lifecycle(&self, event: LifecycleEvent) -> Result<(), Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Synchronous lifecycle notifier owned by the host.
///
/// Observers are held weakly and pruned once dropped.
#[derive(Default)]
pub struct Lifecycle {
    observers: Vec<(ObserverId, Weak<dyn LifecycleObserver>)>,
    next_id: u64,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer<O>(&mut self, observer: &Rc<O>) -> ObserverId
    where
        O: LifecycleObserver + 'static,
    {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        let observer = Rc::downgrade(observer);
        let observer: Weak<dyn LifecycleObserver> = observer;
        self.observers.push((id, observer));
        id
    }

    pub fn remove_observer(&mut self, id: ObserverId) {
        self.observers.retain(|(observer, _)| *observer != id);
    }

    pub fn observer_count(&self) -> usize {
        self.observers
            .iter()
            .filter(|(_, observer)| observer.strong_count() > 0)
            .count()
    }

    /// Notifies every live observer in registration order.
    ///
    /// All observers are notified even if one fails; the first error is returned.
    pub fn dispatch(&mut self, event: LifecycleEvent) -> Result<(), Error> {
        log::debug!("lifecycle {event:?}");
        self.observers
            .retain(|(_, observer)| observer.strong_count() > 0);
        let live: Vec<_> = self
            .observers
            .iter()
            .filter_map(|(_, observer)| observer.upgrade())
            .collect();

        let mut result = Ok(());
        for observer in live {
            if let Err(err) = observer.on_lifecycle(event) {
                log::error!("lifecycle observer failed on {event:?}: {err}");
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result
    }
}

/// Playback state captured when the host backgrounds or the surface is disposed.
///
/// Hand it back through [`Surface::with_resume_state`](crate::Surface::with_resume_state)
/// to continue where a previous surface stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeState {
    pub auto_play: bool,
    pub media_index: usize,
    pub position: Duration,
    pub is_first_attach: bool,
}

impl Default for ResumeState {
    fn default() -> Self {
        ResumeState {
            auto_play: true,
            media_index: 0,
            position: Duration::ZERO,
            is_first_attach: true,
        }
    }
}

/// Keeps a playback engine in step with the host lifecycle.
pub(crate) struct Binder<E: PlaybackEngine> {
    engine: Option<EngineHandle<E>>,
    listener: Option<ListenerId>,
    resume: ResumeState,
    paused: bool,
}

impl<E: PlaybackEngine> Binder<E> {
    pub(crate) fn new(engine: EngineHandle<E>, resume: ResumeState) -> Self {
        Binder {
            engine: Some(engine),
            listener: None,
            resume,
            paused: false,
        }
    }

    pub(crate) fn engine(&self) -> Option<&EngineHandle<E>> {
        self.engine.as_ref().filter(|engine| !engine.is_released())
    }

    pub(crate) fn resume_state(&self) -> ResumeState {
        self.resume
    }

    pub(crate) fn set_resume_state(&mut self, resume: ResumeState) {
        self.resume = resume;
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.listener.is_some()
    }

    /// Registers `listener`, restores the resume state and prepares playback.
    ///
    /// Attaching twice is a no-op.
    pub(crate) fn attach(&mut self, listener: Listener, start_index: usize) -> Result<(), Error> {
        if self.is_attached() {
            return Ok(());
        }
        let engine = self.engine.as_ref().ok_or(Error::Released)?;
        if engine.is_released() {
            return Err(Error::Released);
        }

        if self.resume.is_first_attach {
            self.resume.media_index = start_index;
            self.resume.position = Duration::ZERO;
            self.resume.is_first_attach = false;
        }
        let resume = self.resume;
        log::debug!("attaching engine with {resume:?}");

        let mut engine = engine.borrow_mut();
        let id = engine.add_listener(listener);
        let started = engine
            .seek(resume.media_index, resume.position)
            .and_then(|_| engine.prepare())
            .and_then(|_| {
                if resume.auto_play {
                    engine.play()
                } else {
                    engine.pause()
                }
            });
        match started {
            Ok(()) => {
                self.listener = Some(id);
                self.paused = false;
                Ok(())
            }
            Err(err) => {
                engine.remove_listener(id);
                Err(err)
            }
        }
    }

    pub(crate) fn on_lifecycle(&mut self, event: LifecycleEvent) -> Result<(), Error> {
        if !self.is_attached() {
            log::debug!("ignoring {event:?} before attach");
            return Ok(());
        }
        let engine = self.engine.as_ref().ok_or(Error::Released)?;

        match event {
            LifecycleEvent::Pause => {
                self.resume = capture(engine, self.resume)?;
                self.paused = true;
                engine.borrow_mut().pause()
            }
            LifecycleEvent::Resume => {
                let mut engine = engine.borrow_mut();
                if std::mem::take(&mut self.paused) {
                    engine.seek(self.resume.media_index, self.resume.position)?;
                }
                engine.play()
            }
        }
    }

    /// Captures the resume state, unregisters the listener and releases the engine
    /// when no one else holds it. Later calls do nothing.
    pub(crate) fn detach(&mut self) -> Result<(), Error> {
        let Some(engine) = self.engine.take() else {
            return Ok(());
        };
        let listener = self.listener.take();

        let captured = match (listener, engine.is_released()) {
            (Some(_), false) => capture(&engine, self.resume).map(|resume| self.resume = resume),
            _ => Ok(()),
        };
        if let Some(id) = listener {
            engine.borrow_mut().remove_listener(id);
        }

        let released = if engine.is_sole_owner() {
            engine.release().map(|_| ())
        } else {
            log::debug!("engine still shared, leaving release to its other owner");
            Ok(())
        };
        captured.and(released)
    }
}

impl<E: PlaybackEngine> Drop for Binder<E> {
    fn drop(&mut self) {
        if let Err(err) = self.detach() {
            log::error!("failed to detach playback engine: {err}");
        }
    }
}

fn capture<E: PlaybackEngine>(
    engine: &EngineHandle<E>,
    previous: ResumeState,
) -> Result<ResumeState, Error> {
    let engine = engine.borrow();
    Ok(ResumeState {
        auto_play: engine.is_playing()?,
        media_index: engine.current_index()?,
        position: engine.current_position()?,
        is_first_attach: previous.is_first_attach,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{Call, FakeEngine};
    use crate::engine::PlaybackEvent;
    use std::cell::{Cell, RefCell};

    struct Counter(Cell<u32>);

    impl LifecycleObserver for Counter {
        fn on_lifecycle(&self, _event: LifecycleEvent) -> Result<(), Error> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    struct Failing;

    impl LifecycleObserver for Failing {
        fn on_lifecycle(&self, _event: LifecycleEvent) -> Result<(), Error> {
            Err(Error::Released)
        }
    }

    fn binder() -> (Binder<FakeEngine>, Rc<RefCell<Vec<Call>>>) {
        let engine = FakeEngine {
            duration: Duration::from_secs(60),
            ..FakeEngine::default()
        };
        let calls = Rc::clone(&engine.calls);
        (
            Binder::new(EngineHandle::new(engine), ResumeState::default()),
            calls,
        )
    }

    #[test]
    fn dispatch_reaches_live_observers_only() {
        let mut lifecycle = Lifecycle::new();
        let kept = Rc::new(Counter(Cell::new(0)));
        let dropped = Rc::new(Counter(Cell::new(0)));
        lifecycle.add_observer(&kept);
        lifecycle.add_observer(&dropped);
        drop(dropped);

        lifecycle.dispatch(LifecycleEvent::Resume).unwrap();
        assert_eq!(kept.0.get(), 1);
        assert_eq!(lifecycle.observer_count(), 1);
    }

    #[test]
    fn removed_observers_are_not_notified() {
        let mut lifecycle = Lifecycle::new();
        let counter = Rc::new(Counter(Cell::new(0)));
        let id = lifecycle.add_observer(&counter);
        lifecycle.remove_observer(id);

        lifecycle.dispatch(LifecycleEvent::Pause).unwrap();
        assert_eq!(counter.0.get(), 0);
    }

    #[test]
    fn failing_observer_does_not_starve_the_rest() {
        let mut lifecycle = Lifecycle::new();
        let failing = Rc::new(Failing);
        let counter = Rc::new(Counter(Cell::new(0)));
        lifecycle.add_observer(&failing);
        lifecycle.add_observer(&counter);

        assert!(lifecycle.dispatch(LifecycleEvent::Pause).is_err());
        assert_eq!(counter.0.get(), 1);
    }

    #[test]
    fn first_attach_starts_at_the_configured_index() {
        let (mut binder, calls) = binder();
        binder.attach(Box::new(|_: &PlaybackEvent| {}), 2).unwrap();
        binder.attach(Box::new(|_: &PlaybackEvent| {}), 5).unwrap();

        assert_eq!(
            *calls.borrow(),
            vec![Call::Seek(2, Duration::ZERO), Call::Prepare, Call::Play]
        );
        assert!(!binder.resume_state().is_first_attach);
    }

    #[test]
    fn restored_state_is_applied_without_autoplay() {
        let (mut binder, calls) = binder();
        binder.set_resume_state(ResumeState {
            auto_play: false,
            media_index: 1,
            position: Duration::from_secs(42),
            is_first_attach: false,
        });
        binder.attach(Box::new(|_: &PlaybackEvent| {}), 0).unwrap();

        assert_eq!(
            *calls.borrow(),
            vec![
                Call::Seek(1, Duration::from_secs(42)),
                Call::Prepare,
                Call::Pause
            ]
        );
    }

    #[test]
    fn pause_then_resume_restores_the_captured_state() {
        let (mut binder, calls) = binder();
        binder.attach(Box::new(|_: &PlaybackEvent| {}), 0).unwrap();
        {
            let engine = binder.engine().unwrap();
            let mut engine = engine.borrow_mut();
            engine.index = 3;
            engine.position = Duration::from_millis(12_345);
        }

        binder.on_lifecycle(LifecycleEvent::Pause).unwrap();
        let captured = binder.resume_state();
        assert_eq!(captured.media_index, 3);
        assert_eq!(captured.position, Duration::from_millis(12_345));
        assert!(captured.auto_play);

        calls.borrow_mut().clear();
        binder.on_lifecycle(LifecycleEvent::Resume).unwrap();
        assert_eq!(binder.resume_state(), captured);
        assert_eq!(
            *calls.borrow(),
            vec![Call::Seek(3, Duration::from_millis(12_345)), Call::Play]
        );
    }

    #[test]
    fn resume_without_pause_keeps_the_position() {
        let (mut binder, calls) = binder();
        binder.attach(Box::new(|_: &PlaybackEvent| {}), 0).unwrap();
        binder.engine().unwrap().borrow_mut().position = Duration::from_secs(30);
        binder.on_lifecycle(LifecycleEvent::Pause).unwrap();
        binder.on_lifecycle(LifecycleEvent::Resume).unwrap();

        binder.engine().unwrap().borrow_mut().position = Duration::from_secs(90);
        calls.borrow_mut().clear();
        binder.on_lifecycle(LifecycleEvent::Resume).unwrap();

        assert_eq!(*calls.borrow(), vec![Call::Play]);
        assert_eq!(
            binder.engine().unwrap().borrow().position,
            Duration::from_secs(90)
        );
    }

    #[test]
    fn failed_attach_can_be_retried() {
        let engine = FakeEngine {
            failing_seeks: 1,
            ..FakeEngine::default()
        };
        let calls = Rc::clone(&engine.calls);
        let mut binder = Binder::new(EngineHandle::new(engine), ResumeState::default());

        assert!(binder.attach(Box::new(|_: &PlaybackEvent| {}), 1).is_err());
        assert!(!binder.is_attached());
        assert_eq!(binder.engine().unwrap().borrow().listener_count(), 0);

        binder.attach(Box::new(|_: &PlaybackEvent| {}), 1).unwrap();
        assert!(binder.is_attached());
        assert_eq!(binder.engine().unwrap().borrow().listener_count(), 1);
        assert_eq!(
            *calls.borrow(),
            vec![Call::Seek(1, Duration::ZERO), Call::Prepare, Call::Play]
        );
    }

    #[test]
    fn lifecycle_before_attach_is_ignored() {
        let (mut binder, calls) = binder();
        binder.on_lifecycle(LifecycleEvent::Resume).unwrap();
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn detach_captures_then_releases_once() {
        let (mut binder, calls) = binder();
        binder.attach(Box::new(|_: &PlaybackEvent| {}), 0).unwrap();
        binder.engine().unwrap().borrow_mut().position = Duration::from_secs(7);

        binder.detach().unwrap();
        binder.detach().unwrap();
        drop(binder);

        let calls = calls.borrow();
        assert_eq!(calls.iter().filter(|call| **call == Call::Release).count(), 1);
        assert_eq!(calls.last(), Some(&Call::Release));
    }

    #[test]
    fn shared_engine_is_left_to_its_other_owner() {
        let engine = FakeEngine::default();
        let calls = Rc::clone(&engine.calls);
        let handle = EngineHandle::new(engine);
        let mut binder = Binder::new(handle.clone(), ResumeState::default());
        binder.attach(Box::new(|_: &PlaybackEvent| {}), 0).unwrap();

        binder.detach().unwrap();
        assert!(!handle.is_released());
        assert_eq!(handle.borrow().listener_count(), 0);

        drop(handle);
        assert_eq!(calls.borrow().last(), Some(&Call::Release));
    }
}
