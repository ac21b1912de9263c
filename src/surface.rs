use crate::config::SurfaceConfig;
use crate::controls::{Controls, Event, VisibilityState};
use crate::engine::{EngineHandle, PlaybackEngine, PlaybackEvent};
use crate::gesture::{PointerSample, PointerTracker};
use crate::lifecycle::{
    Binder, Lifecycle, LifecycleEvent, LifecycleObserver, ObserverId, ResumeState,
};
use crate::sampler::PositionSampler;
use crate::Error;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc;
use std::time::Instant;

pub(crate) struct Internal<E: PlaybackEngine> {
    pub(crate) config: SurfaceConfig,
    pub(crate) controls: Controls,
    pub(crate) tracker: PointerTracker,
    pub(crate) sampler: PositionSampler,
    pub(crate) binder: Binder<E>,
    pub(crate) playback_tx: mpsc::Sender<PlaybackEvent>,
    pub(crate) playback_rx: mpsc::Receiver<PlaybackEvent>,
    pub(crate) observer: Option<ObserverId>,
}

impl<E: PlaybackEngine> Internal<E> {
    /// Applies engine notifications received since the last call.
    fn drain_playback(&mut self, at: Instant) {
        while let Ok(event) = self.playback_rx.try_recv() {
            match event {
                PlaybackEvent::IsPlayingChanged(playing) => {
                    self.controls.set_playing(playing, at);
                }
                PlaybackEvent::Ended => log::debug!("playback ended"),
                PlaybackEvent::Error(err) => log::error!("playback engine error: {err}"),
            }
        }
    }
}

/// The state behind a [`SurfaceView`](crate::SurfaceView): gesture handling,
/// control visibility, timeline sampling and the playback engine binding.
///
/// Nothing here reads a clock. Every operation takes the instant it happens at,
/// and [`Surface::tick`] fires whatever became due.
pub struct Surface<E: PlaybackEngine>(pub(crate) RefCell<Internal<E>>);

impl<E: PlaybackEngine> Surface<E> {
    /// Creates a surface over an engine it owns, or over a shared [`EngineHandle`].
    pub fn new(engine: impl Into<EngineHandle<E>>, config: SurfaceConfig) -> Self {
        let (playback_tx, playback_rx) = mpsc::channel();
        let resume = ResumeState {
            auto_play: config.auto_play,
            media_index: config.start_index,
            ..ResumeState::default()
        };

        Surface(RefCell::new(Internal {
            config,
            controls: Controls::new(config),
            tracker: PointerTracker::default(),
            sampler: PositionSampler::new(config.update_interval),
            binder: Binder::new(engine.into(), resume),
            playback_tx,
            playback_rx,
            observer: None,
        }))
    }

    /// Continues from the state a previous surface left off at.
    pub fn with_resume_state(self, resume: ResumeState) -> Self {
        self.0.borrow_mut().binder.set_resume_state(resume);
        self
    }

    pub fn config(&self) -> SurfaceConfig {
        self.0.borrow().config
    }

    /// The engine, unless it was released.
    pub fn engine(&self) -> Option<EngineHandle<E>> {
        self.0.borrow().binder.engine().cloned()
    }

    /// Binds the engine: restores the resume state, prepares playback and starts sampling.
    pub fn attach(&self, now: Instant) -> Result<(), Error> {
        let internal = &mut *self.0.borrow_mut();
        let tx = internal.playback_tx.clone();
        internal.binder.attach(
            Box::new(move |event: &PlaybackEvent| {
                let _ = tx.send(event.clone());
            }),
            internal.config.start_index,
        )?;
        internal.drain_playback(now);
        internal.sampler.start(now);
        Ok(())
    }

    pub fn is_attached(&self) -> bool {
        self.0.borrow().binder.is_attached()
    }

    /// Subscribes this surface to `lifecycle` until [`Surface::dispose`].
    pub fn bind_lifecycle(self: &Rc<Self>, lifecycle: &mut Lifecycle)
    where
        E: 'static,
    {
        let id = lifecycle.add_observer(self);
        if let Some(previous) = self.0.borrow_mut().observer.replace(id) {
            lifecycle.remove_observer(previous);
        }
    }

    /// Sets the width of the surface, in the coordinate space of pointer samples.
    pub fn set_width(&self, width: f32) {
        self.0.borrow_mut().controls.set_width(width);
    }

    pub fn handle_pointer(&self, sample: PointerSample) {
        let internal = &mut *self.0.borrow_mut();
        internal.drain_playback(sample.at);
        internal.controls.advance(sample.at);
        for input in internal.tracker.track(sample) {
            internal.controls.handle(input);
        }
    }

    /// Applies engine notifications, fires due timers and samples the timeline.
    ///
    /// A sampling failure is returned once; sampling stays stopped afterwards.
    pub fn tick(&self, now: Instant) -> Result<(), Error> {
        let internal = &mut *self.0.borrow_mut();
        if let Some(engine) = internal.binder.engine() {
            engine.borrow_mut().pump_events();
        }
        internal.drain_playback(now);
        internal.controls.advance(now);

        let Some(engine) = internal.binder.engine() else {
            internal.sampler.cancel();
            return Ok(());
        };
        let snapshot = internal.sampler.poll(&*engine.borrow(), now)?;
        if let Some(snapshot) = snapshot {
            internal.controls.push_event(Event::Timeline(snapshot));
        }
        Ok(())
    }

    /// The earliest instant at which [`Surface::tick`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        let internal = self.0.borrow();
        match (
            internal.controls.next_deadline(),
            internal.sampler.next_deadline(),
        ) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Takes the notifications produced since the last call, oldest first.
    pub fn drain_events(&self) -> Vec<Event> {
        self.0.borrow_mut().controls.drain_events()
    }

    pub fn visibility(&self) -> VisibilityState {
        self.0.borrow().controls.visibility()
    }

    pub fn resume_state(&self) -> ResumeState {
        self.0.borrow().binder.resume_state()
    }

    /// Stops sampling, leaves `lifecycle`, captures the resume state and
    /// releases the engine unless it is shared. Later calls do nothing.
    pub fn dispose(&self, lifecycle: &mut Lifecycle) -> Result<(), Error> {
        let internal = &mut *self.0.borrow_mut();
        internal.sampler.cancel();
        if let Some(id) = internal.observer.take() {
            lifecycle.remove_observer(id);
        }
        internal.binder.detach()
    }
}

impl<E: PlaybackEngine> LifecycleObserver for Surface<E> {
    fn on_lifecycle(&self, event: LifecycleEvent) -> Result<(), Error> {
        self.0.borrow_mut().binder.on_lifecycle(event)
    }
}
