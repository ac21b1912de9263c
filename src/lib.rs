//! A gesture-driven video surface for Iced.
//!
//! [`Surface`] holds the interaction state of a video view: tap and swipe
//! recognition, the visibility of the main controls and the seek overlay,
//! timeline sampling, and the binding of a [`PlaybackEngine`] to the host
//! lifecycle. [`SurfaceView`] is the widget that feeds it input and turns its
//! [`Event`]s into application messages.

mod config;
mod controls;
mod engine;
mod gesture;
#[cfg(feature = "gstreamer")]
mod gst_player;
mod lifecycle;
mod sampler;
mod surface;
mod surface_view;
mod time;
mod timer;

use thiserror::Error;

pub use config::{SurfaceConfig, MULTI_TAP_GAP, TAP_SETTLE_DELAY, TOUCH_SLOP};
pub use controls::{Controls, Event, VisibilityState};
pub use engine::{EngineHandle, Listener, ListenerId, PlaybackEngine, PlaybackEvent};
pub use gesture::{
    classify_horizontal, classify_vertical, Channel, Input, Phase, PointerSample,
    PointerTracker, ScreenHalf, Swipe, TapState,
};
#[cfg(feature = "gstreamer")]
pub use gst_player::GstPlayer;
pub use lifecycle::{Lifecycle, LifecycleEvent, LifecycleObserver, ObserverId, ResumeState};
pub use sampler::{PositionSampler, TimelineSnapshot};
pub use surface::Surface;
pub use surface_view::SurfaceView;
pub use time::format_time;

#[derive(Debug, Error)]
pub enum Error {
    #[error("playback engine was released")]
    Released,
    #[error("{0}")]
    Engine(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("failed to get the gstreamer bus")]
    Bus,
    #[error("failed to cast gstreamer element")]
    Cast,
    #[error("playlist is empty")]
    EmptyPlaylist,
    #[error("playlist index {0} is out of range")]
    IndexOutOfRange(usize),
}

impl Error {
    /// Wraps a failure of a third-party [`PlaybackEngine`].
    pub fn engine(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Engine(Box::new(err))
    }
}

#[cfg(feature = "gstreamer")]
impl From<glib::Error> for Error {
    fn from(err: glib::Error) -> Self {
        Error::engine(err)
    }
}

#[cfg(feature = "gstreamer")]
impl From<glib::BoolError> for Error {
    fn from(err: glib::BoolError) -> Self {
        Error::engine(err)
    }
}

#[cfg(feature = "gstreamer")]
impl From<gstreamer::StateChangeError> for Error {
    fn from(err: gstreamer::StateChangeError) -> Self {
        Error::engine(err)
    }
}
