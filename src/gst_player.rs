use crate::engine::{Listener, ListenerId, PlaybackEngine, PlaybackEvent};
use crate::Error;
use gstreamer as gst;
use gstreamer::prelude::*;
use std::time::Duration;

/// A [`PlaybackEngine`] backed by a GStreamer `playbin` playing a list of URIs
/// (e.g., local file paths or HTTP streams).
pub struct GstPlayer {
    source: gst::Pipeline,
    bus: gst::Bus,
    playlist: Vec<url::Url>,
    index: usize,
    prepared: bool,
    pending_seek: Option<Duration>,
    released: bool,

    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl GstPlayer {
    /// Creates a player for `playlist`, starting at its first item.
    pub fn new(playlist: Vec<url::Url>) -> Result<Self, Error> {
        gst::init()?;

        let pipeline = gst::parse::launch("playbin")?
            .downcast::<gst::Pipeline>()
            .map_err(|_| Error::Cast)?;

        Self::from_gst_pipeline(pipeline, playlist)
    }

    /// Creates a player over an existing `playbin` pipeline, e.g. one with a custom video sink.
    ///
    /// **Note:** the pipeline is driven through `playbin`'s `uri` property;
    /// other pipelines will not switch between playlist items.
    pub fn from_gst_pipeline(
        pipeline: gst::Pipeline,
        playlist: Vec<url::Url>,
    ) -> Result<Self, Error> {
        gst::init()?;
        let first = playlist.first().ok_or(Error::EmptyPlaylist)?;
        pipeline.set_property("uri", first.as_str());
        let bus = pipeline.bus().ok_or(Error::Bus)?;

        Ok(GstPlayer {
            source: pipeline,
            bus,
            playlist,
            index: 0,
            prepared: false,
            pending_seek: None,
            released: false,
            listeners: Vec::new(),
            next_listener: 0,
        })
    }

    pub fn playlist(&self) -> &[url::Url] {
        &self.playlist
    }

    /// Get the underlying GStreamer pipeline.
    pub fn pipeline(&self) -> gst::Pipeline {
        self.source.clone()
    }

    fn check(&self) -> Result<(), Error> {
        if self.released {
            Err(Error::Released)
        } else {
            Ok(())
        }
    }

    /// Waits for up to 5 seconds for the pipeline to preroll.
    fn wait_preroll(&self) -> Result<(), Error> {
        self.source.state(gst::ClockTime::from_seconds(5)).0?;
        Ok(())
    }

    fn seek_in_current(&self, position: Duration) -> Result<(), Error> {
        self.source.seek_simple(
            gst::SeekFlags::FLUSH | gst::SeekFlags::KEY_UNIT,
            gst::ClockTime::from_nseconds(position.as_nanos() as _),
        )?;
        Ok(())
    }

    /// Swaps the `uri` of the pipeline to the playlist item at `index`.
    fn load(&mut self, index: usize) -> Result<(), Error> {
        let uri = self.playlist.get(index).ok_or(Error::IndexOutOfRange(index))?;
        let state = self.source.current_state();

        self.source.set_state(gst::State::Ready)?;
        self.source.set_property("uri", uri.as_str());
        self.index = index;
        if self.prepared {
            self.source.set_state(match state {
                gst::State::Playing => gst::State::Playing,
                _ => gst::State::Paused,
            })?;
            self.wait_preroll()?;
        }
        Ok(())
    }

    fn notify(&mut self, event: &PlaybackEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }
}

impl PlaybackEngine for GstPlayer {
    fn play(&mut self) -> Result<(), Error> {
        self.check()?;
        if !self.prepared {
            self.prepare()?;
        }
        self.source.set_state(gst::State::Playing)?;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), Error> {
        self.check()?;
        self.source.set_state(gst::State::Paused)?;
        Ok(())
    }

    fn seek(&mut self, index: usize, position: Duration) -> Result<(), Error> {
        self.check()?;
        if index != self.index {
            self.load(index)?;
        }
        if self.prepared {
            self.seek_in_current(position)
        } else {
            // gstreamer can't seek before preroll
            self.pending_seek = Some(position);
            Ok(())
        }
    }

    fn prepare(&mut self) -> Result<(), Error> {
        self.check()?;
        self.source.set_state(gst::State::Paused)?;
        self.wait_preroll()?;
        self.prepared = true;
        if let Some(position) = self.pending_seek.take() {
            self.seek_in_current(position)?;
        }
        Ok(())
    }

    fn current_position(&self) -> Result<Duration, Error> {
        self.check()?;
        Ok(Duration::from_nanos(
            self.source
                .query_position::<gst::ClockTime>()
                .map_or(0, |pos| pos.nseconds()),
        ))
    }

    fn duration(&self) -> Result<Duration, Error> {
        self.check()?;
        Ok(Duration::from_nanos(
            self.source
                .query_duration::<gst::ClockTime>()
                .map_or(0, |duration| duration.nseconds()),
        ))
    }

    fn current_index(&self) -> Result<usize, Error> {
        self.check()?;
        Ok(self.index)
    }

    fn is_playing(&self) -> Result<bool, Error> {
        self.check()?;
        Ok(self.source.current_state() == gst::State::Playing)
    }

    fn add_listener(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.retain(|(listener, _)| *listener != id);
    }

    fn release(&mut self) -> Result<(), Error> {
        self.check()?;
        self.released = true;
        self.listeners.clear();
        self.source.set_state(gst::State::Null)?;
        Ok(())
    }

    fn pump_events(&mut self) {
        if self.released {
            return;
        }

        let mut events = Vec::new();
        let mut ended = false;
        for msg in self.bus.iter() {
            match msg.view() {
                gst::MessageView::StateChanged(change)
                    if msg.src() == Some(self.source.upcast_ref::<gst::Object>()) =>
                {
                    let was = change.old() == gst::State::Playing;
                    let is = change.current() == gst::State::Playing;
                    if was != is {
                        events.push(PlaybackEvent::IsPlayingChanged(is));
                    }
                }
                gst::MessageView::Eos(_) => ended = true,
                gst::MessageView::Error(err) => {
                    log::error!("bus returned an error: {err}");
                    events.push(PlaybackEvent::Error(err.error().to_string()));
                }
                _ => {}
            }
        }

        if ended {
            let next = self.index + 1;
            if next < self.playlist.len() {
                log::debug!("advancing playlist to item {next}");
                if let Err(err) = self.seek(next, Duration::ZERO).and_then(|_| self.play()) {
                    log::error!("cannot advance playlist: {err}");
                    events.push(PlaybackEvent::Error(err.to_string()));
                }
            } else {
                events.push(PlaybackEvent::Ended);
            }
        }

        for event in &events {
            self.notify(event);
        }
    }
}

impl Drop for GstPlayer {
    fn drop(&mut self) {
        if !self.released {
            if let Err(err) = self.source.set_state(gst::State::Null) {
                log::error!("failed to stop pipeline: {err}");
            }
        }
    }
}
