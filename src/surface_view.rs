use crate::controls::Event;
use crate::engine::PlaybackEngine;
use crate::gesture::{Phase, PointerSample, Swipe};
use crate::sampler::TimelineSnapshot;
use crate::surface::Surface;
use crate::Error;
use iced::{
    advanced::{
        self, layout, mouse, overlay, renderer,
        widget::{tree, Tree},
        Clipboard, Layout, Shell, Widget,
    },
    event::Status,
    touch, window, Element, Length, Point, Rectangle, Size, Vector,
};
use log::error;
use std::time::Instant;

#[derive(Debug, Default)]
struct State {
    mouse_down: bool,
    finger: Option<touch::Finger>,
}

/// Widget which feeds pointer input and redraw ticks of its content into a [`Surface`].
///
/// The content (usually the video frame and any overlays) is laid out and drawn
/// unchanged; taps, double-taps and swipes over it are turned into messages.
pub struct SurfaceView<'a, E, Message, Theme = iced::Theme, Renderer = iced::Renderer>
where
    E: PlaybackEngine,
    Renderer: advanced::Renderer,
{
    surface: &'a Surface<E>,
    content: Element<'a, Message, Theme, Renderer>,
    on_swipe: Option<Box<dyn Fn(Swipe) -> Message + 'a>>,
    on_next_double_tap: Option<Box<dyn Fn(u64) -> Message + 'a>>,
    on_prev_double_tap: Option<Box<dyn Fn(u64) -> Message + 'a>>,
    on_seek_overlay_visibility: Option<Box<dyn Fn(bool) -> Message + 'a>>,
    on_single_tap: Option<Message>,
    on_controls_visibility: Option<Box<dyn Fn(bool) -> Message + 'a>>,
    on_timeline: Option<Box<dyn Fn(TimelineSnapshot) -> Message + 'a>>,
    on_error: Option<Box<dyn Fn(&Error) -> Message + 'a>>,
}

impl<'a, E, Message, Theme, Renderer> SurfaceView<'a, E, Message, Theme, Renderer>
where
    E: PlaybackEngine,
    Renderer: advanced::Renderer,
{
    /// Creates a new surface view over `content`.
    pub fn new(
        surface: &'a Surface<E>,
        content: impl Into<Element<'a, Message, Theme, Renderer>>,
    ) -> Self {
        SurfaceView {
            surface,
            content: content.into(),
            on_swipe: None,
            on_next_double_tap: None,
            on_prev_double_tap: None,
            on_seek_overlay_visibility: None,
            on_single_tap: None,
            on_controls_visibility: None,
            on_timeline: None,
            on_error: None,
        }
    }

    /// Message to send for every recognized swipe.
    pub fn on_swipe<F>(self, on_swipe: F) -> Self
    where
        F: 'a + Fn(Swipe) -> Message,
    {
        SurfaceView {
            on_swipe: Some(Box::new(on_swipe)),
            ..self
        }
    }

    /// Message to send when a double-tap on the right half adds to the forward seek.
    pub fn on_next_double_tap<F>(self, on_next_double_tap: F) -> Self
    where
        F: 'a + Fn(u64) -> Message,
    {
        SurfaceView {
            on_next_double_tap: Some(Box::new(on_next_double_tap)),
            ..self
        }
    }

    /// Message to send when a double-tap on the left half adds to the backward seek.
    pub fn on_prev_double_tap<F>(self, on_prev_double_tap: F) -> Self
    where
        F: 'a + Fn(u64) -> Message,
    {
        SurfaceView {
            on_prev_double_tap: Some(Box::new(on_prev_double_tap)),
            ..self
        }
    }

    pub fn on_seek_overlay_visibility<F>(self, on_seek_overlay_visibility: F) -> Self
    where
        F: 'a + Fn(bool) -> Message,
    {
        SurfaceView {
            on_seek_overlay_visibility: Some(Box::new(on_seek_overlay_visibility)),
            ..self
        }
    }

    /// Message to send when a single tap toggles the controls.
    pub fn on_single_tap(self, on_single_tap: Message) -> Self {
        SurfaceView {
            on_single_tap: Some(on_single_tap),
            ..self
        }
    }

    pub fn on_controls_visibility<F>(self, on_controls_visibility: F) -> Self
    where
        F: 'a + Fn(bool) -> Message,
    {
        SurfaceView {
            on_controls_visibility: Some(Box::new(on_controls_visibility)),
            ..self
        }
    }

    /// Message to send with each timeline sample taken during playback.
    pub fn on_timeline<F>(self, on_timeline: F) -> Self
    where
        F: 'a + Fn(TimelineSnapshot) -> Message,
    {
        SurfaceView {
            on_timeline: Some(Box::new(on_timeline)),
            ..self
        }
    }

    pub fn on_error<F>(self, on_error: F) -> Self
    where
        F: 'a + Fn(&Error) -> Message,
    {
        SurfaceView {
            on_error: Some(Box::new(on_error)),
            ..self
        }
    }
}

impl<'a, E, Message, Theme, Renderer> SurfaceView<'a, E, Message, Theme, Renderer>
where
    E: PlaybackEngine,
    Message: Clone,
    Renderer: advanced::Renderer,
{
    fn message(&self, event: Event) -> Option<Message> {
        match event {
            Event::Swipe(swipe) => self.on_swipe.as_ref().map(|f| f(swipe)),
            Event::NextDoubleTap(offset) => self.on_next_double_tap.as_ref().map(|f| f(offset)),
            Event::PrevDoubleTap(offset) => self.on_prev_double_tap.as_ref().map(|f| f(offset)),
            Event::SeekOverlayVisibility(visible) => {
                self.on_seek_overlay_visibility.as_ref().map(|f| f(visible))
            }
            Event::SingleTap => self.on_single_tap.clone(),
            Event::ControlsVisibility(visible) => {
                self.on_controls_visibility.as_ref().map(|f| f(visible))
            }
            Event::Timeline(snapshot) => self.on_timeline.as_ref().map(|f| f(snapshot)),
        }
    }

    fn pointer(&self, phase: Phase, position: Point, bounds: Rectangle) {
        let local = position - Vector::new(bounds.x, bounds.y);
        self.surface
            .handle_pointer(PointerSample::new(phase, local, Instant::now()));
    }
}

impl<'a, E, Message, Theme, Renderer> Widget<Message, Theme, Renderer>
    for SurfaceView<'a, E, Message, Theme, Renderer>
where
    E: PlaybackEngine,
    Message: Clone,
    Renderer: advanced::Renderer,
{
    fn tag(&self) -> tree::Tag {
        tree::Tag::of::<State>()
    }

    fn state(&self) -> tree::State {
        tree::State::new(State::default())
    }

    fn children(&self) -> Vec<Tree> {
        vec![Tree::new(&self.content)]
    }

    fn diff(&self, tree: &mut Tree) {
        tree.diff_children(std::slice::from_ref(&self.content));
    }

    fn size(&self) -> Size<Length> {
        self.content.as_widget().size()
    }

    fn layout(
        &self,
        tree: &mut Tree,
        renderer: &Renderer,
        limits: &layout::Limits,
    ) -> layout::Node {
        self.content
            .as_widget()
            .layout(&mut tree.children[0], renderer, limits)
    }

    fn draw(
        &self,
        tree: &Tree,
        renderer: &mut Renderer,
        theme: &Theme,
        style: &renderer::Style,
        layout: Layout<'_>,
        cursor: mouse::Cursor,
        viewport: &Rectangle,
    ) {
        self.content.as_widget().draw(
            &tree.children[0],
            renderer,
            theme,
            style,
            layout,
            cursor,
            viewport,
        );
    }

    fn on_event(
        &mut self,
        tree: &mut Tree,
        event: iced::Event,
        layout: Layout<'_>,
        cursor: mouse::Cursor,
        renderer: &Renderer,
        clipboard: &mut dyn Clipboard,
        shell: &mut Shell<'_, Message>,
        viewport: &Rectangle,
    ) -> Status {
        if let Status::Captured = self.content.as_widget_mut().on_event(
            &mut tree.children[0],
            event.clone(),
            layout,
            cursor,
            renderer,
            clipboard,
            shell,
            viewport,
        ) {
            return Status::Captured;
        }

        let state = tree.state.downcast_mut::<State>();
        let bounds = layout.bounds();
        self.surface.set_width(bounds.width);

        let status = match event {
            iced::Event::Window(window::Event::RedrawRequested(now)) => {
                if let Err(err) = self.surface.tick(now) {
                    error!("surface update failed: {err}");
                    if let Some(ref on_error) = self.on_error {
                        shell.publish(on_error(&err));
                    }
                }
                Status::Ignored
            }
            iced::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                match cursor.position_over(bounds) {
                    Some(position) => {
                        state.mouse_down = true;
                        self.pointer(Phase::Down, position, bounds);
                        Status::Captured
                    }
                    None => Status::Ignored,
                }
            }
            iced::Event::Mouse(mouse::Event::CursorMoved { position }) if state.mouse_down => {
                self.pointer(Phase::Move, position, bounds);
                Status::Captured
            }
            iced::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left))
                if state.mouse_down =>
            {
                state.mouse_down = false;
                let position = cursor.position().unwrap_or(bounds.center());
                self.pointer(Phase::Up, position, bounds);
                Status::Captured
            }
            iced::Event::Touch(touch::Event::FingerPressed { id, position })
                if state.finger.is_none() && bounds.contains(position) =>
            {
                state.finger = Some(id);
                self.pointer(Phase::Down, position, bounds);
                Status::Captured
            }
            iced::Event::Touch(touch::Event::FingerMoved { id, position })
                if state.finger == Some(id) =>
            {
                self.pointer(Phase::Move, position, bounds);
                Status::Captured
            }
            iced::Event::Touch(
                touch::Event::FingerLifted { id, position }
                | touch::Event::FingerLost { id, position },
            ) if state.finger == Some(id) => {
                state.finger = None;
                self.pointer(Phase::Up, position, bounds);
                Status::Captured
            }
            _ => Status::Ignored,
        };

        for event in self.surface.drain_events() {
            if let Some(message) = self.message(event) {
                shell.publish(message);
            }
        }
        if let Some(deadline) = self.surface.next_deadline() {
            shell.request_redraw(window::RedrawRequest::At(deadline));
        }

        status
    }

    fn mouse_interaction(
        &self,
        tree: &Tree,
        layout: Layout<'_>,
        cursor: mouse::Cursor,
        viewport: &Rectangle,
        renderer: &Renderer,
    ) -> mouse::Interaction {
        self.content.as_widget().mouse_interaction(
            &tree.children[0],
            layout,
            cursor,
            viewport,
            renderer,
        )
    }

    fn overlay<'b>(
        &'b mut self,
        tree: &'b mut Tree,
        layout: Layout<'_>,
        renderer: &Renderer,
        translation: Vector,
    ) -> Option<overlay::Element<'b, Message, Theme, Renderer>> {
        self.content
            .as_widget_mut()
            .overlay(&mut tree.children[0], layout, renderer, translation)
    }
}

impl<'a, E, Message, Theme, Renderer> From<SurfaceView<'a, E, Message, Theme, Renderer>>
    for Element<'a, Message, Theme, Renderer>
where
    E: 'a + PlaybackEngine,
    Message: 'a + Clone,
    Theme: 'a,
    Renderer: 'a + advanced::Renderer,
{
    fn from(surface_view: SurfaceView<'a, E, Message, Theme, Renderer>) -> Self {
        Self::new(surface_view)
    }
}
