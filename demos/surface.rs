use iced::{
    widget::{Button, Column, Container, Row, Text},
    window, Element, Subscription,
};
use iced_video_surface::{
    GstPlayer, Lifecycle, LifecycleEvent, PlaybackEngine, Surface, SurfaceConfig, SurfaceView,
    Swipe, TimelineSnapshot,
};
use std::rc::Rc;
use std::time::{Duration, Instant};

fn main() -> iced::Result {
    iced::application("Iced Video Surface", App::update, App::view)
        .subscription(App::subscription)
        .run()
}

#[derive(Clone, Debug)]
enum Message {
    Swipe(Swipe),
    Forward(u64),
    Backward(u64),
    SeekOverlay(bool),
    SingleTap,
    Controls(bool),
    Timeline(TimelineSnapshot),
    Lifecycle(LifecycleEvent),
    TogglePause,
    Error(String),
}

struct App {
    surface: Rc<Surface<GstPlayer>>,
    lifecycle: Lifecycle,
    timeline: Option<TimelineSnapshot>,
    seek_label: Option<String>,
    controls: bool,
    last_gesture: String,
}

impl Default for App {
    fn default() -> Self {
        let playlist = std::env::args()
            .skip(1)
            .map(|arg| {
                let path = std::path::PathBuf::from(arg).canonicalize().unwrap();
                url::Url::from_file_path(path).unwrap()
            })
            .collect();

        let surface = Rc::new(Surface::new(
            GstPlayer::new(playlist).unwrap(),
            SurfaceConfig::default().seek_step(Duration::from_secs(5)),
        ));
        let mut lifecycle = Lifecycle::new();
        surface.bind_lifecycle(&mut lifecycle);
        surface.attach(Instant::now()).unwrap();

        App {
            surface,
            lifecycle,
            timeline: None,
            seek_label: None,
            controls: false,
            last_gesture: String::new(),
        }
    }
}

impl App {
    fn update(&mut self, message: Message) {
        match message {
            Message::Swipe(swipe) => self.last_gesture = format!("{swipe:?}"),
            Message::Forward(ms) => self.seek_label = Some(format!("+{}s", ms / 1000)),
            Message::Backward(ms) => self.seek_label = Some(format!("-{}s", ms / 1000)),
            Message::SeekOverlay(true) => {}
            Message::SeekOverlay(false) => self.seek_label = None,
            Message::SingleTap => self.last_gesture = "tap".into(),
            Message::Controls(visible) => self.controls = visible,
            Message::Timeline(snapshot) => self.timeline = Some(snapshot),
            Message::Lifecycle(event) => {
                if let Err(err) = self.lifecycle.dispatch(event) {
                    eprintln!("lifecycle: {err}");
                }
            }
            Message::TogglePause => {
                if let Some(engine) = self.surface.engine() {
                    let mut engine = engine.borrow_mut();
                    let result = match engine.is_playing() {
                        Ok(true) => engine.pause(),
                        Ok(false) => engine.play(),
                        Err(err) => Err(err),
                    };
                    if let Err(err) = result {
                        eprintln!("toggle: {err}");
                    }
                }
            }
            Message::Error(err) => eprintln!("surface: {err}"),
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        iced::event::listen_with(|event, _status, _window| match event {
            iced::Event::Window(window::Event::Focused) => {
                Some(Message::Lifecycle(LifecycleEvent::Resume))
            }
            iced::Event::Window(window::Event::Unfocused) => {
                Some(Message::Lifecycle(LifecycleEvent::Pause))
            }
            _ => None,
        })
    }

    fn view(&self) -> Element<Message> {
        let time = match &self.timeline {
            Some(snapshot) => format!(
                "{} / {}",
                snapshot.formatted_current, snapshot.formatted_duration
            ),
            None => "--:-- / --:--".into(),
        };

        let mut content = Column::new()
            .spacing(10)
            .padding(20)
            .push(Text::new(time))
            .push(Text::new(self.seek_label.clone().unwrap_or_default()).size(32))
            .push(Text::new(self.last_gesture.clone()));
        if self.controls {
            content = content.push(
                Row::new().push(
                    Button::new(Text::new("Play / Pause"))
                        .width(120.0)
                        .on_press(Message::TogglePause),
                ),
            );
        }

        SurfaceView::new(
            self.surface.as_ref(),
            Container::new(content)
                .width(iced::Length::Fill)
                .height(iced::Length::Fill),
        )
        .on_swipe(Message::Swipe)
        .on_next_double_tap(Message::Forward)
        .on_prev_double_tap(Message::Backward)
        .on_seek_overlay_visibility(Message::SeekOverlay)
        .on_single_tap(Message::SingleTap)
        .on_controls_visibility(Message::Controls)
        .on_timeline(Message::Timeline)
        .on_error(|err| Message::Error(err.to_string()))
        .into()
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Err(err) = self.surface.dispose(&mut self.lifecycle) {
            eprintln!("dispose: {err}");
        }
    }
}
