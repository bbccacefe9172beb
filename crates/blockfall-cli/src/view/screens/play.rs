use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use blockfall_engine::{GameSession, Intent, PieceSeed, SessionConfig};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout},
    style::Style,
    text::Line,
    widgets::Block as BlockWidget,
};
use ratatui_runtime::{RenderMode, Runtime, Screen, ScreenTransition};

use crate::{
    util,
    view::widgets::{KeyBinding, KeyBindingDisplay, SessionDisplay, style},
};

/// How long a soft drop lasts after the last press of the drop key when the
/// terminal does not report key releases. Auto-repeat presses extend it.
const SOFT_DROP_HOLD: Duration = Duration::from_millis(150);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Game(Intent),
    Save,
    Load,
    Quit,
}

impl Action {
    fn from_key_event(event: &KeyEvent) -> Option<Self> {
        if event.kind == KeyEventKind::Release {
            // Only reported by terminals with key release support.
            return matches!(event.code, KeyCode::Down | KeyCode::Char(' '))
                .then_some(Self::Game(Intent::SoftDropEnd));
        }
        match event.code {
            KeyCode::Left => Some(Self::Game(Intent::MoveLeft)),
            KeyCode::Right => Some(Self::Game(Intent::MoveRight)),
            KeyCode::Up | KeyCode::Char('x') => Some(Self::Game(Intent::RotateClockwise)),
            KeyCode::Char('z') => Some(Self::Game(Intent::RotateCounterClockwise)),
            KeyCode::Down | KeyCode::Char(' ') => Some(Self::Game(Intent::SoftDropStart)),
            KeyCode::Char('p') => Some(Self::Game(Intent::TogglePause)),
            KeyCode::Enter => Some(Self::Game(Intent::StartOrRestart)),
            KeyCode::Char('s') => Some(Self::Save),
            KeyCode::Char('l') => Some(Self::Load),
            KeyCode::Char('q') | KeyCode::Esc => Some(Self::Quit),
            _ => None,
        }
    }

    fn bindings() -> &'static [KeyBinding<'static>] {
        &[
            (&["←", "→"], "Move"),
            (&["↑", "x"], "Rotate"),
            (&["z"], "Rotate back"),
            (&["↓", "Space"], "Drop"),
            (&["p"], "Pause"),
            (&["Enter"], "Start"),
            (&["s"], "Save"),
            (&["l"], "Load"),
            (&["q", "Esc"], "Quit"),
        ]
    }
}

#[derive(Debug)]
struct Status {
    message: String,
    style: Style,
}

/// Interactive game screen.
///
/// The session is advanced once per tick with the tick time; key presses become
/// [`Intent`]s. Soft drop lasts until the drop key is released or another key is
/// pressed. Until a release has been seen, it also ends shortly after
/// the last press of the drop key.
#[derive(Debug)]
pub struct PlayScreen {
    session: GameSession,
    frame_rate: f64,
    save_file: PathBuf,
    status: Option<Status>,
    soft_drop_until: Option<Instant>,
    reports_release: bool,
}

impl PlayScreen {
    pub fn new(
        config: SessionConfig,
        seed: Option<PieceSeed>,
        frame_rate: f64,
        save_file: PathBuf,
        now: Instant,
    ) -> Self {
        let session = match seed {
            Some(seed) => GameSession::with_seed(config, seed, now),
            None => GameSession::new(config, now),
        };
        Self {
            session,
            frame_rate,
            save_file,
            status: None,
            soft_drop_until: None,
            reports_release: false,
        }
    }

    fn expire_soft_drop(&mut self, now: Instant) {
        if self.reports_release {
            return;
        }
        if let Some(until) = self.soft_drop_until
            && now >= until
        {
            self.soft_drop_until = None;
            self.session.soft_drop_end(now);
        }
    }

    fn save(&mut self) {
        let snapshot = self.session.export_state();
        match util::write_save_file(&self.save_file, &snapshot) {
            Ok(()) => self.notice(format!("Saved to {}", self.save_file.display())),
            Err(err) => self.error(format!("Save failed: {err:#}")),
        }
    }

    fn load(&mut self) {
        let result = util::read_save_file(&self.save_file)
            .and_then(|snapshot| Ok(self.session.import_state(&snapshot)?));
        match result {
            Ok(()) => self.notice(format!("Loaded from {}", self.save_file.display())),
            Err(err) => self.error(format!("Load failed: {err:#}")),
        }
    }

    fn notice(&mut self, message: String) {
        self.status = Some(Status {
            message,
            style: style::NOTICE,
        });
    }

    fn error(&mut self, message: String) {
        self.status = Some(Status {
            message,
            style: style::ERROR,
        });
    }
}

impl Screen for PlayScreen {
    fn on_active(&mut self, runtime: &mut Runtime) {
        runtime.set_tick_rate(Some(self.frame_rate));
        runtime.set_render_mode(RenderMode::throttled_from_rate(self.frame_rate));
    }

    fn on_inactive(&mut self, _runtime: &mut Runtime) {}

    fn on_close(&mut self, _runtime: &mut Runtime) {}

    fn handle_event(&mut self, runtime: &mut Runtime, event: &Event) -> ScreenTransition {
        let Some(event) = event.as_key_event() else {
            return ScreenTransition::Stay;
        };
        let now = runtime.now();
        let released = event.kind == KeyEventKind::Release;
        self.reports_release |= released;

        let action = Action::from_key_event(&event);
        if !released && action != Some(Action::Game(Intent::SoftDropStart)) {
            self.session.soft_drop_end(now);
        }

        match action {
            Some(Action::Game(intent)) => {
                let applied = self.session.apply(intent, now);
                match intent {
                    Intent::SoftDropStart if applied => {
                        self.soft_drop_until = Some(now + SOFT_DROP_HOLD);
                    }
                    Intent::StartOrRestart if applied => self.status = None,
                    _ => {}
                }
            }
            Some(Action::Save) => self.save(),
            Some(Action::Load) => self.load(),
            Some(Action::Quit) => return ScreenTransition::Exit,
            None => {}
        }
        ScreenTransition::Stay
    }

    fn update(&mut self, _runtime: &mut Runtime, now: Instant) {
        self.expire_soft_drop(now);
        self.session.advance_frame(now);
    }

    fn draw(&self, frame: &mut Frame) {
        let session_display = SessionDisplay::new(&self.session);
        let help = KeyBindingDisplay::new(Action::bindings()).block(BlockWidget::bordered());

        let [main_area, status_area, help_area] = Layout::vertical([
            Constraint::Length(session_display.height()),
            Constraint::Length(1),
            Constraint::Length(help.height()),
        ])
        .flex(Flex::Center)
        .areas(frame.area());

        frame.render_widget(session_display, main_area);
        if let Some(status) = &self.status {
            let line = Line::styled(status.message.as_str(), status.style).centered();
            frame.render_widget(line, status_area);
        }
        frame.render_widget(help, help_area);
    }
}
