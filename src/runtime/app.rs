use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use softbuffer::{Context, Surface};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::keyboard::{Key, ModifiersState, NamedKey};
use winit::window::{Window, WindowId};

use leader_keys::commands::{CommandRegistry, HostDispatcher, HostRequest, Launcher, SystemLauncher};
use leader_keys::fs_watcher::SettingsWatcher;
use leader_keys::keymap::{hotkey_from_winit, Platform};
use leader_keys::leader::{LeaderContext, LeaderMachine, StatusReporter, TimerQueue};
use leader_keys::prompt::CommandPrompt;
use leader_keys::settings::LeaderSettings;
use leader_keys::status_line::StatusLine;

/// Idle colour, leader-active accent, prompt accent (0RGB)
const IDLE_FILL: u32 = 0x001E_1E1E;
const ACTIVE_FILL: u32 = 0x0025_63EB;
const PROMPT_FILL: u32 = 0x0016_A34A;

/// Upper bound on a sleep, so notices and file events are picked up
const MAX_WAIT: Duration = Duration::from_millis(500);

pub struct App {
    settings_path: Option<PathBuf>,
    settings: LeaderSettings,
    registry: CommandRegistry,
    machine: LeaderMachine,
    timers: TimerQueue,
    status: StatusLine,
    launcher: SystemLauncher,
    prompt: Option<CommandPrompt>,
    watcher: Option<SettingsWatcher>,
    modifiers: ModifiersState,
    window: Option<Rc<Window>>,
    _context: Option<Context<Rc<Window>>>,
    surface: Option<Surface<Rc<Window>, Rc<Window>>>,
    title: String,
    quit: bool,
}

impl App {
    pub fn new(settings_path: Option<PathBuf>) -> Self {
        let settings = match &settings_path {
            Some(path) => LeaderSettings::load_from(path),
            None => LeaderSettings::default(),
        };
        let registry = CommandRegistry::new(&settings.commands);
        let watcher = settings_path.as_deref().and_then(start_watcher);

        tracing::info!(
            "Leader is {} ({} mappings, {} commands)",
            settings.leader_key.display_string(),
            settings.mappings.len(),
            registry.len()
        );

        Self {
            settings_path,
            settings,
            registry,
            machine: LeaderMachine::new(),
            timers: TimerQueue::new(),
            status: StatusLine::default(),
            launcher: SystemLauncher,
            prompt: None,
            watcher,
            modifiers: ModifiersState::empty(),
            window: None,
            _context: None,
            surface: None,
            title: String::new(),
            quit: false,
        }
    }

    /// Run `f` with a fresh leader context, then act on queued host requests
    fn with_leader<R>(
        &mut self,
        f: impl FnOnce(&mut LeaderMachine, &mut LeaderContext<'_>) -> R,
    ) -> R {
        let mut dispatcher = HostDispatcher::new(&self.registry, &mut self.launcher);
        let result = {
            let mut cx = LeaderContext {
                settings: &self.settings,
                dispatcher: &mut dispatcher,
                reporter: &mut self.status,
                timers: &mut self.timers,
            };
            f(&mut self.machine, &mut cx)
        };
        let requests = dispatcher.take_requests();

        for request in requests {
            self.handle_request(request);
        }
        if self.status.take_prompt_request() {
            self.prompt = Some(CommandPrompt::new());
        }
        result
    }

    fn handle_request(&mut self, request: HostRequest) {
        tracing::debug!("Host request: {:?}", request);
        match request {
            HostRequest::ShowHelp => self.status.on_help(&self.settings.mappings),
            HostRequest::ReloadSettings => self.reload_settings(),
            HostRequest::OpenSettings => {
                let Some(path) = self.settings_path.clone() else {
                    self.status.on_notice("No settings file available");
                    return;
                };
                if !path.exists() {
                    if let Err(e) = self.settings.save_to(&path) {
                        self.status.on_notice(&e.to_string());
                        return;
                    }
                }
                self.open(&path);
            }
            HostRequest::OpenLogFile => match leader_keys::config_paths::log_file() {
                Some(path) => self.open(&path),
                None => self.status.on_notice("No log file available"),
            },
            HostRequest::Quit => self.quit = true,
        }
    }

    fn open(&mut self, path: &Path) {
        if let Err(e) = self.launcher.open_path(path) {
            tracing::warn!("Failed to open {}: {}", path.display(), e);
            self.status
                .on_notice(&format!("Failed to open {}: {}", path.display(), e));
        }
    }

    /// Re-read settings. A broken file keeps the current settings.
    fn reload_settings(&mut self) {
        let Some(path) = self.settings_path.as_deref() else {
            return;
        };
        match LeaderSettings::try_load_from(path) {
            Ok(settings) => {
                self.registry = CommandRegistry::new(&settings.commands);
                self.settings = settings;
                self.status.on_notice("Settings reloaded");
            }
            Err(e) => {
                tracing::warn!("Keeping current settings: {}", e);
                self.status.on_notice(&format!("Settings not reloaded: {}", e));
            }
        }
    }

    fn handle_key_event(&mut self, event: &KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }

        if self.prompt.is_some() {
            self.handle_prompt_key(event);
            return;
        }

        let Some(hotkey) = hotkey_from_winit(&event.logical_key, self.modifiers, Platform::current())
        else {
            return;
        };
        // Auto-repeat only matters while a session is collecting keys
        if event.repeat && !self.machine.is_active() {
            return;
        }

        let outcome = self.with_leader(|machine, cx| machine.handle_key(&hotkey, cx));
        if !outcome.is_consumed() {
            tracing::trace!("Passing through {}", hotkey);
        }
    }

    fn handle_prompt_key(&mut self, event: &KeyEvent) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };

        match &event.logical_key {
            Key::Named(NamedKey::Escape) => {
                self.prompt = None;
            }
            Key::Named(NamedKey::Enter) => {
                let accepted = prompt.accept(&self.registry);
                self.prompt = None;
                match accepted {
                    Some(action) => {
                        self.with_leader(|machine, cx| machine.run_prompted(action, cx));
                    }
                    None => self.status.on_notice("No matching command"),
                }
            }
            Key::Named(NamedKey::Backspace) => prompt.backspace(),
            _ => {
                if let Some(text) = &event.text {
                    prompt.push_str(text);
                }
            }
        }
    }

    fn fire_timers(&mut self) {
        while let Some((id, kind)) = self.timers.pop_expired() {
            tracing::trace!("Timer fired: {:?}", kind);
            self.with_leader(|machine, cx| machine.handle_timer(id, cx));
        }
    }

    fn poll_settings_file(&mut self) {
        if self.watcher.as_ref().is_some_and(SettingsWatcher::poll_changed) {
            self.reload_settings();
        }
    }

    fn current_title(&self) -> String {
        match &self.prompt {
            Some(prompt) => prompt.title(&self.registry),
            None => self.status.title(),
        }
    }

    fn fill_colour(&self) -> u32 {
        if self.prompt.is_some() {
            PROMPT_FILL
        } else if self.machine.is_active() {
            ACTIVE_FILL
        } else {
            IDLE_FILL
        }
    }

    /// Sync the window title and request a repaint when the state changed
    fn refresh(&mut self) {
        self.status.expire_notice();
        let title = self.current_title();
        if title == self.title {
            return;
        }
        if let Some(window) = &self.window {
            window.set_title(&title);
            window.request_redraw();
        }
        self.title = title;
    }

    fn render(&mut self) -> Result<()> {
        let fill = self.fill_colour();
        let (Some(window), Some(surface)) = (&self.window, &mut self.surface) else {
            return Ok(());
        };
        let size = window.inner_size();
        let (Some(width), Some(height)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return Ok(());
        };

        surface
            .resize(width, height)
            .map_err(|e| anyhow!("Failed to resize surface: {}", e))?;
        let mut buffer = surface
            .buffer_mut()
            .map_err(|e| anyhow!("Failed to get surface buffer: {}", e))?;
        buffer.fill(fill);
        buffer
            .present()
            .map_err(|e| anyhow!("Failed to present buffer: {}", e))?;
        Ok(())
    }

    fn next_wake(&self) -> Instant {
        let cap = Instant::now() + MAX_WAIT;
        [self.timers.next_deadline(), self.status.notice_deadline()]
            .into_iter()
            .flatten()
            .fold(cap, Instant::min)
    }
}

fn start_watcher(path: &Path) -> Option<SettingsWatcher> {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!("Not watching settings: {}", e);
            return None;
        }
    }
    SettingsWatcher::new(path.to_path_buf())
        .map_err(|e| tracing::warn!("Not watching settings: {}", e))
        .ok()
}

type WindowParts = (
    Rc<Window>,
    Context<Rc<Window>>,
    Surface<Rc<Window>, Rc<Window>>,
);

fn create_surface(event_loop: &ActiveEventLoop) -> Result<WindowParts> {
    let attributes = Window::default_attributes()
        .with_title(leader_keys::status_line::APP_TITLE)
        .with_inner_size(LogicalSize::new(420, 80));
    let window = Rc::new(event_loop.create_window(attributes)?);
    let context = Context::new(Rc::clone(&window))
        .map_err(|e| anyhow!("Failed to create context: {}", e))?;
    let surface = Surface::new(&context, Rc::clone(&window))
        .map_err(|e| anyhow!("Failed to create surface: {}", e))?;
    Ok((window, context, surface))
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        match create_surface(event_loop) {
            Ok((window, context, surface)) => {
                self.window = Some(window);
                self._context = Some(context);
                self.surface = Some(surface);
                self.refresh();
            }
            Err(e) => {
                tracing::error!("Failed to create window: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.window.as_ref().map(|w| w.id()) != Some(window_id) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                return;
            }
            WindowEvent::ModifiersChanged(mods) => self.modifiers = mods.state(),
            WindowEvent::KeyboardInput { event, .. } => self.handle_key_event(&event),
            WindowEvent::Focused(false) => {
                if self.machine.is_active() {
                    self.with_leader(|machine, cx| machine.exit(cx));
                }
                self.prompt = None;
            }
            WindowEvent::Resized(_) => {
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render() {
                    tracing::warn!("Render failed: {}", e);
                }
            }
            _ => {}
        }

        if self.quit {
            event_loop.exit();
            return;
        }
        self.refresh();
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.fire_timers();
        self.poll_settings_file();

        if self.quit {
            event_loop.exit();
            return;
        }

        self.refresh();
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_wake()));
    }
}
