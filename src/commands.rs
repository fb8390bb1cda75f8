//! Host command registry and action dispatch
//!
//! `Action::Invoke` names a command here. Built-ins ask the host loop to do
//! something ([`HostRequest`]); user commands from settings are shell command
//! lines. `Action::Open` goes to the system file handler.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::{Command, Stdio};

use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Matcher, Utf32Str};

use crate::keymap::Action;
use crate::leader::{DispatchError, Dispatcher};

// ============================================================================
// Command Registry
// ============================================================================

/// Work only the host loop can do; queued during dispatch, handled after
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostRequest {
    ShowHelp,
    ReloadSettings,
    OpenSettings,
    OpenLogFile,
    Quit,
}

/// A built-in command definition
#[derive(Debug, Clone)]
pub struct CommandDef {
    pub id: &'static str,
    pub label: &'static str,
    pub request: HostRequest,
}

/// Commands every host provides
pub static BUILTIN_COMMANDS: &[CommandDef] = &[
    CommandDef {
        id: "leader:help",
        label: "Show Leader Hotkeys",
        request: HostRequest::ShowHelp,
    },
    CommandDef {
        id: "leader:reload-settings",
        label: "Reload Settings",
        request: HostRequest::ReloadSettings,
    },
    CommandDef {
        id: "leader:open-settings",
        label: "Open Settings File",
        request: HostRequest::OpenSettings,
    },
    CommandDef {
        id: "leader:open-log",
        label: "Open Log File",
        request: HostRequest::OpenLogFile,
    },
    CommandDef {
        id: "app:quit",
        label: "Quit",
        request: HostRequest::Quit,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Builtin(HostRequest),
    /// Command line run through the platform shell
    Shell(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEntry {
    pub id: String,
    pub label: String,
    pub kind: CommandKind,
}

/// Every command an `Action::Invoke` may name
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
}

impl CommandRegistry {
    /// Built-ins plus user shell commands. A user id that shadows a built-in
    /// is skipped.
    pub fn new(user_commands: &BTreeMap<String, String>) -> Self {
        let mut entries: Vec<CommandEntry> = BUILTIN_COMMANDS
            .iter()
            .map(|def| CommandEntry {
                id: def.id.to_string(),
                label: def.label.to_string(),
                kind: CommandKind::Builtin(def.request),
            })
            .collect();

        for (id, command_line) in user_commands {
            if BUILTIN_COMMANDS.iter().any(|def| def.id == id) {
                tracing::warn!("User command {} shadows a built-in, skipping", id);
                continue;
            }
            entries.push(CommandEntry {
                id: id.clone(),
                label: id.clone(),
                kind: CommandKind::Shell(command_line.clone()),
            });
        }

        Self { entries }
    }

    pub fn get(&self, id: &str) -> Option<&CommandEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fuzzy-search commands by label and id, best match first.
    ///
    /// An empty query lists everything by label.
    pub fn search(&self, query: &str) -> Vec<&CommandEntry> {
        let query = query.trim();
        if query.is_empty() {
            let mut all: Vec<_> = self.entries.iter().collect();
            all.sort_by(|a, b| a.label.cmp(&b.label));
            return all;
        }

        let pattern = Pattern::parse(query, CaseMatching::Ignore, Normalization::Smart);
        let mut matcher = Matcher::new(nucleo_matcher::Config::DEFAULT);
        let mut buf = Vec::new();
        let mut score = |haystack: &str| {
            buf.clear();
            pattern.score(Utf32Str::new(haystack, &mut buf), &mut matcher)
        };

        let mut hits: Vec<(u32, &CommandEntry)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let best = score(&entry.label).max(score(&entry.id))?;
                Some((best, entry))
            })
            .collect();

        hits.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| a.label.cmp(&b.label)));
        hits.into_iter().map(|(_, entry)| entry).collect()
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Starts external processes
pub trait Launcher {
    fn spawn_shell(&mut self, command_line: &str) -> std::io::Result<()>;
    fn open_path(&mut self, path: &Path) -> std::io::Result<()>;
}

/// Launcher backed by the OS
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn spawn_shell(&mut self, command_line: &str) -> std::io::Result<()> {
        shell_command(command_line)
            .stdin(Stdio::null())
            .spawn()
            .map(|_| ())
    }

    fn open_path(&mut self, path: &Path) -> std::io::Result<()> {
        open::that_detached(path)
    }
}

#[cfg(target_os = "windows")]
fn shell_command(command_line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command_line);
    cmd
}

#[cfg(not(target_os = "windows"))]
fn shell_command(command_line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command_line);
    cmd
}

/// Dispatcher that resolves actions against a [`CommandRegistry`]
pub struct HostDispatcher<'a> {
    registry: &'a CommandRegistry,
    launcher: &'a mut dyn Launcher,
    requests: Vec<HostRequest>,
}

impl<'a> HostDispatcher<'a> {
    pub fn new(registry: &'a CommandRegistry, launcher: &'a mut dyn Launcher) -> Self {
        Self {
            registry,
            launcher,
            requests: Vec::new(),
        }
    }

    /// Built-in requests collected so far, in dispatch order
    pub fn take_requests(&mut self) -> Vec<HostRequest> {
        std::mem::take(&mut self.requests)
    }
}

impl Dispatcher for HostDispatcher<'_> {
    fn run(&mut self, action: &Action) -> Result<(), DispatchError> {
        match action {
            Action::Invoke { id, .. } => {
                let entry = self
                    .registry
                    .get(id)
                    .ok_or_else(|| DispatchError::UnknownCommand(id.clone()))?;
                match &entry.kind {
                    CommandKind::Builtin(request) => {
                        self.requests.push(*request);
                        Ok(())
                    }
                    CommandKind::Shell(command_line) => {
                        tracing::info!("Running {}: {}", id, command_line);
                        self.launcher
                            .spawn_shell(command_line)
                            .map_err(|e| DispatchError::Spawn {
                                id: id.clone(),
                                message: e.to_string(),
                            })
                    }
                }
            }
            Action::Open { path, .. } => {
                tracing::info!("Opening {}", path.display());
                self.launcher
                    .open_path(path)
                    .map_err(|e| DispatchError::Open {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    })
            }
        }
    }
}
