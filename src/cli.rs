//! Command-line interface
//!
//! `leader` with no subcommand runs the host window. The other subcommands
//! edit or inspect the settings file and exit.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::keymap::{parse_sequence, Action, Hotkey, Mapping, Platform, Sequence};
use crate::leader::NO_MAPPINGS_NOTICE;
use crate::settings::SettingsStore;
use crate::simulate::{simulate, Step};

/// Leader-key sequences: press a chord, then type a short sequence
#[derive(Parser, Debug)]
#[command(name = "leader", version, about = "Leader-key sequences for the desktop")]
pub struct CliArgs {
    /// Settings file to use instead of ~/.config/leader-keys/settings.yaml
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Log debug output to the console
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Open the leader window (default)
    Run,
    /// List mappings, numbered for edit/remove
    List {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Add a mapping
    Add {
        /// Trigger sequence, e.g. "g g" or "mod+k t"
        trigger: String,
        /// open:<PATH>, invoke:<ID> or a bare command id; repeat for a chain
        #[arg(short, long = "action", value_name = "ACTION", required = true)]
        actions: Vec<String>,
        /// Display name for each action, in order
        #[arg(short, long = "name", value_name = "LABEL")]
        names: Vec<String>,
    },
    /// Replace the trigger and/or chain of a mapping
    Edit {
        /// Mapping number from `leader list`
        index: usize,
        #[arg(short, long)]
        trigger: Option<String>,
        #[arg(short, long = "action", value_name = "ACTION")]
        actions: Vec<String>,
        #[arg(short, long = "name", value_name = "LABEL")]
        names: Vec<String>,
    },
    /// Remove a mapping
    Remove {
        /// Mapping number from `leader list`
        index: usize,
    },
    /// Change the leader chord, e.g. "mod+space"
    SetLeader { hotkey: String },
    /// Change the idle timeout (and optionally the chain debounce), in ms
    SetTimeout {
        ms: u64,
        #[arg(long = "multi-key", value_name = "MS")]
        multi_key: Option<u64>,
    },
    /// Replay keys without side effects, e.g. `mod+space g wait:600`
    Simulate {
        #[arg(required = true, value_name = "STEP")]
        steps: Vec<String>,
    },
}

impl CliArgs {
    /// The subcommand, defaulting to `run`
    pub fn command(&self) -> CliCommand {
        self.command.clone().unwrap_or(CliCommand::Run)
    }

    /// Settings file from `--settings` or the default location
    pub fn settings_path(&self) -> Option<PathBuf> {
        self.settings
            .clone()
            .or_else(crate::config_paths::settings_file)
    }
}

/// `open:<PATH>` → open, `invoke:<ID>` or anything else → invoke
pub fn parse_action(text: &str) -> Result<Action> {
    let text = text.trim();
    let action = if let Some(path) = text.strip_prefix("open:") {
        Action::open(path.trim())
    } else {
        Action::invoke(text.strip_prefix("invoke:").unwrap_or(text).trim())
    };
    match &action {
        Action::Open { path, .. } if path.as_os_str().is_empty() => bail!("empty path in {text:?}"),
        Action::Invoke { id, .. } if id.is_empty() => bail!("empty command id in {text:?}"),
        _ => Ok(action),
    }
}

/// Build a chain, labelling actions positionally with `names`
pub fn build_chain(actions: &[String], names: &[String]) -> Result<Vec<Action>> {
    if names.len() > actions.len() {
        bail!(
            "{} names given for {} actions",
            names.len(),
            actions.len()
        );
    }
    actions
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let action = parse_action(text)?;
            Ok(match names.get(i) {
                Some(name) => action.named(name.clone()),
                None => action,
            })
        })
        .collect()
}

fn parse_trigger(text: &str) -> Result<Sequence> {
    parse_sequence(text, Platform::current()).with_context(|| format!("invalid trigger {text:?}"))
}

/// 1-based mapping number → table index
fn table_index(number: usize) -> Result<usize> {
    number
        .checked_sub(1)
        .context("mappings are numbered from 1")
}

#[derive(Serialize)]
struct ListedMapping<'a> {
    number: usize,
    display: String,
    label: String,
    #[serde(flatten)]
    mapping: &'a Mapping,
}

/// Run a settings subcommand against `store`, writing output to `out`
pub fn execute(command: &CliCommand, store: &mut SettingsStore, out: &mut dyn Write) -> Result<()> {
    match command {
        CliCommand::Run => bail!("`run` is handled by the host"),
        CliCommand::List { json } => {
            let table = &store.settings().mappings;
            if *json {
                let rows: Vec<_> = table
                    .iter()
                    .enumerate()
                    .map(|(i, mapping)| ListedMapping {
                        number: i + 1,
                        display: mapping.trigger_display(),
                        label: mapping.chain_display(),
                        mapping,
                    })
                    .collect();
                serde_json::to_writer_pretty(&mut *out, &rows)?;
                writeln!(out)?;
            } else if table.is_empty() {
                writeln!(out, "{}", NO_MAPPINGS_NOTICE)?;
            } else {
                for (i, (trigger, chain)) in table.help_rows().into_iter().enumerate() {
                    writeln!(out, "{:>3}. {}: {}", i + 1, trigger, chain)?;
                }
            }
        }
        CliCommand::Add {
            trigger,
            actions,
            names,
        } => {
            let mapping = Mapping::new(parse_trigger(trigger)?, build_chain(actions, names)?);
            let shown = mapping.trigger_display();
            store.add_mapping(mapping)?;
            writeln!(out, "Added {}", shown)?;
        }
        CliCommand::Edit {
            index,
            trigger,
            actions,
            names,
        } => {
            let idx = table_index(*index)?;
            let current = store
                .settings()
                .mappings
                .get(idx)
                .cloned()
                .with_context(|| format!("no mapping numbered {index}"))?;

            let trigger = match trigger {
                Some(text) => parse_trigger(text)?,
                None => current.trigger,
            };
            let chain = if actions.is_empty() {
                if !names.is_empty() {
                    bail!("--name needs --action when editing");
                }
                current.actions
            } else {
                build_chain(actions, names)?
            };

            let mapping = Mapping::new(trigger, chain);
            let shown = mapping.trigger_display();
            store.update_mapping(idx, mapping)?;
            writeln!(out, "Updated {}", shown)?;
        }
        CliCommand::Remove { index } => {
            let removed = store.remove_mapping(table_index(*index)?)?;
            writeln!(out, "Removed {}", removed.trigger_display())?;
        }
        CliCommand::SetLeader { hotkey } => {
            let hotkey = Hotkey::parse(hotkey, Platform::current())
                .with_context(|| format!("invalid hotkey {hotkey:?}"))?;
            let shown = hotkey.display_string();
            store.set_leader_key(hotkey)?;
            writeln!(out, "Leader is now {}", shown)?;
        }
        CliCommand::SetTimeout { ms, multi_key } => {
            store.set_timeouts(Some(*ms), *multi_key)?;
            let settings = store.settings();
            writeln!(
                out,
                "Timeout {}ms, multi-key timeout {}ms",
                settings.timeout_ms(),
                settings.multi_key_timeout_ms()
            )?;
        }
        CliCommand::Simulate { steps } => {
            let steps = steps
                .iter()
                .map(|s| Step::parse(s, Platform::current()))
                .collect::<Result<Vec<_>, _>>()?;
            for line in simulate(store.settings(), &steps) {
                writeln!(out, "{}", line)?;
            }
        }
    }
    Ok(())
}
