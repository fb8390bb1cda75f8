use anyhow::{Context, Result};
use clap::Parser;
use winit::event_loop::EventLoop;

use leader_keys::cli::{execute, CliArgs, CliCommand};
use leader_keys::settings::SettingsStore;

mod runtime;

use runtime::App;

fn main() -> Result<()> {
    let args = CliArgs::parse();
    leader_keys::tracing::init(if args.verbose { "debug" } else { "warn" });

    let settings_path = args.settings_path();

    match args.command() {
        CliCommand::Run => {
            let event_loop = EventLoop::new()?;
            let mut app = App::new(settings_path);
            event_loop.run_app(&mut app)?;
        }
        command => {
            let path = settings_path.context("No config directory available; pass --settings")?;
            let mut store = SettingsStore::open(path)?;
            let stdout = std::io::stdout();
            execute(&command, &mut store, &mut stdout.lock())?;
        }
    }

    Ok(())
}
