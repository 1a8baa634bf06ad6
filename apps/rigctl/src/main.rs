use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    collect_values, load_settings, ClientError, CommandClient, Form, Method, NotificationBoard,
    PresetDialog, SaveTarget, ScanController, ScanSink, ScanStart, Settings,
};
use serde_json::Value;
use shared::{
    domain::{ControllerAction, PresetId},
    form::{CommandValues, FormDescription},
    protocol::ScanEvent,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Drive an LED rig controller from the command line")]
struct Cli {
    /// Overrides `controller_url` from rigctl.toml and the environment.
    #[arg(long)]
    controller_url: Option<String>,
    #[arg(long)]
    timeout_ms: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect values from a form snapshot and send them.
    Send {
        path: String,
        /// JSON form description: `{"id": ..., "controls": [...]}`.
        #[arg(long)]
        form: PathBuf,
        #[arg(long, default_value = "POST")]
        method: String,
        names: Vec<String>,
    },
    /// Post `{key: value}`; the value is read as JSON, falling back to a string.
    Command {
        key: String,
        value: String,
        path: String,
    },
    Action {
        action: ActionArg,
    },
    Presets {
        #[command(subcommand)]
        command: PresetsCommand,
    },
    /// Stream discovered devices until the time runs out or Ctrl-C.
    Scan {
        #[arg(long, default_value_t = 10)]
        seconds: u64,
    },
}

#[derive(Subcommand, Debug)]
enum PresetsCommand {
    List {
        animation: String,
    },
    Apply {
        animation: String,
        /// Position in the listing; the first preset when omitted.
        #[arg(long)]
        index: Option<usize>,
    },
    Save {
        animation: String,
        name: String,
        #[arg(long)]
        form: PathBuf,
        /// Overwrite this preset instead of creating a new one.
        #[arg(long)]
        update: Option<i64>,
        names: Vec<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ActionArg {
    Stop,
    Shutdown,
    Restart,
}

impl From<ActionArg> for ControllerAction {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Stop => Self::StopAnimation,
            ActionArg::Shutdown => Self::Shutdown,
            ActionArg::Restart => Self::Restart,
        }
    }
}

struct PrintSink;

impl ScanSink for PrintSink {
    fn on_event(&self, event: ScanEvent) {
        println!("{}", event.data);
    }

    fn on_error(&self, err: &ClientError) {
        eprintln!("{err}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(url) = cli.controller_url {
        settings.controller_url = url;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        settings.request_timeout_ms = timeout_ms;
    }
    info!(controller = %settings.controller_url, "using controller");

    let client = CommandClient::from_settings(&settings)
        .with_context(|| format!("cannot reach '{}'", settings.controller_url))?;

    match cli.command {
        Command::Send {
            path,
            form,
            method,
            names,
        } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("invalid HTTP method '{method}'"))?;
            let values = read_values(&form, &names)?;
            let result = client.send(method, &path, &values).await;
            finish(client.notifications(), result)?;
        }
        Command::Command { key, value, path } => {
            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            let result = client.command(&key, value, &path).await;
            finish(client.notifications(), result)?;
        }
        Command::Action { action } => {
            let result = client.action(action.into()).await;
            finish(client.notifications(), result)?;
        }
        Command::Presets { command } => run_presets(client, &settings, command).await?,
        Command::Scan { seconds } => run_scan(client, &settings, seconds).await?,
    }

    Ok(())
}

async fn run_presets(client: CommandClient, settings: &Settings, command: PresetsCommand) -> Result<()> {
    let notifications = client.notifications().clone();
    match command {
        PresetsCommand::List { animation } => {
            let mut dialog = PresetDialog::new(client, settings, animation);
            let selection = finish(&notifications, dialog.open().await)?;
            for (index, entry) in selection.entries().iter().enumerate() {
                println!("{index}\t{}\t{}", entry.value(), entry.label());
            }
            dialog.cancel();
        }
        PresetsCommand::Apply { animation, index } => {
            let mut dialog = PresetDialog::new(client, settings, animation);
            finish(&notifications, dialog.open().await)?;
            if let Some(index) = index {
                finish(&notifications, dialog.select(index))?;
            }
            match dialog.confirm() {
                Some(application) => {
                    let status = finish(&notifications, dialog.apply(&application).await)?;
                    println!("applied preset {} (status {status})", application.preset_id);
                }
                None => println!("no preset to apply"),
            }
        }
        PresetsCommand::Save {
            animation,
            name,
            form,
            update,
            names,
        } => {
            let values = read_values(&form, &names)?;
            let target = update.map_or(SaveTarget::Create, |id| SaveTarget::Update(PresetId(id)));
            let mut dialog = PresetDialog::new(client, settings, animation);
            finish(&notifications, dialog.save(target, &values, &name).await)?;
        }
    }
    Ok(())
}

async fn run_scan(client: CommandClient, settings: &Settings, seconds: u64) -> Result<()> {
    let notifications = client.notifications().clone();
    let mut scan = ScanController::new(client, settings, Arc::new(PrintSink));

    if finish(&notifications, scan.start().await)? == ScanStart::AlreadyStreaming {
        warn!("scan was already streaming");
    }

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(seconds)) => {}
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
    }

    let stopped = scan.stop().await;
    match stopped.remote {
        Ok(_) => eprintln!("scan stopped"),
        Err(ClientError::Rejected { message, .. }) => eprintln!("scan stopped: {message}"),
        Err(err) => eprintln!("scan stopped locally; controller said: {err}"),
    }
    Ok(())
}

fn read_values(path: &Path, names: &[String]) -> Result<CommandValues> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read form '{}'", path.display()))?;
    let description: FormDescription = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse form '{}'", path.display()))?;
    let form = Form::from_description(&description);
    Ok(collect_values(&form, names).into_complete()?)
}

/// Prints whatever the operation left on the notification board; failures also
/// go to stderr as a JSON report.
fn finish<T>(notifications: &NotificationBoard, result: Result<T, ClientError>) -> Result<T> {
    if let Some(notification) = notifications.current() {
        println!("{}", notification.text);
    }
    match result {
        Ok(value) => Ok(value),
        Err(err) => {
            if let Ok(report) = serde_json::to_string(&err.failure()) {
                eprintln!("{report}");
            }
            Err(err.into())
        }
    }
}
