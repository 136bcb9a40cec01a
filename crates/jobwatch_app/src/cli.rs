use std::fs;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use jobwatch_core::{Msg, PollMode, RuleSelection};
use jobwatch_engine::{EngineHandle, JobSummary};
use jobwatch_logging::jobwatch_info;
use url::Url;

use crate::config::AppConfig;
use crate::platform::app::{run_watch, WatchLoop};
use crate::platform::effects::EffectRunner;
use crate::platform::logging::{self, LogDestination};
use crate::platform::persistence::{ClientState, StateStore};
use crate::platform::ui::render::RenderOptions;

const LIST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
#[command(name = "jobwatch", version)]
#[command(about = "Submit marketplace check jobs and follow them until they finish")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config RON. If omitted, uses ./jobwatch.ron if present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Job server root, e.g. http://127.0.0.1:5000/
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[arg(long, value_enum, global = true)]
    pub log: Option<LogDestination>,

    /// Debug-level logging.
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submit a full job (search, seller pass and testing) and watch it.
    Batch(SubmitArgs),
    /// Submit a search-only job and watch it.
    Search(SubmitArgs),
    /// Resume watching the remembered job.
    Watch {
        /// Directory for exports.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// List recent jobs on the server.
    Jobs,
    /// Clear the remembered job id.
    Forget,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct SubmitArgs {
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub seller: Option<String>,
    /// File with one product URL per line; skips the search phase.
    #[arg(long)]
    pub urls_file: Option<PathBuf>,
    #[arg(long)]
    pub scenario: Option<String>,
    #[arg(long = "ok-rule")]
    pub ok_rules: Vec<String>,
    #[arg(long = "error-rule")]
    pub error_rules: Vec<String>,
    /// Ask the server to search with a clean browser profile.
    #[arg(long)]
    pub fresh_profile: bool,
    /// Directory for exports.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

impl SubmitArgs {
    /// Form edits followed by the submission itself.
    pub fn to_msgs(&self, mode: PollMode) -> Result<Vec<Msg>> {
        let mut msgs = vec![
            Msg::SearchChanged(self.search.clone().unwrap_or_default()),
            Msg::SellerChanged(self.seller.clone().unwrap_or_default()),
        ];
        if let Some(path) = &self.urls_file {
            let text = fs::read_to_string(path)
                .with_context(|| format!("read urls file: {}", path.display()))?;
            msgs.push(Msg::ManualUrlsChanged(text));
        }
        if let Some(scenario) = &self.scenario {
            msgs.push(Msg::ScenarioSelected(scenario.clone()));
        }
        if !self.ok_rules.is_empty() {
            msgs.push(Msg::OkRulesChanged(RuleSelection::enabled(self.ok_rules.clone())));
        }
        if !self.error_rules.is_empty() {
            msgs.push(Msg::ErrorRulesChanged(RuleSelection::enabled(
                self.error_rules.clone(),
            )));
        }
        msgs.push(Msg::FreshProfileToggled(self.fresh_profile));
        msgs.push(Msg::SubmitClicked(mode));
        Ok(msgs)
    }
}

pub fn dispatch(args: Args) -> Result<()> {
    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(log) = args.log {
        config.log = log;
    }
    config.verbose |= args.verbose;

    logging::initialize(config.log, config.verbose);
    let store = StateStore::new(config.state_file.clone());

    match &args.cmd {
        Command::Forget => {
            store.remember_job(None);
            println!("Remembered job cleared ({})", store.path().display());
            Ok(())
        }
        Command::Jobs => list_jobs(&config, store),
        Command::Watch { output_dir } => {
            let client = store.load();
            let Some(job_id) = client.last_job_id.clone() else {
                println!("No remembered job. Start one with `jobwatch batch`.");
                return Ok(());
            };
            jobwatch_info!("Probing remembered job {}", job_id);
            let initial = vec![restored(&client, true)];
            watch(&config, store, output_dir.as_ref(), initial)
        }
        Command::Batch(submit) => {
            let mut initial = vec![restored(&store.load(), false)];
            initial.extend(submit.to_msgs(PollMode::Full)?);
            watch(&config, store, submit.output_dir.as_ref(), initial)
        }
        Command::Search(submit) => {
            let mut initial = vec![restored(&store.load(), false)];
            initial.extend(submit.to_msgs(PollMode::SearchOnly)?);
            watch(&config, store, submit.output_dir.as_ref(), initial)
        }
    }
}

/// Start-up message from the state file. Fresh submissions skip the probe
/// so a remembered job cannot race the new one.
pub fn restored(client: &ClientState, resume: bool) -> Msg {
    Msg::Restored {
        last_job_id: if resume {
            client.last_job_id.clone()
        } else {
            None
        },
        scenario_id: client.scenario_id.clone(),
        theme: client.theme(),
    }
}

fn watch(
    config: &AppConfig,
    store: StateStore,
    output_dir: Option<&PathBuf>,
    initial: Vec<Msg>,
) -> Result<()> {
    let engine = EngineHandle::new(config.engine_config())?;
    let runner = EffectRunner::new(engine, store);
    let options = RenderOptions {
        color: io::stdout().is_terminal(),
        base_url: Url::parse(&config.base_url).ok(),
    };
    let output_dir = output_dir
        .unwrap_or(&config.output_dir)
        .display()
        .to_string();

    let app = WatchLoop::new(runner, options, output_dir, io::stdout());
    run_watch(app, initial).context("watch loop")
}

fn list_jobs(config: &AppConfig, store: StateStore) -> Result<()> {
    let engine = EngineHandle::new(config.engine_config())?;
    let mut runner = EffectRunner::new(engine, store);
    let jobs = runner
        .list_jobs(LIST_TIMEOUT)
        .ok_or_else(|| anyhow!("no answer from {} within {:?}", config.base_url, LIST_TIMEOUT))?
        .map_err(|message| anyhow!("listing jobs failed: {message}"))?;

    if jobs.is_empty() {
        println!("No jobs on the server.");
    }
    for job in &jobs {
        println!("{}", job_row(job));
    }
    Ok(())
}

pub fn job_row(job: &JobSummary) -> String {
    format!("{:<34} {:<8} {:>5}/{:<5}", job.id, job.status, job.done, job.total)
}
