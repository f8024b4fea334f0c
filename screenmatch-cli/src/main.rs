use clap::Parser;
use screenmatch::{
    DisposalPolicy, ElementQuery, FileScreen, Match, Method, PollSchedule, QueryConfig,
    SearchResult, TrackedElement, VisibilityPoller,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "screenmatch CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DisposalConfig {
    #[default]
    Confidence,
    Vertical,
    Horizontal,
}

impl From<DisposalConfig> for DisposalPolicy {
    fn from(value: DisposalConfig) -> Self {
        match value {
            DisposalConfig::Confidence => DisposalPolicy::Confidence,
            DisposalConfig::Vertical => DisposalPolicy::Vertical,
            DisposalConfig::Horizontal => DisposalPolicy::Horizontal,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum MethodConfig {
    #[default]
    CcoeffNormed,
    CcorrNormed,
    SqdiffNormed,
}

impl From<MethodConfig> for Method {
    fn from(value: MethodConfig) -> Self {
        match value {
            MethodConfig::CcoeffNormed => Method::CcoeffNormed,
            MethodConfig::CcorrNormed => Method::CcorrNormed,
            MethodConfig::SqdiffNormed => Method::SqdiffNormed,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum WaitUntil {
    #[default]
    Visible,
    NotVisible,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct WaitConfig {
    until: WaitUntil,
    timeout_ms: u64,
    poll_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            until: WaitUntil::Visible,
            timeout_ms: 5000,
            poll_ms: PollSchedule::default().interval.as_millis() as u64,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    screen_path: String,
    template: String,
    name: Option<String>,
    order: usize,
    disposal: DisposalConfig,
    similarity: f32,
    method: MethodConfig,
    max_occurrences: usize,
    debug_dir: Option<PathBuf>,
    parallel: bool,
    wait: Option<WaitConfig>,
    output_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let cfg = QueryConfig::default();
        Self {
            screen_path: String::new(),
            template: String::new(),
            name: None,
            order: cfg.order_index,
            disposal: DisposalConfig::Confidence,
            similarity: cfg.similarity,
            method: MethodConfig::CcoeffNormed,
            max_occurrences: cfg.max_occurrences,
            debug_dir: None,
            parallel: cfg.parallel,
            wait: None,
            output_path: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct MatchRecord {
    center_x: u32,
    center_y: u32,
    width: u32,
    height: u32,
    similarity: f32,
}

impl From<&Match> for MatchRecord {
    fn from(value: &Match) -> Self {
        Self {
            center_x: value.center_x,
            center_y: value.center_y,
            width: value.width,
            height: value.height,
            similarity: value.similarity,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    name: String,
    selected: Option<MatchRecord>,
    matches: Vec<MatchRecord>,
}

impl From<&SearchResult> for Output {
    fn from(value: &SearchResult) -> Self {
        Self {
            name: value.name().to_owned(),
            selected: value.selected().ok().map(MatchRecord::from),
            matches: value.iter().map(MatchRecord::from).collect(),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("screenmatch=debug".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.screen_path.is_empty() || config.template.is_empty() {
        return Err("screen_path and template must be set in the config".into());
    }

    let query = ElementQuery::new(QueryConfig {
        template_source: config.template,
        name: config.name,
        order_index: config.order,
        disposal: config.disposal.into(),
        similarity: config.similarity,
        method: config.method.into(),
        max_occurrences: config.max_occurrences,
        parallel: config.parallel,
        debug_dir: config.debug_dir,
        ..QueryConfig::default()
    });
    let screen = FileScreen::new(&config.screen_path);

    let output = match config.wait {
        Some(wait) => {
            let poller =
                VisibilityPoller::new(PollSchedule::fixed(Duration::from_millis(wait.poll_ms)));
            let mut element = TrackedElement::new(query, screen).with_poller(poller);
            let timeout = Duration::from_millis(wait.timeout_ms);
            match wait.until {
                WaitUntil::Visible => {
                    element.wait_until_visible(timeout)?;
                }
                WaitUntil::NotVisible => element.wait_until_not_visible(timeout)?,
            }
            Output::from(element.result()?)
        }
        None => {
            let mut screen = screen;
            Output::from(&query.search(&mut screen)?)
        }
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
