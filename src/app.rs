use std::io::Write;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing_subscriber::EnvFilter;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::controller::{Activation, Completion, PaginationCursor, DEFAULT_PAGE_SIZE};
use crate::dom::ID_ATTRIBUTE;
use crate::fetcher::{BuildsApi, ClientOptions};
use crate::form::FormState;
use crate::history::PageShowEvent;
use crate::model::{BuildStatus, DisplayZone};
use crate::output::{self, OutputFormat};
use crate::page::{PageOptions, StatusPage};
use crate::renderer::cancel_action;

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Command {
    Older,
    Newer,
    Reload,
    Restore,
    Cancel(String),
    Curl,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Command> {
        let mut parts = line.split_whitespace();
        let head = parts.next()?.to_lowercase();
        let cmd = match head.as_str() {
            "o" | "older" => Command::Older,
            "n" | "newer" => Command::Newer,
            "r" | "reload" => Command::Reload,
            "b" | "back" | "restore" => Command::Restore,
            "c" | "cancel" => Command::Cancel(parts.next()?.to_string()),
            "curl" => Command::Curl,
            "h" | "help" | "?" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            _ => return None,
        };
        Some(cmd)
    }
}

#[derive(Clone, Debug)]
struct RunConfig {
    base_url: String,
    limit: u32,
    skip: u32,
    refresh: Option<Duration>,
    timeout: usize,
    proxy: Option<String>,
    output_format: OutputFormat,
    zone: DisplayZone,
    // query string the server URL was given with, seeds the form
    query: String,
    git_url: Option<String>,
    branch: Option<String>,
    param: Option<String>,
    once: bool,
    no_color: bool,
    verbose: u8,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let base_url = args
        .url
        .or(cfg.url)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| "a server URL is required (--url or 'url' in the config file)".to_string())?;
    crate::fetcher::parse_base_url(&base_url).map_err(|e| e.to_string())?;
    let query = reqwest::Url::parse(&base_url)
        .ok()
        .and_then(|u| u.query().map(str::to_string))
        .unwrap_or_default();

    let limit = args.limit.or(cfg.limit).unwrap_or(DEFAULT_PAGE_SIZE);
    if limit == 0 {
        return Err("invalid limit, expected positive integer".to_string());
    }
    let skip = args.skip.unwrap_or(0);

    let refresh_seconds = args.refresh.or(cfg.refresh).unwrap_or(5);
    let refresh = if refresh_seconds == 0 {
        None
    } else {
        Some(Duration::from_secs(refresh_seconds))
    };

    let timeout = args.timeout.or(cfg.timeout).unwrap_or(10);
    if timeout == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    let proxy = args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty());

    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => OutputFormat::parse(&raw)
            .ok_or_else(|| format!("invalid output format '{raw}', expected text, json or html"))?,
        None => OutputFormat::Text,
    };

    let zone = if args.utc || cfg.utc.unwrap_or(false) {
        DisplayZone::Utc
    } else {
        DisplayZone::Local
    };

    Ok(RunConfig {
        base_url,
        limit,
        skip,
        refresh,
        timeout,
        proxy,
        output_format,
        zone,
        query,
        git_url: args.git_url,
        branch: args.branch,
        param: args.param,
        once: args.once,
        no_color: args.no_color || cfg.no_color.unwrap_or(false),
        verbose: args.verbose.max(cfg.verbose.unwrap_or(0)),
    })
}

/// The form as the page would show it: seeded from the URL's query, then
/// overridden by explicit flags.
fn seed_form(run: &RunConfig) -> FormState {
    let mut form = FormState::from_query(&run.query);
    if let Some(v) = &run.git_url {
        form.git_url = v.clone();
    }
    if let Some(v) = &run.branch {
        form.branch = v.clone();
    }
    if let Some(v) = &run.param {
        form.param = v.clone();
    }
    form
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("restabuild_status={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn colorize_status(line: String, status: Option<BuildStatus>) -> ColoredString {
    match status {
        Some(BuildStatus::Success) => line.green(),
        Some(BuildStatus::Failure) | Some(BuildStatus::TimedOut) => line.red(),
        Some(BuildStatus::Cancelled) | Some(BuildStatus::Cancelling) => line.dimmed(),
        Some(BuildStatus::Queued) | Some(BuildStatus::InProgress) => line.yellow(),
        _ => line.normal(),
    }
}

fn print_page(page: &StatusPage<BuildsApi>) {
    let controller = page.controller();
    let cursor = controller.cursor();
    println!();
    format_kv_line(
        "Builds",
        &format!("skip {} limit {}", cursor.skip, cursor.limit),
    );
    if controller.list().is_empty() {
        println!("   {}", "(no builds)".dimmed());
    }
    for item in controller.list().items() {
        let id = item.attr(ID_ATTRIBUTE).unwrap_or_default();
        let status = controller
            .rendered()
            .iter()
            .find(|b| b.id == id)
            .map(|b| b.typed_status());
        let line = colorize_status(output::item_line(item), status);
        println!("   {} {}", format!("{id:>8}").dimmed(), line);
    }

    let controls = controller.controls();
    if controls.group_visible {
        let mut hints: Vec<String> = Vec::new();
        if controls.newer.is_visible() {
            hints.push("[n] newer".to_string());
        }
        if controls.older.is_visible() {
            hints.push("[o] older".to_string());
        }
        println!(":: {}", hints.join("  ").bold());
    }
}

fn write_stdout(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)?;
    stdout.flush()
}

fn print_outcome(page: &StatusPage<BuildsApi>, format: OutputFormat, outcome: &Completion) {
    match outcome {
        Completion::Failed(e) => println!(
            "{}{}{} {}",
            "[".bold().white(),
            "ERR".bold().red(),
            "]".bold().white(),
            e
        ),
        Completion::Stale => {}
        Completion::Rendered { .. } => match format {
            OutputFormat::Text => print_page(page),
            other => {
                if let Err(e) = write_stdout(&output::render(other, page)) {
                    tracing::warn!(error = %e, "failed to write output");
                }
            }
        },
    }
}

fn print_help() {
    println!(":: commands: o(lder) n(ewer) r(eload) b(ack) c(ancel) <id> curl h(elp) q(uit)");
}

fn spinner(enabled: bool) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message("loading builds");
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(i) => {
            i.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn with_spinner<Fut, T>(show: bool, fut: Fut) -> T
where
    Fut: std::future::Future<Output = T>,
{
    let pb = spinner(show);
    let out = fut.await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    out
}

async fn cancel_build(page: &StatusPage<BuildsApi>, id: &str) {
    let action = page
        .controller()
        .list()
        .find_by_id(id)
        .and_then(cancel_action)
        .map(str::to_string);
    let Some(action) = action else {
        println!(":: build {id} is not on this page or cannot be cancelled");
        return;
    };
    match page.fetcher().cancel(&action).await {
        Ok(()) => println!(":: cancel requested for {id}"),
        Err(e) => {
            tracing::warn!(error = %e, id, "cancel failed");
            println!("{} {}", "cancel failed:".red(), e);
        }
    }
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }

    let api = BuildsApi::new(
        &run.base_url,
        &ClientOptions {
            timeout_seconds: run.timeout,
            proxy: run.proxy.clone(),
        },
    )
    .map_err(|e| e.to_string())?;
    let options = PageOptions {
        page_size: run.limit,
        zone: run.zone,
        form_action: api.submit_url(),
        // the location is re-encoded when mirrored
        path: percent_encoding::percent_decode_str(api.base().path())
            .decode_utf8_lossy()
            .into_owned(),
        query: run.query.clone(),
    };
    let mut page = StatusPage::new(api, options);
    *page.form_mut() = seed_form(&run);

    let interactive = !run.once;
    let req = page
        .controller_mut()
        .request(PaginationCursor::new(run.limit, run.skip));
    let outcome = with_spinner(interactive, page.load(req)).await;

    if run.once {
        if let Completion::Failed(e) = outcome {
            return Err(e.to_string());
        }
        write_stdout(&output::render(run.output_format, &page))
            .map_err(|e| format!("failed to write output: {e}"))?;
        return Ok(());
    }

    format_kv_line("Server", &run.base_url);
    format_kv_line(
        "Refresh",
        &run.refresh
            .map(|d| format!("{}s", d.as_secs()))
            .unwrap_or_else(|| "off".to_string()),
    );
    format_kv_line("UTC", format_bool(run.zone == DisplayZone::Utc));
    print_outcome(&page, run.output_format, &outcome);
    print_help();

    let mut ticker = run.refresh.map(|period| {
        let mut i = tokio::time::interval_at(Instant::now() + period, period);
        i.set_missed_tick_behavior(MissedTickBehavior::Delay);
        i
    });
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => return Err(format!("failed to read command: {e}")),
                };
                if line.trim().is_empty() {
                    continue;
                }
                let Some(cmd) = Command::parse(&line) else {
                    println!(":: unknown command '{}'", line.trim());
                    print_help();
                    continue;
                };
                let outcome = match cmd {
                    Command::Quit => break,
                    Command::Help => {
                        print_help();
                        None
                    }
                    Command::Curl => {
                        println!("{}", page.curl_command());
                        None
                    }
                    Command::Cancel(id) => {
                        cancel_build(&page, &id).await;
                        None
                    }
                    Command::Older => {
                        let outcome = with_spinner(true, page.activate(Activation::Older)).await;
                        if outcome.is_none() {
                            println!(":: no older builds");
                        }
                        outcome
                    }
                    Command::Newer => {
                        let outcome = with_spinner(true, page.activate(Activation::Newer)).await;
                        if outcome.is_none() {
                            println!(":: already showing the newest builds");
                        }
                        outcome
                    }
                    Command::Reload => with_spinner(true, page.refresh()).await,
                    Command::Restore => {
                        with_spinner(true, page.page_show(PageShowEvent { persisted: true })).await
                    }
                };
                if let Some(outcome) = outcome {
                    print_outcome(&page, run.output_format, &outcome);
                }
            }
            _ = tick(&mut ticker) => {
                if let Some(outcome) = page.refresh().await {
                    print_outcome(&page, run.output_format, &outcome);
                }
            }
        }
    }

    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = e.print();
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let cfg = match args.config.as_ref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    init_logging(run.verbose);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}
