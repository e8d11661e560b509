use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "restabuild-status",
    version,
    about = "recent builds of a restabuild server",
    long_about = "Shows the recent builds of a restabuild server, page by page, and keeps the list fresh.\n\nExamples:\n  restabuild-status -u http://localhost:8080/\n  restabuild-status -u http://localhost:8080/ --limit 25 --refresh 10\n  restabuild-status -u http://localhost:8080/ --once -o json\n\nWhile running, type o (older), n (newer), r (reload), b (back/forward restore), c <id> (cancel) or q (quit)."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format: text, json or html."
    )]
    pub output_format: Option<String>,

    #[arg(
        long = "utc",
        help_heading = "Output",
        help = "Show queue times in UTC instead of local time."
    )]
    pub utc: bool,

    #[arg(
        short = 'u',
        long = "url",
        value_name = "URL",
        help_heading = "Input",
        help = "Base URL of the restabuild server."
    )]
    pub url: Option<String>,

    #[arg(
        short = 'C',
        long = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.restabuild-status/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "git-url",
        value_name = "URL",
        help_heading = "Form",
        help = "Prefill the build form's repository URL (overrides ?url= on --url)."
    )]
    pub git_url: Option<String>,

    #[arg(
        long = "branch",
        value_name = "NAME",
        help_heading = "Form",
        help = "Prefill the build form's branch (overrides ?branch= on --url)."
    )]
    pub branch: Option<String>,

    #[arg(
        long = "param",
        value_name = "VALUE",
        help_heading = "Form",
        help = "Prefill the build form's parameter (overrides ?param= on --url)."
    )]
    pub param: Option<String>,

    #[arg(
        short = 'l',
        long = "limit",
        value_name = "N",
        help_heading = "Paging",
        help = "Builds per page."
    )]
    pub limit: Option<u32>,

    #[arg(
        short = 's',
        long = "skip",
        value_name = "N",
        help_heading = "Paging",
        help = "Builds to skip on the first page."
    )]
    pub skip: Option<u32>,

    #[arg(
        short = 'r',
        long = "refresh",
        value_name = "SECONDS",
        help_heading = "Paging",
        help = "Reload the current page every N seconds (0 disables)."
    )]
    pub refresh: Option<u64>,

    #[arg(
        long = "once",
        help_heading = "Paging",
        help = "Print one page and exit."
    )]
    pub once: bool,

    #[arg(
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Request timeout in seconds."
    )]
    pub timeout: Option<usize>,

    #[arg(
        short = 'p',
        long = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "Send requests through this proxy."
    )]
    pub proxy: Option<String>,
}
