use crate::cli::args::CliArgs;
use crate::output::OutputFormat;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(limit) = args.limit {
        if limit == 0 {
            return Err("invalid limit, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.output_format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected text, json or html"
            ));
        }
    }
    if let Some(raw) = args.url.as_deref() {
        crate::fetcher::parse_base_url(raw).map_err(|e| e.to_string())?;
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    Ok(())
}
