use std::path::PathBuf;

use clap::Parser;

/// Run the website crew: plan, build and review a website from a description.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "sitecrew", version, about)]
pub struct Args {
    /// Website description, e.g. "A study planner with login and calendar sync."
    #[arg(short = 'r', long)]
    pub customer_request: Option<String>,

    /// Optional explicit website name, e.g. "StudyPlanner Pro".
    #[arg(short = 'n', long)]
    pub website_name: Option<String>,

    /// Print the run summary JSON to stdout.
    #[arg(long)]
    pub json: bool,

    /// Fail if no request is provided via flag or stdin.
    #[arg(long)]
    pub no_prompt: bool,

    /// Extra crew parameter (KEY=VALUE). Can be specified multiple times.
    #[arg(short = 'p', long = "param", value_parser = parse_key_val, action = clap::ArgAction::Append)]
    pub params: Vec<(String, String)>,

    /// Application config file (TOML).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory artifacts and the run summary are written to.
    #[arg(long)]
    pub artifacts_dir: Option<String>,

    /// Validate the crew and print the execution order without running it.
    #[arg(long)]
    pub plan: bool,
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "sitecrew",
            "-r",
            "A bakery site",
            "-n",
            "Crumbs",
            "--json",
            "-p",
            "audience=families",
            "--param",
            "tone=warm=friendly",
        ])
        .unwrap();
        assert_eq!(args.customer_request.as_deref(), Some("A bakery site"));
        assert_eq!(args.website_name.as_deref(), Some("Crumbs"));
        assert!(args.json);
        assert!(!args.no_prompt);
        assert_eq!(
            args.params,
            vec![
                ("audience".to_string(), "families".to_string()),
                ("tone".to_string(), "warm=friendly".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_malformed_param() {
        assert!(Args::try_parse_from(["sitecrew", "-p", "audience"]).is_err());
        assert!(Args::try_parse_from(["sitecrew", "-p", "=x"]).is_err());
    }
}
