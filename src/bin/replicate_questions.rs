use std::env;

use anyhow::Context;
use edugame::{
    api::HttpClient,
    config::Config,
    ingest::replicate,
    logging::{init_logging, LogFormat},
};
use tracing::Level;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

pub struct Args {
    pub question_ids: Vec<String>,
    pub points: Option<u32>,
}

fn parse_args(args: impl Iterator<Item = String>) -> anyhow::Result<Args> {
    let mut question_ids = Vec::new();
    let mut points = None;
    let mut args = args;

    while let Some(arg) = args.next() {
        if arg == "--points" {
            let value = args.next().context("--points needs a value")?;
            points = Some(value.parse::<u32>().context("--points must be a number")?);
        } else {
            question_ids.push(arg);
        }
    }

    if question_ids.is_empty() {
        anyhow::bail!("at least one question id is required");
    }
    Ok(Args {
        question_ids,
        points,
    })
}

fn main() -> anyhow::Result<()> {
    init_logging(Level::INFO, LogFormat::Pretty);

    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Usage: replicate_questions <question_id>... [--points N]");
            return Err(e);
        }
    };

    let config = Config::from_env().context("invalid configuration")?;
    let client = HttpClient::new(&config).context("invalid EDUGAME_API_URL")?;
    let points = args.points.unwrap_or(config.game_points);

    let report = replicate(&client, &args.question_ids, points);
    for failed in report.results.iter().filter(|r| !r.succeeded()) {
        eprintln!(
            "question {} -> game {}: {}",
            failed.question_id,
            failed.game_id,
            failed.error.as_deref().unwrap_or_default()
        );
    }
    if let Some(listing_error) = &report.listing_error {
        eprintln!("game listing incomplete: {}", listing_error);
    }

    println!(
        "attached {BOLD}{}{RESET} of {} question/game pairs across {BOLD}{}{RESET} games",
        report.succeeded(),
        report.attempted(),
        report.games
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn ids_and_points() {
        let parsed = parse_args(args(&["q1", "--points", "5", "q2"])).unwrap();
        assert_eq!(parsed.question_ids, vec!["q1", "q2"]);
        assert_eq!(parsed.points, Some(5));
    }

    #[test]
    fn ids_are_required() {
        assert!(parse_args(args(&["--points", "5"])).is_err());
    }
}
