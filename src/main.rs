use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use edugame::{
    api::{CategoryKey, HttpClient},
    config::Config,
    ingest::{
        load_manual_batch, read_spreadsheet, run_batch, CategoryTarget, Difficulty,
        QuestionBatch, QuestionKind, RunOptions, RunReport, TrueFalseLabels,
    },
    logging::{init_logging, level_from_verbosity, LogFormat},
};
use tracing::error;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Parser)]
#[command(name = "edugame", version, about = "Bulk question import for the edu-game platform")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// -v debug, -vv trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a spreadsheet without sending anything
    Check {
        file: PathBuf,
        #[arg(long = "type")]
        kind: QuestionKind,
    },
    /// Import a spreadsheet, then add the new questions to every game
    Import {
        file: PathBuf,
        #[arg(long = "type")]
        kind: QuestionKind,
        #[command(flatten)]
        target: TargetArgs,
        /// publisher (grouping label) stored with every question
        #[arg(long)]
        publisher: String,
        /// used for rows without a difficulty column or value
        #[arg(long, default_value = "medium")]
        difficulty: Difficulty,
        #[arg(long)]
        no_replicate: bool,
    },
    /// Submit a hand-authored YAML batch
    Author {
        file: PathBuf,
        #[command(flatten)]
        target: TargetArgs,
        #[arg(long)]
        publisher: Option<String>,
        #[arg(long)]
        no_replicate: bool,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// existing category id
    #[arg(long, conflicts_with_all = ["grade", "subject", "unit", "topic"])]
    category_id: Option<String>,
    #[arg(long)]
    grade: Option<String>,
    #[arg(long)]
    subject: Option<String>,
    #[arg(long)]
    unit: Option<String>,
    #[arg(long)]
    topic: Option<String>,
}

impl TargetArgs {
    /// `None` when no target flag was given at all.
    fn into_target(self) -> Result<Option<CategoryTarget>> {
        if let Some(id) = self.category_id {
            return Ok(Some(CategoryTarget::Id(id)));
        }
        match (self.grade, self.subject, self.unit, self.topic) {
            (Some(grade), Some(subject), Some(unit), Some(topic)) => Ok(Some(CategoryTarget::Key(
                CategoryKey::new(&grade, &subject, &unit, &topic),
            ))),
            (None, None, None, None) => Ok(None),
            _ => bail!("pass --category-id, or all of --grade, --subject, --unit and --topic"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(level_from_verbosity(cli.verbose), cli.log_format);

    if let Err(e) = run(cli.command) {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Check { file, kind } => {
            let prepared = read_spreadsheet(&file, kind, Difficulty::default())
                .with_context(|| format!("failed to read {}", file.display()))?;
            print_row_errors(&prepared.batch);
            println!(
                "{BOLD}{}{RESET} rows checked ({} skipped with an empty question): {}",
                prepared.batch.len(),
                prepared.skipped_blank,
                prepared.batch.stats()
            );
            Ok(())
        }
        Command::Import {
            file,
            kind,
            target,
            publisher,
            difficulty,
            no_replicate,
        } => {
            let Some(target) = target.into_target()? else {
                bail!("import needs a target: --category-id, or --grade, --subject, --unit and --topic");
            };
            let mut prepared = read_spreadsheet(&file, kind, difficulty)
                .with_context(|| format!("failed to read {}", file.display()))?;
            print_row_errors(&prepared.batch);

            let config = Config::from_env().context("invalid configuration")?;
            let options =
                run_options(&config, kind, Some(target), Some(publisher), true, !no_replicate);
            submit(&config, &mut prepared.batch, &options)
        }
        Command::Author {
            file,
            target,
            publisher,
            no_replicate,
        } => {
            let target = target.into_target()?;
            let mut batch = load_manual_batch(&file)
                .with_context(|| format!("failed to load batch {}", file.display()))?;
            if target.is_none() && batch.category().is_none() {
                bail!("no target category: add a `category` block to the file or pass --category-id");
            }
            print_row_errors(&batch);

            let config = Config::from_env().context("invalid configuration")?;
            let options = run_options(&config, batch.kind(), target, publisher, false, !no_replicate);
            submit(&config, &mut batch, &options)
        }
    }
}

fn run_options(
    config: &Config,
    kind: QuestionKind,
    category: Option<CategoryTarget>,
    publisher: Option<String>,
    require_publisher: bool,
    replicate: bool,
) -> RunOptions {
    RunOptions {
        kind,
        category,
        publisher,
        require_publisher,
        replicate,
        game_points: config.game_points,
        labels: TrueFalseLabels {
            true_label: config.true_label.clone(),
            false_label: config.false_label.clone(),
        },
    }
}

fn submit(config: &Config, batch: &mut QuestionBatch, options: &RunOptions) -> Result<()> {
    let client = HttpClient::new(config).context("invalid EDUGAME_API_URL")?;
    let report = run_batch(&client, batch, options).context("import failed")?;
    print_report(&report);
    Ok(())
}

fn print_row_errors(batch: &QuestionBatch) {
    for item in batch.items() {
        if let Some(error) = item.validation().error() {
            println!("  #{:<4} {}", item.sequence_id(), error);
        }
    }
}

fn print_report(report: &RunReport) {
    println!("category {BOLD}{}{RESET}", report.category_id);
    println!("{}", report.stats);

    for failure in &report.failures {
        println!(
            "  #{:<4} not saved ({:?}): {}",
            failure.sequence_id, failure.stage, failure.reason
        );
    }

    if let Some(replication) = &report.replication {
        println!(
            "added to games: {BOLD}{}{RESET}/{} attempts succeeded across {} games",
            replication.succeeded(),
            replication.attempted(),
            replication.games
        );
        if let Some(listing_error) = &replication.listing_error {
            println!("  game listing incomplete: {}", listing_error);
        }
    }
}
