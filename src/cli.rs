use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "openness",
    version,
    about = "Openness scoring, rating and recommendation prioritization CLI"
)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Openness, initial openness and completeness per task
    Rate(RateCommand),
    /// Rank eligible tasks of the cycle
    Rank(RankCommand),
    /// Recommendation costs of one task
    Costs(CostsCommand),
    /// Current vs interim score table of one task
    Table(TableCommand),
    /// Record a score through the revision manager
    Score(ScoreCommand),
    /// Validate every stored score
    Check(CheckCommand),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Subset {
    All,
    Npa,
    NonNpa,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ReportFormat {
    Json,
    Md,
}

#[derive(Args)]
pub struct SubsetArgs {
    #[arg(long, value_enum, default_value = "all", conflicts_with = "parameters")]
    pub subset: Subset,

    /// Explicit parameter codes, comma separated
    #[arg(long, value_delimiter = ',')]
    pub parameters: Vec<u32>,
}

#[derive(Args)]
pub struct RateCommand {
    pub dataset: PathBuf,
    #[command(flatten)]
    pub subset: SubsetArgs,
    #[arg(long)]
    pub task: Option<u64>,
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,
}

#[derive(Args)]
pub struct RankCommand {
    pub dataset: PathBuf,
    #[command(flatten)]
    pub subset: SubsetArgs,
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,
}

#[derive(Args)]
pub struct CostsCommand {
    pub dataset: PathBuf,
    #[arg(long)]
    pub task: u64,
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,
}

#[derive(Args)]
pub struct TableCommand {
    pub dataset: PathBuf,
    #[arg(long)]
    pub task: u64,
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,
}

#[derive(Args)]
pub struct ScoreCommand {
    pub dataset: PathBuf,
    #[arg(long)]
    pub task: u64,
    #[arg(long)]
    pub parameter: u32,
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=1))]
    pub found: u8,
    #[arg(long)]
    pub complete: Option<u8>,
    #[arg(long)]
    pub topical: Option<u8>,
    #[arg(long)]
    pub accessible: Option<u8>,
    #[arg(long)]
    pub hypertext: Option<u8>,
    #[arg(long)]
    pub document: Option<u8>,
    #[arg(long)]
    pub image: Option<u8>,
    #[arg(long)]
    pub recommendation: Option<String>,
    #[arg(long)]
    pub links: Option<String>,
    #[arg(long)]
    pub accomplished: Option<bool>,
}

#[derive(Args)]
pub struct CheckCommand {
    pub dataset: PathBuf,
}
