use crate::demo::{run_demo, run_questions, run_recommend, QuestionsArgs, RecommendArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use crop_advisor::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Crop Advisor",
    about = "Serve or query the rule-based crop advisory engine from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the questions still open for a set of answers
    Questions(QuestionsArgs),
    /// Recommend outcomes for a set of answers
    Recommend(RecommendArgs),
    /// Walk the bundled crop catalog through the adaptive questionnaire
    Demo,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Questions(args) => run_questions(args),
        Command::Recommend(args) => run_recommend(args),
        Command::Demo => run_demo(),
    }
}
