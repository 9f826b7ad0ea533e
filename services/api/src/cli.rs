use crate::join::{run_join, JoinArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use coown_waitlist::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "COOWN Waitlist",
    about = "Serve and exercise the COOWN waitlist signup from the command line",
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
    /// Walk the signup wizard and submit one entry to the configured backend
    Join(JoinArgs),
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
        Command::Join(args) => run_join(args).await,
    }
}
