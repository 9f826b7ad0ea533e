mod cli;
mod infra;
mod join;
mod routes;
mod server;

use coown_waitlist::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
