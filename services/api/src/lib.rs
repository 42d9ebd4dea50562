mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use doc_scoring::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
