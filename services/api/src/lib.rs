mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use buyer_journey::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
