use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match lead_sync_lib::run().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("lead-sync: {error:#}");
            ExitCode::FAILURE
        }
    }
}
