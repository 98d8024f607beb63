use std::process;

#[tokio::main]
async fn main() {
    let code = expensync_cli::run().await;
    process::exit(code);
}
