use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = routesync::cli::Cli::parse();
    if let Err(e) = routesync::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
