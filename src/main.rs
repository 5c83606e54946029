use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = wayfarer::cli::Cli::parse();
    if let Err(e) = wayfarer::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
