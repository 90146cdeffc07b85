use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = mirrorswitch::cli::Cli::parse();
    if let Err(e) = mirrorswitch::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
