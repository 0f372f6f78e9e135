use clap::Parser;
use log::LevelFilter;
use redpanda_chat::cli::args::Args;
use redpanda_chat::cli::run::run;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if args.debug {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    if let Err(e) = run(args).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
