use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = slotquery::cli().get_matches();

    // RUST_LOG wins; -v raises the default from warn to debug
    let default_level = if matches.get_flag("verbose") {
        "slotquery=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    slotquery::run(&matches).await
}
