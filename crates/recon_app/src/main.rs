use anyhow::Context;
use recon_app::platform::config::DashboardConfig;
use recon_app::platform::run_app;
use recon_core::Feature;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = DashboardConfig::from_env()?;

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;
    engine_logging::initialize(config.log_destination, config.log_level, &config.log_file());

    let initial = match std::env::args().nth(1) {
        Some(raw) => Some(
            Feature::parse(&raw).with_context(|| format!("unknown feature `{raw}`"))?,
        ),
        None => None,
    };

    run_app(config, initial).await
}
