use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};
use recon_core::Feature;
use recon_engine::{OutputDir, ReqwestScanApi, ScanApi};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::commands::{Command, CommandError, HELP};
use super::config::DashboardConfig;
use super::persistence::load_prefs;
use super::router::Router;

/// Runs the dashboard until `quit`, end of input or Ctrl-C.
///
/// `initial` wins over the module remembered from the previous run.
pub async fn run_app(config: DashboardConfig, initial: Option<Feature>) -> anyhow::Result<()> {
    let output = OutputDir::new(config.output_dir.clone());
    output.ensure()?;
    let api: Arc<dyn ScanApi> = Arc::new(ReqwestScanApi::new(config.api.clone())?);
    engine_info!(
        "Dashboard talking to {}, writing pages to {:?}",
        config.api.base_url,
        output.path()
    );

    let prefs = load_prefs(&output);
    let mut router = Router::new(api, output, config.poll_interval, prefs);

    println!("{HELP}");
    if let Some(feature) = initial.or_else(|| router.prefs().last_feature()) {
        router.open(feature);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match Command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => router.handle(command),
                    Err(CommandError::Empty) => {}
                    Err(err) => println!("{err}"),
                }
            }
            msg = router.next_msg() => router.dispatch(msg),
            result = tokio::signal::ctrl_c() => {
                if let Err(err) = result {
                    engine_warn!("Failed to listen for Ctrl-C: {}", err);
                }
                break;
            }
        }
    }

    router.close();
    engine_info!("Dashboard stopped");
    Ok(())
}
