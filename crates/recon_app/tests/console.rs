use chrono::Utc;
use recon_app::platform::console_line;
use recon_core::{update, Feature, Job, JobStatus, ModuleState, Msg};

#[test]
fn summarises_live_module_with_primary_job() {
    let jobs = vec![Job {
        id: 1,
        status: JobStatus::Running,
        progress_percentage: Some(42),
        ..Job::default()
    }];
    let (state, _) = update(
        ModuleState::new(Feature::PortScanning),
        Msg::JobsFetched {
            jobs,
            at: Utc::now(),
        },
    );

    let line = console_line(&state.view(Utc::now()));
    assert!(line.starts_with("[Port Scanning] LIVE | 1 scan running"));
    assert!(line.contains("42%"));
}

#[test]
fn paused_module_says_so() {
    let (state, _) = update(ModuleState::new(Feature::Osint), Msg::ToggleAutoRefresh);
    let line = console_line(&state.view(Utc::now()));
    assert!(line.contains("PAUSED"));
}
