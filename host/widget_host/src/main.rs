mod demo;

use std::process;
use tracing_subscriber::EnvFilter;
use widget_sync_runtime::HostConfig;

fn main() {
    init_tracing();

    let config = HostConfig::from_env();
    tracing::info!(sid = %config.sid, cap = config.outbound_queue_cap, "widget host starting");

    if let Err(err) = widget_sync_runtime::run(demo::DemoApp::default(), config) {
        tracing::error!(%err, "widget host fatal error");
        process::exit(1);
    }
}

// stdout carries frames, so logs go to stderr.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("WIDGET_HOST_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
