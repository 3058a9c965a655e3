use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Installs the global fmt subscriber. Filter precedence: `RUST_LOG`, then
/// `configured`, then `info`. Later calls leave the first subscriber in place.
pub fn init(configured: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        configured
            .and_then(|directives| {
                EnvFilter::try_new(directives)
                    .map_err(|err| eprintln!("themeforge: ignoring log filter {directives:?}: {err}"))
                    .ok()
            })
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
    });

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!("logging initialized");
    }
}
