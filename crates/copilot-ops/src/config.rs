use crate::prelude::*;
use copilot_ops_core::config::{search_paths, Config};

/// Load the configuration for this invocation.
///
/// An explicit `--config` file must exist and replaces the search path;
/// otherwise every file from [`search_paths`] that exists is merged. The
/// environment overrides are applied last in both cases.
pub fn load(global: &crate::Global) -> Result<Config> {
    let config = match &global.config {
        Some(path) => Config::load_file(path)?
            .ok_or_else(|| eyre!("Config file '{}' does not exist", path.display()))?,
        None => {
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            let home = dirs_next::home_dir();
            let paths = search_paths(home.as_deref(), &cwd);
            log::debug!("config search path: {:?}", paths);
            Config::load_layered(&paths)?
        }
    };

    let config = config.apply_env(|key| std::env::var(key).ok())?;

    log::debug!(
        "backend: {:?}, filesets: {:?}",
        config.backend,
        config.filesets.iter().map(|f| &f.name).collect::<Vec<_>>()
    );

    Ok(config)
}
