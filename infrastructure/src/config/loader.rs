//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};
use tracing::debug;

const PROJECT_FILES: [&str; 2] = ["shellpilot.toml", ".shellpilot.toml"];
const ENV_PREFIX: &str = "SHELLPILOT_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `SHELLPILOT_*` environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./shellpilot.toml` or `./.shellpilot.toml`
    /// 4. Global: `<config dir>/shellpilot/config.toml`
    /// 5. Default values
    ///
    /// `AUTO_EXEC=true` additionally turns on `agent.auto_execute`.
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        if let Some(path) = config_path
            && !path.exists()
        {
            return Err(Box::new(figment::Error::from(format!(
                "config file not found: {}",
                path.display()
            ))));
        }
        let figment = Self::layered(
            Self::global_config_path().as_deref(),
            Path::new("."),
            config_path,
        );
        Self::finish(figment)
    }

    /// Defaults plus environment only (for --no-config)
    pub fn load_defaults() -> Result<FileConfig, Box<figment::Error>> {
        Self::finish(Figment::new().merge(Serialized::defaults(FileConfig::default())))
    }

    fn finish(figment: Figment) -> Result<FileConfig, Box<figment::Error>> {
        let mut config: FileConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;
        apply_auto_exec(&mut config, std::env::var("AUTO_EXEC").ok().as_deref());
        Ok(config)
    }

    /// File layers without the environment.
    fn layered(global: Option<&Path>, project_dir: &Path, explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = global
            && global_path.exists()
        {
            debug!("Loading global config {}", global_path.display());
            figment = figment.merge(Toml::file(global_path));
        }

        if let Some(path) = Self::project_config_path_in(project_dir) {
            debug!("Loading project config {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = explicit {
            debug!("Loading config {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        figment
    }

    /// Get the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("shellpilot").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        Self::project_config_path_in(Path::new("."))
    }

    fn project_config_path_in(dir: &Path) -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }
}

/// `AUTO_EXEC=true` forces auto-execution on; anything else leaves the
/// configured value alone.
fn apply_auto_exec(config: &mut FileConfig, value: Option<&str>) {
    if value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true")) {
        config.agent.auto_execute = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn extract(figment: Figment) -> FileConfig {
        figment.extract().unwrap()
    }

    #[test]
    fn test_defaults_without_files() {
        let dir = tempdir().unwrap();
        let config = extract(ConfigLoader::layered(None, dir.path(), None));
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path().unwrap();
        assert!(path.ends_with("shellpilot/config.toml"));
    }

    #[test]
    fn test_priority_order() {
        let dir = tempdir().unwrap();
        let global = dir.path().join("global.toml");
        fs::write(
            &global,
            "[model]\nname = \"global-model\"\n[agent]\nmax_iterations = 3\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("shellpilot.toml"),
            "[model]\nname = \"project-model\"\n",
        )
        .unwrap();
        let explicit = dir.path().join("explicit.toml");
        fs::write(&explicit, "[agent]\nrepeat_threshold = 7\n").unwrap();

        let config = extract(ConfigLoader::layered(
            Some(&global),
            dir.path(),
            Some(&explicit),
        ));

        assert_eq!(config.model.name, "project-model");
        assert_eq!(config.agent.max_iterations, 3);
        assert_eq!(config.agent.repeat_threshold, 7);
        assert_eq!(config.model.base_url, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn test_hidden_project_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".shellpilot.toml"), "[session]\npersist = false\n").unwrap();

        let config = extract(ConfigLoader::layered(None, dir.path(), None));
        assert!(!config.session.persist);
    }

    #[test]
    fn test_lsp_servers_merge_over_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("shellpilot.toml"),
            "[lsp.servers]\npython = \"pyright-langserver --stdio\"\nzig = \"zls\"\n",
        )
        .unwrap();

        let config = extract(ConfigLoader::layered(None, dir.path(), None));
        assert_eq!(config.lsp.servers["python"], "pyright-langserver --stdio");
        assert_eq!(config.lsp.servers["zig"], "zls");
        assert_eq!(config.lsp.servers["rust"], "rust-analyzer");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = ConfigLoader::load(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn test_auto_exec_env() {
        let mut config = FileConfig::default();
        apply_auto_exec(&mut config, Some("false"));
        assert!(!config.agent.auto_execute);
        apply_auto_exec(&mut config, None);
        assert!(!config.agent.auto_execute);
        apply_auto_exec(&mut config, Some("TRUE"));
        assert!(config.agent.auto_execute);
    }
}
