use crate::sdk::LoopbackOptions;
use crate::storage::{JsonFileStore, ParamStore};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Terminal console for exercising an instant-messaging SDK one call at a time.
#[derive(Debug, Clone, Parser)]
#[command(name = "sdk-console", version, about)]
pub struct ConsoleConfig {
    /// File holding the last successful parameters of every call
    #[arg(long, env = "SDK_CONSOLE_PARAMS", value_name = "FILE")]
    pub params: Option<PathBuf>,

    /// Keep parameters in memory only
    #[arg(long, conflicts_with = "params")]
    pub in_memory: bool,

    /// Also write diagnostics to this file
    #[arg(long, env = "SDK_CONSOLE_LOG", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Tracing filter, e.g. `debug` or `info,sdk_console::calls=trace`
    #[arg(long, env = "SDK_CONSOLE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// App key for the SDK instance created at startup
    #[arg(long, env = "SDK_CONSOLE_APP_KEY", default_value = "demo-app-key")]
    pub app_key: String,

    /// Delay added by the loopback SDK to every call
    #[arg(long, value_name = "MS", default_value_t = 150)]
    pub latency_ms: u64,

    /// Start without an SDK instance; create one from the Instance page
    #[arg(long)]
    pub no_auto_create: bool,

    /// Console preferences file
    #[arg(long, env = "SDK_CONSOLE_PREFS", value_name = "FILE")]
    pub prefs: Option<PathBuf>,
}

impl ConsoleConfig {
    pub fn loopback_options(&self) -> LoopbackOptions {
        LoopbackOptions {
            app_key: self.app_key.clone(),
            latency: Duration::from_millis(self.latency_ms),
        }
    }

    pub fn params_path(&self) -> PathBuf {
        self.params
            .clone()
            .unwrap_or_else(|| home_path(".sdk_console_params.json"))
    }

    pub fn prefs_path(&self) -> PathBuf {
        self.prefs
            .clone()
            .unwrap_or_else(|| home_path(".sdk_console_prefs.json"))
    }

    pub fn param_store(&self) -> ParamStore {
        if self.in_memory {
            ParamStore::in_memory()
        } else {
            ParamStore::new(Arc::new(JsonFileStore::open(self.params_path())))
        }
    }
}

pub fn home_path(file_name: &str) -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConsoleConfig::try_parse_from(["sdk-console"]).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.loopback_options().latency, Duration::from_millis(150));
        assert!(!config.in_memory);
        assert!(config.params_path().ends_with(".sdk_console_params.json"));
    }

    #[test]
    fn explicit_flags() {
        let config = ConsoleConfig::try_parse_from([
            "sdk-console",
            "--params",
            "/tmp/p.json",
            "--latency-ms",
            "0",
            "--app-key",
            "k1",
            "--no-auto-create",
        ])
        .unwrap();
        assert_eq!(config.params_path(), PathBuf::from("/tmp/p.json"));
        assert_eq!(config.loopback_options().app_key, "k1");
        assert!(config.loopback_options().latency.is_zero());
        assert!(config.no_auto_create);
    }

    #[test]
    fn in_memory_conflicts_with_a_params_file() {
        assert!(ConsoleConfig::try_parse_from(["sdk-console", "--in-memory", "--params", "x"]).is_err());
    }
}
