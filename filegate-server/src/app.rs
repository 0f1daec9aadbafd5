use std::path::PathBuf;

use filegate_blob::{FilegateConfig, RangeConfig};

struct ServerDefaults;

impl ServerDefaults {
    const HTTP_HOST: &'static str = "127.0.0.1";
    const HTTP_PORT: u16 = 1337;
    const MAX_UPLOAD_MB: usize = 20;
    const BUFFER_SIZE: u64 = 1024 * 1024;
    const PRESERVE_FILE_NAME: bool = true;
}

/// Everything the server reads from its environment
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Files go to disk under this directory; in memory when unset
    pub storage_dir: Option<PathBuf>,
    pub files: FilegateConfig,
}

impl ServerSettings {
    /// Read `FILEGATE_*` environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = FilegateConfig::default();

        let max_upload_mb = env_var_or(&lookup, "FILEGATE_MAX_UPLOAD_MB", ServerDefaults::MAX_UPLOAD_MB);
        let buffer_size = env_var_or(&lookup, "FILEGATE_BUFFER_SIZE", ServerDefaults::BUFFER_SIZE);

        let mut files = FilegateConfig::new()
            .with_range(RangeConfig::new().with_buffer_size(buffer_size))
            .with_max_upload_bytes(max_upload_mb.saturating_mul(1024 * 1024))
            .with_public_url(env_var_or(&lookup, "FILEGATE_PUBLIC_URL", defaults.public_url))
            .with_default_app_id(env_var_or(&lookup, "FILEGATE_APP_ID", defaults.default_app_id));

        if !env_var_or(&lookup, "FILEGATE_PRESERVE_FILE_NAME", ServerDefaults::PRESERVE_FILE_NAME) {
            files = files.unique_file_names();
        }
        if let Some(key) = lookup("FILEGATE_MASTER_KEY").filter(|k| !k.is_empty()) {
            files = files.with_master_key(key);
        }

        Self {
            host: env_var_or(&lookup, "FILEGATE_HTTP_HOST", ServerDefaults::HTTP_HOST.to_string()),
            port: env_var_or(&lookup, "FILEGATE_HTTP_PORT", ServerDefaults::HTTP_PORT),
            storage_dir: lookup("FILEGATE_STORAGE_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            files,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_var_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
