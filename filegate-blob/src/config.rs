/// Configuration for the file gateway
#[derive(Debug, Clone)]
pub struct FilegateConfig {
    /// Range streaming parameters
    pub range: RangeConfig,

    /// Largest accepted upload body, in bytes
    pub max_upload_bytes: usize,

    /// If false, stored names get a random hex prefix: `<hex>_<filename>`
    pub preserve_file_name: bool,

    /// Public base URL used to build file locations (no trailing slash)
    pub public_url: String,

    /// Application id used when a request carries none
    pub default_app_id: String,

    /// Key required for privileged operations (delete). With none set, deletes
    /// are always refused.
    pub master_key: Option<String>,
}

impl Default for FilegateConfig {
    fn default() -> Self {
        Self {
            range: RangeConfig::default(),
            max_upload_bytes: 20 * 1024 * 1024, // 20MB
            preserve_file_name: true,
            public_url: "http://localhost:1337/parse".to_string(),
            default_app_id: "default".to_string(),
            master_key: None,
        }
    }
}

/// Parameters of the partial-content streaming engine
#[derive(Debug, Clone)]
pub struct RangeConfig {
    /// Window served for open-ended ranges (`bytes=N-`)
    pub buffer_size: u64,

    /// Size of each read from the backend handle
    pub read_chunk_size: usize,

    /// Apply the `0-2` probe workaround (see `range::apply_probe_quirk`)
    pub probe_quirk: bool,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1024 * 1024, // 1MB
            read_chunk_size: 64 * 1024,
            probe_quirk: true,
        }
    }
}

impl FilegateConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set range streaming parameters
    pub fn with_range(mut self, range: RangeConfig) -> Self {
        self.range = range;
        self
    }

    /// Set max upload size
    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Prefix stored names with a random hex string
    pub fn unique_file_names(mut self) -> Self {
        self.preserve_file_name = false;
        self
    }

    /// Set the public base URL
    pub fn with_public_url<S: Into<String>>(mut self, url: S) -> Self {
        self.public_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the fallback application id
    pub fn with_default_app_id<S: Into<String>>(mut self, app_id: S) -> Self {
        self.default_app_id = app_id.into();
        self
    }

    /// Require this key for deletes
    pub fn with_master_key<S: Into<String>>(mut self, key: S) -> Self {
        self.master_key = Some(key.into());
        self
    }
}

impl RangeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the open-ended window size
    pub fn with_buffer_size(mut self, bytes: u64) -> Self {
        self.buffer_size = bytes;
        self
    }

    /// Set the backend read size
    pub fn with_read_chunk_size(mut self, bytes: usize) -> Self {
        self.read_chunk_size = bytes.max(1);
        self
    }

    /// Disable the `0-2` probe workaround
    pub fn without_probe_quirk(mut self) -> Self {
        self.probe_quirk = false;
        self
    }
}
