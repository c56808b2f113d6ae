use std::{collections::HashMap, fs};

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_url: String,
    pub stats_refresh_seconds: u64,
    pub auto_refresh: bool,
    pub key_length: u32,
    pub include_symbols: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            stats_refresh_seconds: 10,
            auto_refresh: true,
            key_length: 16,
            include_symbols: true,
        }
    }
}

/// Defaults, overridden by `client.toml`, overridden by `APP__*` variables.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("client.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            apply_overrides(&mut settings, &file_cfg);
        }
    }

    let mut env_cfg = HashMap::new();
    for (key, variable) in [
        ("server_url", "APP__SERVER_URL"),
        ("stats_refresh_seconds", "APP__STATS_REFRESH_SECONDS"),
        ("auto_refresh", "APP__AUTO_REFRESH"),
        ("key_length", "APP__KEY_LENGTH"),
        ("include_symbols", "APP__INCLUDE_SYMBOLS"),
    ] {
        if let Ok(value) = std::env::var(variable) {
            env_cfg.insert(key.to_string(), value);
        }
    }
    apply_overrides(&mut settings, &env_cfg);

    settings
}

fn apply_overrides(settings: &mut Settings, values: &HashMap<String, String>) {
    if let Some(v) = values.get("server_url") {
        settings.server_url = v.clone();
    }
    if let Some(v) = values
        .get("stats_refresh_seconds")
        .and_then(|v| v.parse::<u64>().ok())
    {
        settings.stats_refresh_seconds = v;
    }
    if let Some(v) = values.get("auto_refresh").and_then(|v| v.parse::<bool>().ok()) {
        settings.auto_refresh = v;
    }
    if let Some(v) = values.get("key_length").and_then(|v| v.parse::<u32>().ok()) {
        settings.key_length = v;
    }
    if let Some(v) = values
        .get("include_symbols")
        .and_then(|v| v.parse::<bool>().ok())
    {
        settings.include_symbols = v;
    }
}
