use std::{
    collections::HashMap,
    env, fs,
    io::{BufRead, BufReader},
    path::PathBuf,
    time::Duration,
};

use directories::BaseDirs;

/// Layered configuration: built-in defaults, overlaid by `.tablechatrc`,
/// overlaid by environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let mut map = default_map();
        let config_path = default_config_path();

        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(Result::ok) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        // Environment takes precedence over the rc file
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if let Ok(v) = env::var(key) {
            return Some(v);
        }
        self.inner.get(key).cloned()
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.parse::<u64>().ok())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64("REQUEST_TIMEOUT").unwrap_or(60))
    }

    pub fn exec_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64("EXEC_TIMEOUT").unwrap_or(30))
    }

    pub fn python_bin(&self) -> String {
        self.get("PYTHON_BIN").unwrap_or_else(|| "python3".into())
    }

    pub fn bind_addr(&self) -> String {
        let host = self.get("HOST").unwrap_or_else(|| "127.0.0.1".into());
        let port = self.get("PORT").unwrap_or_else(|| "8000".into());
        format!("{}:{}", host, port)
    }

    pub fn allowed_origin(&self) -> String {
        self.get("ALLOWED_ORIGIN")
            .unwrap_or_else(|| "http://localhost:3000".into())
    }
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "MODEL_BACKEND",
        "OPENROUTER_API_KEY",
        "REPLICATE_API_TOKEN",
        "DEFAULT_MODEL",
        "REPLICATE_MODEL",
        "API_BASE_URL",
        "REQUEST_TIMEOUT",
        "EXEC_TIMEOUT",
        "PYTHON_BIN",
        "HOST",
        "PORT",
        "ALLOWED_ORIGIN",
    ];

    KEYS.contains(&k) || k.starts_with("TABLECHAT_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("tablechat").join(".tablechatrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();

    m.insert("MODEL_BACKEND".into(), "openrouter".into());
    m.insert("DEFAULT_MODEL".into(), "deepseek/deepseek-r1:free".into());
    m.insert(
        "REPLICATE_MODEL".into(),
        "lucataco/ollama-nemotron-70b:730a266b3a0db453479d5b167132fd6534debde168af62ac328d5d0187d18e0e"
            .into(),
    );
    m.insert("API_BASE_URL".into(), "https://openrouter.ai/api/v1".into());

    m.insert("REQUEST_TIMEOUT".into(), "60".into());
    m.insert("EXEC_TIMEOUT".into(), "30".into());
    m.insert("PYTHON_BIN".into(), "python3".into());

    m.insert("HOST".into(), "127.0.0.1".into());
    m.insert("PORT".into(), "8000".into());
    m.insert("ALLOWED_ORIGIN".into(), "http://localhost:3000".into());

    m
}
