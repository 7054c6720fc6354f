use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8081".to_string(),
        }
    }
}

/// OpenAI-compatible chat completions endpoint used for hints.
#[derive(Debug, Clone, Deserialize)]
pub struct HintsConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub retry_attempts: usize,
}

impl Default for HintsConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: 120,
            timeout_secs: 20,
            retry_attempts: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    pub enabled: bool,
    pub api_url: String,
    pub voice: String,
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "http://localhost:5002/api/tts".to_string(),
            voice: "Brian".to_string(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    pub block_a_file: String,
    pub block_b_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            block_a_file: "wordle_data.csv".to_string(),
            block_b_file: "word_puzzle_data.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExperimentConfig {
    pub attempt_limit: u32,
    pub word_length: usize,
    /// Newline-separated word list for Block A guesses. No check when unset.
    pub wordlist_path: Option<String>,
    /// JSON puzzle catalog replacing the built-in puzzles.
    pub puzzles_path: Option<String>,
    pub shuffle_tones: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            attempt_limit: 6,
            word_length: 5,
            wordlist_path: None,
            puzzles_path: None,
            shuffle_tones: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub hints: HintsConfig,
    pub speech: SpeechConfig,
    pub storage: StorageConfig,
    pub experiment: ExperimentConfig,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Try root .env first, then fallback to local .env
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let defaults = Config::default();

        let server = ServerConfig {
            bind_addr: settings
                .get_string("server.bind_addr")
                .or_else(|_| env::var("BIND_ADDR"))
                .unwrap_or(defaults.server.bind_addr),
        };

        let hints = HintsConfig {
            api_url: settings
                .get_string("hints.api_url")
                .or_else(|_| env::var("HINT_API_URL"))
                .unwrap_or(defaults.hints.api_url),
            api_key: settings
                .get_string("hints.api_key")
                .or_else(|_| env::var("HINT_API_KEY"))
                .or_else(|_| env::var("OPENAI_API_KEY"))
                .ok(),
            model: settings
                .get_string("hints.model")
                .or_else(|_| env::var("HINT_MODEL"))
                .unwrap_or(defaults.hints.model),
            temperature: settings
                .get_float("hints.temperature")
                .map(|t| t as f32)
                .unwrap_or(defaults.hints.temperature),
            max_tokens: settings
                .get_int("hints.max_tokens")
                .map(|n| n.max(1) as u32)
                .unwrap_or(defaults.hints.max_tokens),
            timeout_secs: settings
                .get_int("hints.timeout_secs")
                .map(|n| n.max(1) as u64)
                .unwrap_or(defaults.hints.timeout_secs),
            retry_attempts: settings
                .get_int("hints.retry_attempts")
                .map(|n| n.max(1) as usize)
                .unwrap_or(defaults.hints.retry_attempts),
        };

        if hints.api_key.is_none() {
            tracing::warn!("No hint API key configured; hints will show placeholder text");
        }

        let speech = SpeechConfig {
            enabled: settings
                .get_bool("speech.enabled")
                .unwrap_or(defaults.speech.enabled),
            api_url: settings
                .get_string("speech.api_url")
                .or_else(|_| env::var("SPEECH_API_URL"))
                .unwrap_or(defaults.speech.api_url),
            voice: settings
                .get_string("speech.voice")
                .unwrap_or(defaults.speech.voice),
            timeout_secs: settings
                .get_int("speech.timeout_secs")
                .map(|n| n.max(1) as u64)
                .unwrap_or(defaults.speech.timeout_secs),
        };

        let storage = StorageConfig {
            data_dir: settings
                .get_string("storage.data_dir")
                .or_else(|_| env::var("DATA_DIR"))
                .unwrap_or(defaults.storage.data_dir),
            block_a_file: settings
                .get_string("storage.block_a_file")
                .unwrap_or(defaults.storage.block_a_file),
            block_b_file: settings
                .get_string("storage.block_b_file")
                .unwrap_or(defaults.storage.block_b_file),
        };

        let experiment = ExperimentConfig {
            attempt_limit: settings
                .get_int("experiment.attempt_limit")
                .map(|n| n.max(1) as u32)
                .unwrap_or(defaults.experiment.attempt_limit),
            word_length: settings
                .get_int("experiment.word_length")
                .map(|n| n.max(1) as usize)
                .unwrap_or(defaults.experiment.word_length),
            wordlist_path: settings
                .get_string("experiment.wordlist_path")
                .or_else(|_| env::var("WORDLIST_PATH"))
                .ok(),
            puzzles_path: settings
                .get_string("experiment.puzzles_path")
                .or_else(|_| env::var("PUZZLES_PATH"))
                .ok(),
            shuffle_tones: settings
                .get_bool("experiment.shuffle_tones")
                .unwrap_or(defaults.experiment.shuffle_tones),
        };

        Ok(Config {
            server,
            hints,
            speech,
            storage,
            experiment,
        })
    }
}
