use std::{net::IpAddr, time::Duration};

use anyhow::{Context, ensure};
use clap::{ArgAction, CommandFactory, FromArgMatches, Parser};
use reqwest::Url;

use crate::services::catalog::CatalogPolicy;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Command line flags. Every flag falls back to an environment variable, then to a default.
#[derive(Debug, Parser)]
#[command(name = "stock-ia-gateway", about = "Extracts product records from documents and voice")]
pub struct CliArgs {
    #[arg(long, env = "APP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "MISTRAL_PORT", default_value_t = 5000)]
    pub port: u16,

    #[arg(long, env = "OLLAMA_URL", default_value = "http://localhost:11434/api/generate")]
    pub ollama_url: String,

    #[arg(long, env = "OLLAMA_MODEL", default_value = "mistral")]
    pub ollama_model: String,

    #[arg(long, env = "OLLAMA_CMD", default_value = "ollama")]
    pub ollama_cmd: String,

    /// Whitespace separated arguments passed to the launch command.
    #[arg(long, env = "OLLAMA_ARGS", default_value = "run mistral", allow_hyphen_values = true)]
    pub ollama_args: String,

    #[arg(long, env = "OLLAMA_AUTOLAUNCH", default_value_t = true, action = ArgAction::Set)]
    pub ollama_autolaunch: bool,

    #[arg(long, env = "OLLAMA_STARTUP_GRACE_SECS", default_value_t = 3)]
    pub startup_grace_secs: u64,

    #[arg(long, env = "OLLAMA_TIMEOUT_SECS", default_value_t = 60)]
    pub engine_timeout_secs: u64,

    #[arg(long, env = "VOICE_CATALOG_POLICY", value_enum, default_value_t = CatalogPolicy::Drop)]
    pub voice_catalog_policy: CatalogPolicy,

    #[arg(long, env = "LENIENT_MODEL_REPLIES", default_value_t = false, action = ArgAction::Set)]
    pub lenient_model_replies: bool,

    #[arg(long, env = "WHISPER_CMD", default_value = "whisper")]
    pub whisper_cmd: String,

    #[arg(long, env = "WHISPER_MODEL", default_value = "base")]
    pub whisper_model: String,

    #[arg(long, env = "WHISPER_LANGUAGE", default_value = "es")]
    pub whisper_language: String,

    /// OpenAI-compatible transcription endpoint; when unset the local CLI is used.
    #[arg(long, env = "WHISPER_URL")]
    pub whisper_url: Option<String>,

    #[arg(long, env = "WHISPER_TIMEOUT_SECS", default_value_t = 300)]
    pub whisper_timeout_secs: u64,

    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub url: Url,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub enabled: bool,
    pub command: String,
    pub args: Vec<String>,
    pub grace: Duration,
}

#[derive(Debug, Clone)]
pub enum SpeechBackend {
    Command { program: String },
    Http { url: Url },
}

#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub backend: SpeechBackend,
    pub model: String,
    pub language: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub engine: EngineConfig,
    pub launcher: LauncherConfig,
    pub speech: SpeechConfig,
    pub catalog_policy: CatalogPolicy,
    pub lenient_replies: bool,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_args(args: CliArgs) -> anyhow::Result<Self> {
        let host = args
            .host
            .parse::<IpAddr>()
            .with_context(|| format!("invalid host address `{}`", args.host))?;
        let engine_url = Url::parse(&args.ollama_url)
            .with_context(|| format!("invalid OLLAMA_URL `{}`", args.ollama_url))?;

        let backend = match args.whisper_url.filter(|url| !url.trim().is_empty()) {
            Some(url) => SpeechBackend::Http {
                url: Url::parse(&url).with_context(|| format!("invalid WHISPER_URL `{url}`"))?,
            },
            None => SpeechBackend::Command {
                program: args.whisper_cmd.trim().to_string(),
            },
        };

        let config = Self {
            host,
            port: args.port,
            engine: EngineConfig {
                url: engine_url,
                model: args.ollama_model.trim().to_string(),
                timeout: Duration::from_secs(args.engine_timeout_secs),
            },
            launcher: LauncherConfig {
                enabled: args.ollama_autolaunch,
                command: args.ollama_cmd.trim().to_string(),
                args: args.ollama_args.split_whitespace().map(str::to_string).collect(),
                grace: Duration::from_secs(args.startup_grace_secs),
            },
            speech: SpeechConfig {
                backend,
                model: args.whisper_model.trim().to_string(),
                language: args.whisper_language.trim().to_string(),
                timeout: Duration::from_secs(args.whisper_timeout_secs),
            },
            catalog_policy: args.voice_catalog_policy,
            lenient_replies: args.lenient_model_replies,
            max_upload_bytes: args.max_upload_bytes,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.engine.model.is_empty(), "OLLAMA_MODEL must not be empty");
        ensure!(
            !self.engine.timeout.is_zero(),
            "OLLAMA_TIMEOUT_SECS must be greater than zero"
        );
        ensure!(
            !self.launcher.enabled || !self.launcher.command.is_empty(),
            "OLLAMA_CMD must not be empty when autolaunch is enabled"
        );
        if let SpeechBackend::Command { program } = &self.speech.backend {
            ensure!(!program.is_empty(), "WHISPER_CMD must not be empty");
        }
        ensure!(!self.speech.language.is_empty(), "WHISPER_LANGUAGE must not be empty");
        ensure!(
            !self.speech.timeout.is_zero(),
            "WHISPER_TIMEOUT_SECS must be greater than zero"
        );
        ensure!(self.max_upload_bytes > 0, "MAX_UPLOAD_BYTES must be greater than zero");
        Ok(())
    }

    /// Config from the environment and defaults, ignoring the process arguments.
    pub fn defaults() -> anyhow::Result<Self> {
        Self::from_args(CliArgs::try_parse_from(["stock-ia-gateway"])?)
    }

    /// Config from the built-in defaults alone; environment variables are not consulted.
    pub fn builtin() -> anyhow::Result<Self> {
        let mut command = CliArgs::command();
        let ids = command
            .get_arguments()
            .map(|arg| arg.get_id().clone())
            .collect::<Vec<_>>();
        for id in ids {
            command = command.mut_arg(id, |arg| arg.env(None::<&'static str>));
        }
        let matches = command.try_get_matches_from(["stock-ia-gateway"])?;
        Self::from_args(CliArgs::from_arg_matches(&matches)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<AppConfig> {
        let mut argv = vec!["stock-ia-gateway"];
        argv.extend_from_slice(args);
        AppConfig::from_args(CliArgs::try_parse_from(argv)?)
    }

    #[test]
    fn port_flag_overrides_default() {
        let config = parse(&["--port", "7070"]).unwrap();
        assert_eq!(config.port, 7070);
    }

    #[test]
    fn launch_arguments_are_split_on_whitespace() {
        let config = parse(&["--ollama-args", "serve  --verbose"]).unwrap();
        assert_eq!(config.launcher.args, vec!["serve", "--verbose"]);
    }

    #[test]
    fn whisper_url_switches_to_http_backend() {
        let config = parse(&["--whisper-url", "http://localhost:9000/v1/audio/transcriptions"])
            .unwrap();
        assert!(matches!(config.speech.backend, SpeechBackend::Http { .. }));
    }

    #[test]
    fn invalid_engine_url_is_rejected() {
        assert!(parse(&["--ollama-url", "not a url"]).is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(parse(&["--engine-timeout-secs", "0"]).is_err());
    }

    #[test]
    fn builtin_config_matches_documented_defaults() {
        let config = AppConfig::builtin().unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.engine.model, "mistral");
        assert_eq!(config.engine.timeout, Duration::from_secs(60));
        assert_eq!(config.catalog_policy, CatalogPolicy::Drop);
        assert!(!config.lenient_replies);
        assert!(matches!(config.speech.backend, SpeechBackend::Command { .. }));
        assert_eq!(config.speech.language, "es");
    }

    #[test]
    fn catalog_policy_is_parsed() {
        let config = parse(&["--voice-catalog-policy", "reject"]).unwrap();
        assert_eq!(config.catalog_policy, CatalogPolicy::Reject);
    }
}
