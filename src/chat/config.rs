//! Configuration types for the chat application.
//!
//! Settings come from three layers: built-in defaults, an optional YAML
//! file named by `--config`, and command-line flags.  Later layers win.

use std::path::{Path, PathBuf};

use arrrg_derive::CommandLine;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::Model;

/// System instruction used when none is configured.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are Gemini. Respond clearly and concisely.";

/// Directory under `$HOME` that holds persisted sessions.
const DEFAULT_DATA_DIR: &str = ".gemchat";

/// Command-line arguments for the gemchat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: gemini-3-flash-preview)", "MODEL")]
    pub model: Option<String>,

    /// System instruction for every request.
    #[arrrg(optional, "System instruction (empty string disables it)", "PROMPT")]
    pub system: Option<String>,

    /// API key; falls back to GEMINI_API_KEY, then API_KEY.
    #[arrrg(optional, "Gemini API key", "KEY")]
    pub api_key: Option<String>,

    /// Where sessions are stored.
    #[arrrg(optional, "Directory for saved sessions (default: ~/.gemchat)", "DIR")]
    pub data_dir: Option<String>,

    /// YAML configuration file.
    #[arrrg(optional, "YAML configuration file", "FILE")]
    pub config: Option<String>,

    /// Disable web-search grounding.
    #[arrrg(flag, "Disable web-search grounding")]
    pub no_search: bool,

    /// Skip the credential prompt.
    #[arrrg(flag, "Do not prompt for an API key at startup")]
    pub no_gating: bool,

    /// Keep a single conversation.
    #[arrrg(flag, "Keep only one conversation")]
    pub single_session: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Verbose logging.
    #[arrrg(flag, "Enable debug logging")]
    pub debug: bool,
}

/// Optional capabilities of the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChatFeatures {
    /// Attach the web-search tool and collect citations.
    pub search: bool,
    /// Require a credential before chatting, and again when it is rejected.
    pub credential_gating: bool,
    /// Keep many conversations; otherwise only the newest survives.
    pub multi_session: bool,
}

impl Default for ChatFeatures {
    fn default() -> Self {
        Self {
            search: true,
            credential_gating: true,
            multi_session: true,
        }
    }
}

/// Shape of the YAML configuration file.  Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    model: Option<String>,
    system: Option<String>,
    api_key: Option<String>,
    data_dir: Option<PathBuf>,
    color: Option<bool>,
    features: Option<ChatFeatures>,
}

/// Resolved configuration for a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// The model selected at startup.
    pub model: Model,

    /// System instruction sent with every request.
    pub system_instruction: Option<String>,

    /// Explicit API key, if one was configured.
    pub api_key: Option<String>,

    /// Directory holding persisted sessions.
    pub data_dir: PathBuf,

    /// Enabled capabilities.
    pub features: ChatFeatures,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether debug logging was requested.
    pub debug: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: gemini-3-flash-preview
    /// - System instruction: [`DEFAULT_SYSTEM_INSTRUCTION`]
    /// - Data directory: `~/.gemchat`
    /// - All features enabled, color enabled
    pub fn new() -> Self {
        Self {
            model: Model::default(),
            system_instruction: Some(DEFAULT_SYSTEM_INSTRUCTION.to_string()),
            api_key: None,
            data_dir: default_data_dir(),
            features: ChatFeatures::default(),
            use_color: true,
            debug: false,
        }
    }

    /// Resolves defaults, then the file named by `--config`, then flags.
    pub fn resolve(args: ChatArgs) -> Result<Self> {
        let base = match &args.config {
            Some(path) => Self::new().with_file(path)?,
            None => Self::new(),
        };
        Ok(base.with_args(args))
    }

    /// Applies the YAML file at `path` on top of this configuration.
    pub fn with_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|err| Error::io(format!("failed to read {}", path.display()), err))?;
        self.with_yaml(&raw)
    }

    /// Applies a YAML document on top of this configuration.
    pub fn with_yaml(mut self, yaml: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(yaml)?;
        if let Some(model) = file.model {
            self.model = parse_model(model);
        }
        if let Some(system) = file.system {
            self.system_instruction = non_empty(system);
        }
        if let Some(key) = file.api_key {
            self.api_key = non_empty(key);
        }
        if let Some(dir) = file.data_dir {
            self.data_dir = dir;
        }
        if let Some(color) = file.color {
            self.use_color = color;
        }
        if let Some(features) = file.features {
            self.features = features;
        }
        Ok(self)
    }

    /// Applies command-line flags on top of this configuration.
    pub fn with_args(mut self, args: ChatArgs) -> Self {
        if let Some(model) = args.model {
            self.model = parse_model(model);
        }
        if let Some(system) = args.system {
            self.system_instruction = non_empty(system);
        }
        if let Some(key) = args.api_key {
            self.api_key = non_empty(key);
        }
        if let Some(dir) = args.data_dir {
            self.data_dir = PathBuf::from(dir);
        }
        if args.no_search {
            self.features.search = false;
        }
        if args.no_gating {
            self.features.credential_gating = false;
        }
        if args.single_session {
            self.features.multi_session = false;
        }
        if args.no_color {
            self.use_color = false;
        }
        self.debug |= args.debug;
        self
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the system instruction.
    pub fn with_system_instruction(mut self, instruction: Option<String>) -> Self {
        self.system_instruction = instruction;
        self
    }

    /// Sets the data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Sets the enabled features.
    pub fn with_features(mut self, features: ChatFeatures) -> Self {
        self.features = features;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        ChatConfig::new().with_args(args)
    }
}

fn parse_model(name: String) -> Model {
    name.parse::<Model>().unwrap_or(Model::Custom(name))
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn default_data_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(DEFAULT_DATA_DIR),
        None => PathBuf::from(DEFAULT_DATA_DIR),
    }
}
