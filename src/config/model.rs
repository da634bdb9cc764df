// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// jobs = 4
/// timeout_secs = 300
///
/// [tools]
/// model_checker = "tlc"
/// proof_checker = "coqc"
///
/// [task.types]
/// kind = "proof"
/// module = "Types.v"
///
/// [task.safety]
/// kind = "model_check"
/// spec = "Safety.tla"
/// after = ["types"]
/// ```
///
/// All sections except `[task.<name>]` are optional and have defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global session settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Tool executables from `[tools]`.
    #[serde(default)]
    pub tools: ToolsSection,

    /// All tasks from `[task.<name>]`.
    ///
    /// A `BTreeMap` keeps iteration (and thus declaration handling)
    /// deterministic across runs.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// A configuration that passed semantic validation (see `config::validate`).
///
/// Construction goes through `TryFrom<RawConfigFile>`, so holders of a
/// `ConfigFile` can rely on: at least one task, all `after` references
/// resolving, and an acyclic dependency relation.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub tools: ToolsSection,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    /// Wrap raw sections without re-validating. Only `config::validate`
    /// should call this.
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        tools: ToolsSection,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self {
            config,
            tools,
            task,
        }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Maximum number of tasks running at once.
    ///
    /// If `None`, the available parallelism of the machine is used.
    #[serde(default)]
    pub jobs: Option<usize>,

    /// Default per-task timeout in seconds. 0 disables the timeout.
    #[serde(default)]
    pub timeout_secs: u64,

    /// Directory for per-task log files written by the process verifier.
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Where the JSON session summary is written.
    #[serde(default = "default_summary_path")]
    pub summary_path: String,
}

fn default_log_dir() -> String {
    ".verirun/logs".to_string()
}

fn default_summary_path() -> String {
    ".verirun/summary.json".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            jobs: None,
            timeout_secs: 0,
            log_dir: default_log_dir(),
            summary_path: default_summary_path(),
        }
    }
}

/// `[tools]` section: executables for each check kind.
///
/// Installing these tools is the caller's problem; verirun only invokes them.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsSection {
    /// Model checker executable (receives the spec file and optional config).
    #[serde(default = "default_model_checker")]
    pub model_checker: String,

    /// Proof checker executable (receives the module file).
    #[serde(default = "default_proof_checker")]
    pub proof_checker: String,
}

fn default_model_checker() -> String {
    "tlc".to_string()
}

fn default_proof_checker() -> String {
    "coqc".to_string()
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            model_checker: default_model_checker(),
            proof_checker: default_proof_checker(),
        }
    }
}

/// What a task actually runs, keyed by an explicit `kind` tag.
///
/// Each variant carries exactly the invocation parameters that kind needs,
/// instead of a free-form command string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckKind {
    /// Run the model checker over a specification file.
    ModelCheck {
        spec: String,
        #[serde(default)]
        config: Option<String>,
    },
    /// Run the proof checker over a proof module.
    Proof { module: String },
    /// Run a compiled test harness binary.
    Harness {
        binary: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// The check this task performs.
    #[serde(flatten)]
    pub check: CheckKind,

    /// Names of tasks that must succeed before this one may run.
    #[serde(default)]
    pub after: Vec<String>,

    /// Per-task timeout override in seconds. 0 disables the timeout for
    /// this task even when a session default is set.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}
