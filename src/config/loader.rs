// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (dependency resolution, acyclicity). Use [`load_and_validate`]
/// for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - unknown or self-referential `after` references,
///   - dependency cycles,
///   - basic global config sanity.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::CheckKind;
    use crate::errors::VerirunError;

    const FULL_CONFIG: &str = r#"
[config]
jobs = 2
timeout_secs = 120

[tools]
model_checker = "tlc2"
proof_checker = "coqc"

[task.types]
kind = "proof"
module = "Types.v"

[task.safety]
kind = "model_check"
spec = "Safety.tla"
config = "Safety.cfg"
after = ["types"]
timeout_secs = 600

[task.stress]
kind = "harness"
binary = "./target/release/stress"
args = ["--iterations", "500"]
after = ["safety"]
"#;

    #[test]
    fn parses_every_check_kind_from_toml() {
        let raw: RawConfigFile = toml::from_str(FULL_CONFIG).unwrap();

        assert_eq!(raw.config.jobs, Some(2));
        assert_eq!(raw.config.timeout_secs, 120);
        assert_eq!(raw.tools.model_checker, "tlc2");
        assert_eq!(raw.tools.proof_checker, "coqc");

        let types = &raw.task["types"];
        assert_eq!(
            types.check,
            CheckKind::Proof {
                module: "Types.v".to_string()
            }
        );
        assert!(types.after.is_empty());
        assert_eq!(types.timeout_secs, None);

        let safety = &raw.task["safety"];
        assert_eq!(
            safety.check,
            CheckKind::ModelCheck {
                spec: "Safety.tla".to_string(),
                config: Some("Safety.cfg".to_string()),
            }
        );
        assert_eq!(safety.after, vec!["types"]);
        assert_eq!(safety.timeout_secs, Some(600));

        let stress = &raw.task["stress"];
        assert_eq!(
            stress.check,
            CheckKind::Harness {
                binary: "./target/release/stress".to_string(),
                args: vec!["--iterations".to_string(), "500".to_string()],
            }
        );
        assert_eq!(stress.after, vec!["safety"]);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let raw: RawConfigFile =
            toml::from_str("[task.a]\nkind = \"proof\"\nmodule = \"A.v\"\n").unwrap();

        assert_eq!(raw.config.jobs, None);
        assert_eq!(raw.config.timeout_secs, 0);
        assert_eq!(raw.config.log_dir, ".verirun/logs");
        assert_eq!(raw.config.summary_path, ".verirun/summary.json");
        assert_eq!(raw.tools.model_checker, "tlc");
        assert_eq!(raw.tools.proof_checker, "coqc");
    }

    #[test]
    fn task_without_a_kind_tag_is_rejected() {
        assert!(toml::from_str::<RawConfigFile>("[task.a]\nmodule = \"A.v\"\n").is_err());
    }

    #[test]
    fn task_with_unknown_kind_is_rejected() {
        assert!(
            toml::from_str::<RawConfigFile>("[task.a]\nkind = \"fuzz\"\ntarget = \"a\"\n")
                .is_err()
        );
    }

    #[test]
    fn load_and_validate_reads_a_file_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Verirun.toml");
        std::fs::write(&path, FULL_CONFIG).unwrap();

        let cfg = load_and_validate(&path).unwrap();
        assert_eq!(cfg.task.len(), 3);
        assert_eq!(cfg.config.jobs, Some(2));
        assert_eq!(cfg.task["safety"].after, vec!["types"]);
    }

    #[test]
    fn load_and_validate_rejects_unknown_after_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Verirun.toml");
        std::fs::write(
            &path,
            "[task.a]\nkind = \"proof\"\nmodule = \"A.v\"\nafter = [\"ghost\"]\n",
        )
        .unwrap();

        let err = load_and_validate(&path).unwrap_err();
        assert!(matches!(err, VerirunError::UnknownDependency { .. }));
    }
}
