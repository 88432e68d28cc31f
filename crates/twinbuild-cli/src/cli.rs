use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::builder::FalseyValueParser;
use clap::Parser;
use twinbuild_diff::DiffConfig;

#[derive(Parser, Debug)]
#[command(
    name = "twinbuild",
    about = "Check that an incremental build produced the same classes as a clean build",
    version
)]
pub struct Cli {
    /// Original build output: a directory, .zip or .jar
    pub original: PathBuf,

    /// Incremental build output: a directory, .zip or .jar
    pub incremental: PathBuf,

    /// Also byte-compare files that are not class files
    #[arg(long, env = "COMPARE_OTHER", value_parser = FalseyValueParser::new())]
    pub compare_other: bool,

    /// Include method bodies in the comparison
    #[arg(long, env = "COMPARE_METHODS", value_parser = FalseyValueParser::new())]
    pub compare_methods: bool,

    /// Directory for artifacts of differing classes, recreated on every run
    #[arg(long, env = "TWINBUILD_DIAGNOSTICS_DIR", default_value = "diff")]
    pub diagnostics_dir: PathBuf,

    /// Number of comparison workers [default: available parallelism]
    #[arg(short, long, env = "TWINBUILD_JOBS")]
    pub jobs: Option<NonZeroUsize>,

    /// Zip the diagnostics directory next to itself after the run
    #[arg(long, env = "TWINBUILD_ARCHIVE_DIAGNOSTICS", value_parser = FalseyValueParser::new())]
    pub archive_diagnostics: bool,

    #[arg(long, env = "TWINBUILD_FORMAT", default_value = "teamcity")]
    pub format: OutputFormat,

    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// TeamCity service messages
    Teamcity,
    Text,
    Json,
}

impl Cli {
    pub fn diff_config(&self) -> DiffConfig {
        let defaults = DiffConfig::default();
        DiffConfig {
            compare_other_files: self.compare_other,
            compare_method_bodies: self.compare_methods,
            workers: self.jobs.map_or(defaults.workers, NonZeroUsize::get),
            diagnostics_dir: Some(self.diagnostics_dir.clone()),
        }
    }

    /// Where `--archive-diagnostics` writes its zip.
    pub fn diagnostics_archive(&self) -> PathBuf {
        let name = self
            .diagnostics_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "diagnostics".to_string());
        self.diagnostics_dir.with_file_name(format!("{name}.zip"))
    }
}

/// Serializes tests that read or write the process environment.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;

    const BOOLEAN_VARS: [&str; 3] = [
        "COMPARE_OTHER",
        "COMPARE_METHODS",
        "TWINBUILD_ARCHIVE_DIAGNOSTICS",
    ];

    fn parse_with_env(value: &str) -> Result<Cli, clap::Error> {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for var in BOOLEAN_VARS {
            std::env::set_var(var, value);
        }
        let parsed = Cli::try_parse_from(["twinbuild", "a", "b"]);
        for var in BOOLEAN_VARS {
            std::env::remove_var(var);
        }
        parsed
    }

    #[test]
    fn parse_positionals() {
        let cli = Cli::try_parse_from(["twinbuild", "orig.zip", "inc"]).unwrap();
        assert_eq!(cli.original, PathBuf::from("orig.zip"));
        assert_eq!(cli.incremental, PathBuf::from("inc"));
        assert_eq!(cli.format, OutputFormat::Teamcity);
        assert_eq!(cli.diagnostics_dir, PathBuf::from("diff"));
    }

    #[test]
    fn missing_incremental_is_a_usage_error() {
        let err = Cli::try_parse_from(["twinbuild", "orig"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(Cli::try_parse_from(["twinbuild"]).is_err());
    }

    #[test]
    fn parse_flags() {
        let cli = Cli::try_parse_from([
            "twinbuild",
            "a",
            "b",
            "--compare-other",
            "--compare-methods",
            "-j",
            "3",
            "--format",
            "json",
            "--diagnostics-dir",
            "out/diag",
            "--archive-diagnostics",
            "-v",
        ])
        .unwrap();
        assert!(cli.compare_other);
        assert!(cli.compare_methods);
        assert!(cli.archive_diagnostics);
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);

        let config = cli.diff_config();
        assert!(config.compare_other_files);
        assert!(config.compare_method_bodies);
        assert_eq!(config.workers, 3);
        assert_eq!(config.diagnostics_dir, Some(PathBuf::from("out/diag")));
        assert_eq!(cli.diagnostics_archive(), PathBuf::from("out/diag.zip"));
    }

    #[test]
    fn zero_jobs_is_rejected() {
        assert!(Cli::try_parse_from(["twinbuild", "a", "b", "--jobs", "0"]).is_err());
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["twinbuild", "a", "b", "--format", "xml"]).is_err());
    }

    #[test]
    fn boolean_env_vars_treat_only_falsey_words_as_false() {
        for value in ["1", "yes", "on", "TRUE", "true", "anything"] {
            let cli = parse_with_env(value).unwrap_or_else(|e| panic!("{value:?}: {e}"));
            assert!(cli.compare_other, "{value:?}");
            assert!(cli.compare_methods, "{value:?}");
            assert!(cli.archive_diagnostics, "{value:?}");
            assert!(cli.diff_config().compare_method_bodies, "{value:?}");
        }
        for value in ["0", "no", "off", "n", "f", "false", "FALSE", "Off"] {
            let cli = parse_with_env(value).unwrap_or_else(|e| panic!("{value:?}: {e}"));
            assert!(!cli.compare_other, "{value:?}");
            assert!(!cli.compare_methods, "{value:?}");
            assert!(!cli.archive_diagnostics, "{value:?}");
        }
    }
}
