//! Resolving command-line flags into connection settings.
//!
//! Every flag may also come from the environment (or a `.env` file); by the
//! time [`Settings::from_cli`] runs, clap has already merged both.

use crate::Cli;
use camino::Utf8PathBuf;
use dbcompare::ConnectParams;

/// Everything a run needs.
#[derive(Debug)]
pub struct Settings {
    pub source: ConnectParams,
    pub target: ConnectParams,
    /// Directory to write scripts to, or `None` to only report.
    pub scripts: Option<ScriptDir>,
}

/// Where scripts go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptDir {
    CurrentDir,
    Path(Utf8PathBuf),
}

impl Settings {
    /// Validate the parsed flags.
    ///
    /// All eight connection values are required and must not be blank.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let required = [
            ("-sh", &cli.source_host),
            ("-su", &cli.source_user),
            ("-sp", &cli.source_password),
            ("-sd", &cli.source_database),
            ("-th", &cli.target_host),
            ("-tu", &cli.target_user),
            ("-tp", &cli.target_password),
            ("-td", &cli.target_database),
        ];

        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
            .map(|(flag, _)| *flag)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        // Presence was checked above.
        let value = |v: &Option<String>| v.clone().unwrap_or_default();

        let source = ConnectParams::new(
            &value(&cli.source_host),
            value(&cli.source_user),
            value(&cli.source_password),
            value(&cli.source_database),
        )
        .map_err(|source| ConfigError::InvalidHost { flag: "-sh", source })?
        .trust_cert(cli.trust_cert);

        let target = ConnectParams::new(
            &value(&cli.target_host),
            value(&cli.target_user),
            value(&cli.target_password),
            value(&cli.target_database),
        )
        .map_err(|source| ConfigError::InvalidHost { flag: "-th", source })?
        .trust_cert(cli.trust_cert);

        let scripts = cli.create_files.then(|| match &cli.out_dir {
            Some(dir) => ScriptDir::Path(dir.clone()),
            None => ScriptDir::CurrentDir,
        });

        Ok(Settings {
            source,
            target,
            scripts,
        })
    }
}

/// Errors that can occur when resolving settings.
#[derive(Debug)]
pub enum ConfigError {
    /// Required flags that were absent or blank, in help-screen order
    Missing(Vec<&'static str>),
    /// A host flag that is not `host`, `host,port` or `host:port`
    InvalidHost {
        flag: &'static str,
        source: dbcompare::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(flags) => {
                write!(f, "Missing required arguments: {}", flags.join(" "))
            }
            ConfigError::InvalidHost { flag, source } => {
                write!(f, "Invalid value for {}: {}", flag, source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Missing(_) => None,
            ConfigError::InvalidHost { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_cli() -> Cli {
        Cli {
            source_host: Some("db01".into()),
            source_user: Some("sa".into()),
            source_password: Some("secret".into()),
            source_database: Some("Shop".into()),
            target_host: Some("db02,1444".into()),
            target_user: Some("sa".into()),
            target_password: Some("secret".into()),
            target_database: Some("Shop".into()),
            create_files: false,
            out_dir: None,
            trust_cert: false,
        }
    }

    #[test]
    fn test_complete_settings() {
        let settings = Settings::from_cli(&full_cli()).unwrap();
        assert_eq!(settings.source.endpoint(), "sa@db01/Shop");
        assert_eq!(settings.target.port, 1444);
        assert_eq!(settings.scripts, None);
    }

    #[test]
    fn test_missing_and_blank_flags() {
        let mut cli = full_cli();
        cli.source_password = None;
        cli.target_database = Some("   ".into());

        match Settings::from_cli(&cli) {
            Err(ConfigError::Missing(flags)) => assert_eq!(flags, vec!["-sp", "-td"]),
            other => panic!("expected missing flags, got {:?}", other),
        }
    }

    #[test]
    fn test_script_directory() {
        let mut cli = full_cli();
        cli.create_files = true;
        let settings = Settings::from_cli(&cli).unwrap();
        assert_eq!(settings.scripts, Some(ScriptDir::CurrentDir));

        cli.out_dir = Some("/tmp/scripts".into());
        let settings = Settings::from_cli(&cli).unwrap();
        assert_eq!(
            settings.scripts,
            Some(ScriptDir::Path("/tmp/scripts".into()))
        );
    }

    #[test]
    fn test_invalid_host() {
        let mut cli = full_cli();
        cli.target_host = Some("db02,port".into());

        let err = Settings::from_cli(&cli).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHost { flag: "-th", .. }));
        assert!(err.to_string().starts_with("Invalid value for -th"));
    }

    #[test]
    fn test_trust_cert_applies_to_both_sides() {
        let mut cli = full_cli();
        cli.trust_cert = true;
        let settings = Settings::from_cli(&cli).unwrap();
        assert!(settings.source.trust_cert);
        assert!(settings.target.trust_cert);
    }
}
