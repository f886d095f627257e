use super::Host;
use crate::Result;
use crate::config::{Config, DEFAULT_CONFIG_FILE};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file (default is `pulse.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,
}

pub fn validate_config<H: Host>(host: &mut H, args: &ValidateArgs) -> Result<()> {
    match Config::load(args.config.as_deref()) {
        Ok(config) => {
            let path = args.config.as_deref().map_or(DEFAULT_CONFIG_FILE, Utf8Path::as_str);
            let repos: usize = config.areas.values().map(Vec::len).sum();

            let _ = writeln!(host.output(), "Configuration file is valid");
            let _ = writeln!(host.output(), "Config file: {path}");
            let _ = writeln!(host.output(), "{repos} repositories in {} area(s)", config.areas.len());
            Ok(())
        }
        Err(e) => {
            let _ = writeln!(host.error(), "❌ Configuration validation failed: {e:#}");
            host.exit(1);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::host::TestHost;
    use crate::commands::init::{InitArgs, init_config};

    fn write_config(dir: &Utf8Path, name: &str, text: &str) -> Utf8PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    fn temp_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_generated_config_is_valid() {
        let (_guard, dir) = temp_dir();
        let path = dir.join("pulse.toml");

        let mut host = TestHost::new();
        init_config(&mut host, &InitArgs { output: Some(path.clone()) }).unwrap();

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(path.clone()) });

        assert!(result.is_ok(), "default configuration should validate: {result:?}");
        assert!(host.output_str().contains("Configuration file is valid"));
        assert!(host.output_str().contains(&format!("Config file: {path}")));
        assert!(host.output_str().contains("7 repositories in 3 area(s)"));
        assert_eq!(host.exit_code, None);
    }

    #[test]
    fn test_invalid_toml_syntax() {
        let (_guard, dir) = temp_dir();
        let path = write_config(&dir, "broken.toml", "owner = \"acme\"\n[areas\nBackend = [\"api\"]\n");

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(path) });

        assert!(result.is_err());
        assert!(host.error_str().contains("Configuration validation failed"));
        assert_eq!(host.exit_code, Some(1));
    }

    #[test]
    fn test_duplicate_repository_is_reported() {
        let (_guard, dir) = temp_dir();
        let path = write_config(
            &dir,
            "dupes.toml",
            r#"
owner = "acme"
workflow = "deploy"

[areas]
Backend = ["api"]
Frontend = ["acme/api"]
"#,
        );

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(path) });

        assert!(result.is_err());
        assert!(host.error_str().contains("listed more than once"));
        assert_eq!(host.exit_code, Some(1));
    }

    #[test]
    fn test_missing_explicit_file() {
        let (_guard, dir) = temp_dir();

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(dir.join("absent.toml")) });

        assert!(result.is_err());
        assert_eq!(host.exit_code, Some(1));
    }
}
