pub use mediagate_core::config::*;

use anyhow::{Context, Result};
use std::path::Path;

use mediagate_av::check_tool;

/// Default config locations, searched in order.
pub const DEFAULT_PATHS: &[&str] = &[
    "./mediagate.toml",
    "~/.config/mediagate/config.toml",
    "/etc/mediagate/config.toml",
];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config).with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    config.check()?;

    for warning in config_warnings(config) {
        tracing::warn!("{}", warning);
    }

    Ok(())
}

/// Non-fatal issues, including profile commands that cannot be found.
pub fn config_warnings(config: &Config) -> Vec<String> {
    let mut warnings = config.validate();

    if config.transcoding.enabled {
        for profile in &config.transcoding.profiles {
            if !check_tool(&profile.command).available {
                warnings.push(format!(
                    "profile '{}' uses '{}' which was not found",
                    profile.name, profile.command
                ));
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("mediagate.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn empty_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&write(&dir, "")).unwrap();
        assert!(config.server.extend_protocol_info);
        assert!(config.transcoding.profiles.is_empty());
        assert_eq!(
            config.mappings.mimetype_contenttype.get("audio/L16").map(String::as_str),
            Some("pcm")
        );
    }

    #[test]
    fn parses_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            r#"
[server]
extend_protocol_info = false

[transcoding]
chunked_transfer = false
termination_grace_ms = 500

[[transcoding.profiles]]
name = "pcm"
mime_type = "audio/L16"
command = "ffmpeg"
args = ["-i", "{input}", "-f", "s16be", "-"]
chunked = true
stderr = "discard"

[mappings.mimetype_contenttype]
"audio/L16" = "pcm"
"#,
        );
        let config = load_config(&path).unwrap();
        assert!(!config.extend_protocol_info());
        let profile = config.transcoding_profile("pcm").unwrap();
        assert!(profile.is_chunked(config.chunked_transfer()));
        assert_eq!(profile.stderr, StderrMode::Discard);
        assert_eq!(config.termination_grace().as_millis(), 500);
        assert_eq!(config.mappings.mimetype_contenttype.len(), 1);
    }

    #[test]
    fn duplicate_profile_names_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            r#"
[[transcoding.profiles]]
name = "a"
mime_type = "audio/mpeg"
command = "lame"

[[transcoding.profiles]]
name = "a"
mime_type = "audio/ogg"
command = "oggenc"
"#,
        );
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("duplicate"), "{err:#}");
    }

    #[test]
    fn unparsable_file_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&write(&dir, "[transcoding\n")).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn explicit_missing_path_fails() {
        assert!(load_config_or_default(Some(Path::new("/nonexistent/mediagate.toml"))).is_err());
    }

    #[test]
    fn missing_command_is_a_warning() {
        let mut config = Config::default();
        config.transcoding.profiles.push(
            TranscodingProfile::new("x", "audio/mpeg", "nonexistent_tool_xyz_12345")
                .with_args(["{input}"]),
        );
        let warnings = config_warnings(&config);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("not found"));
    }
}
