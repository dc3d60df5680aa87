//! Property-file application configuration.

use super::{AppConfigError, AppConfigResult, SessionConfig};
use ::config::{Config, Environment, File, FileFormat};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// File name used when the caller does not pick one.
pub const DEFAULT_CONFIG_FILE_NAME: &str = "defaultConfig.properties";
/// Environment variables `RECORDKIT_<KEY>` override file values.
pub const ENV_PREFIX: &str = "RECORDKIT";

static CONFIG_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid config key regex"));

/// Key-value application settings backed by one properties file.
///
/// Effective values are layered: defaults, then the file, then
/// `RECORDKIT_*` environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    app_name: String,
    file: PathBuf,
    defaults: BTreeMap<String, String>,
    properties: BTreeMap<String, String>,
}

impl AppConfig {
    /// Creates a configuration bound to `dir/file_name`.
    ///
    /// `file_name` defaults to [`DEFAULT_CONFIG_FILE_NAME`]; `dir` defaults to
    /// the user's home directory. Until [`AppConfig::load`] runs, the
    /// effective properties are the defaults.
    pub fn new(
        app_name: impl Into<String>,
        file_name: Option<&str>,
        dir: Option<&Path>,
        defaults: BTreeMap<String, String>,
    ) -> Self {
        let dir = dir.map(Path::to_path_buf).unwrap_or_else(home_dir);
        let file = dir.join(file_name.unwrap_or(DEFAULT_CONFIG_FILE_NAME));
        let defaults = defaults
            .into_iter()
            .filter_map(|(key, value)| normalize_key(&key).ok().map(|key| (key, value)))
            .collect::<BTreeMap<_, _>>();
        Self {
            app_name: app_name.into(),
            file,
            properties: defaults.clone(),
            defaults,
        }
    }

    /// Loads the file and environment overrides, then writes the effective
    /// settings back to the file.
    ///
    /// # Errors
    /// - `Source` when environment overrides cannot be read.
    /// - `Io` when writing the file back fails.
    ///
    /// A missing file is not an error: defaults apply and the file is
    /// created. Section headers and lines without a separator are skipped.
    /// A file that cannot be read or parsed is left untouched.
    pub fn load(&mut self) -> AppConfigResult<()> {
        let started_at = Instant::now();
        let mut properties = self.defaults.clone();

        let write_back = match std::fs::read_to_string(&self.file) {
            Ok(text) => match parse_properties(&self.file, &text) {
                Ok(values) => {
                    merge_into(&mut properties, values);
                    true
                }
                Err(err) => {
                    warn!(
                        "event=config_load module=config status=fallback path={} reason={}",
                        self.file.display(),
                        err
                    );
                    false
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    "event=config_load module=config status=fallback path={} reason=missing",
                    self.file.display()
                );
                true
            }
            Err(err) => {
                warn!(
                    "event=config_load module=config status=fallback path={} reason={}",
                    self.file.display(),
                    err
                );
                false
            }
        };

        let overrides = Config::builder()
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize::<HashMap<String, String>>()?;
        merge_into(&mut properties, overrides);

        self.properties = properties;
        if write_back {
            self.save()?;
        }

        info!(
            "event=config_load module=config status=ok path={} keys={} saved={} duration_ms={}",
            self.file.display(),
            self.properties.len(),
            write_back,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Writes the effective settings as `key=value` lines.
    pub fn save(&self) -> AppConfigResult<()> {
        let io_error = |source: std::io::Error| AppConfigError::Io {
            path: self.file.clone(),
            source,
        };
        if let Some(parent) = self.file.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let mut text = format!("# Configuration file for {}\n", self.app_name);
        for (key, value) in &self.properties {
            text.push_str(key);
            text.push('=');
            text.push_str(&escape_value(value));
            text.push('\n');
        }
        std::fs::write(&self.file, text).map_err(io_error)
    }

    /// Returns the effective value for `key` (case-insensitive).
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .get(&key.trim().to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Sets one value in memory; call [`AppConfig::save`] to persist it.
    pub fn set_property(&mut self, key: &str, value: impl Into<String>) -> AppConfigResult<()> {
        let key = normalize_key(key)?;
        self.properties.insert(key, value.into());
        Ok(())
    }

    /// Copies every effective setting into a gateway session configuration.
    pub fn session_config(&self) -> SessionConfig {
        self.properties
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect()
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

fn parse_properties(
    path: &Path,
    text: &str,
) -> Result<HashMap<String, String>, ::config::ConfigError> {
    let mut entries = String::with_capacity(text.len());
    for (index, line) in text.lines().enumerate() {
        if is_entry_line(line) {
            entries.push_str(line);
            entries.push('\n');
        } else {
            warn!(
                "event=config_load module=config status=skipped reason=malformed_line \
                 path={} line={}",
                path.display(),
                index + 1
            );
        }
    }

    Config::builder()
        .add_source(File::from_str(&entries, FileFormat::Ini))
        .build()?
        .try_deserialize::<HashMap<String, String>>()
}

// Blank lines, comments and `key=value` / `key:value` entries.
fn is_entry_line(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
        return true;
    }
    match trimmed.find(['=', ':']) {
        Some(split) => !trimmed[..split].trim().is_empty() && !trimmed.starts_with('['),
        None => false,
    }
}

fn merge_into(properties: &mut BTreeMap<String, String>, values: HashMap<String, String>) {
    for (key, value) in values {
        match normalize_key(&key) {
            Ok(key) => {
                properties.insert(key, value);
            }
            Err(_) => {
                warn!(
                    "event=config_load module=config status=skipped reason=invalid_key key={}",
                    key
                );
            }
        }
    }
}

fn normalize_key(key: &str) -> AppConfigResult<String> {
    let normalized = key.trim().to_ascii_lowercase();
    if CONFIG_KEY_RE.is_match(&normalized) {
        Ok(normalized)
    } else {
        Err(AppConfigError::InvalidKey(key.to_string()))
    }
}

// The INI reader unescapes `\x` to `x` and strips quotes and comments.
fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\n' | '\r' => escaped.push(' '),
            '\\' | '"' | '\'' | ';' | '#' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::{escape_value, is_entry_line, normalize_key};

    #[test]
    fn keys_are_lowercased_and_validated() {
        assert_eq!(normalize_key(" Log_Level ").expect("valid key"), "log_level");
        assert!(normalize_key("9lives").is_err());
        assert!(normalize_key("db.path").is_err());
    }

    #[test]
    fn escape_value_keeps_single_line() {
        assert_eq!(escape_value("a\nb"), "a b");
        assert_eq!(escape_value(r"C:\data"), r"C:\\data");
        assert_eq!(escape_value(r#"say "hi"; #1"#), r#"say \"hi\"\; \#1"#);
    }

    #[test]
    fn entry_lines_need_a_key_and_separator() {
        assert!(is_entry_line("theme=dark"));
        assert!(is_entry_line("  # comment"));
        assert!(is_entry_line(""));
        assert!(!is_entry_line("just a note line"));
        assert!(!is_entry_line("[db]"));
        assert!(!is_entry_line("=orphan"));
    }
}
