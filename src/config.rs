use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::commands::DEFAULT_CODE_LANG;
use crate::remote::DEFAULT_ENDPOINT;
use crate::session::DEFAULT_STORAGE_KEY;

/// Options that can come from config files or the command line.
///
/// Every field is optional so layers can be merged with [`ConfigFlags::union`];
/// the accessors fill in defaults.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub store: Option<PathBuf>,
    pub storage_key: Option<String>,
    pub remote_url: Option<String>,
    pub export_dir: Option<PathBuf>,
    pub code_lang: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge two layers; values set in `other` win.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            store: other.store.clone().or_else(|| self.store.clone()),
            storage_key: other
                .storage_key
                .clone()
                .or_else(|| self.storage_key.clone()),
            remote_url: other.remote_url.clone().or_else(|| self.remote_url.clone()),
            export_dir: other.export_dir.clone().or_else(|| self.export_dir.clone()),
            code_lang: other.code_lang.clone().or_else(|| self.code_lang.clone()),
            log_file: other.log_file.clone().or_else(|| self.log_file.clone()),
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.store.clone().unwrap_or_else(default_store_path)
    }

    pub fn storage_key(&self) -> &str {
        self.storage_key.as_deref().unwrap_or(DEFAULT_STORAGE_KEY)
    }

    pub fn remote_url(&self) -> &str {
        self.remote_url.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    /// Directory exports are written to; the working directory by default.
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Language tag for new code blocks; `js` by default.
    pub fn code_lang(&self) -> &str {
        self.code_lang.as_deref().unwrap_or(DEFAULT_CODE_LANG)
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("marknote").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("marknote")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("marknote").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join("marknote").join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".marknoterc")
}

/// Where the note store lives when `--store` is not given.
pub fn default_store_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("marknote").join("store.json");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("marknote")
                .join("store.json");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("marknote").join("store.json");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("marknote")
                .join("store.json");
        }
    }

    PathBuf::from(".marknote-store.json")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# marknote defaults (saved with --save)".to_string()];
    if let Some(store) = &flags.store {
        lines.push(format!("--store {}", store.display()));
    }
    if let Some(key) = &flags.storage_key {
        lines.push(format!("--storage-key {key}"));
    }
    if let Some(url) = &flags.remote_url {
        lines.push(format!("--remote-url {url}"));
    }
    if let Some(dir) = &flags.export_dir {
        lines.push(format!("--export-dir {}", dir.display()));
    }
    if let Some(lang) = &flags.code_lang {
        lines.push(format!("--code-lang {lang}"));
    }
    if let Some(path) = &flags.log_file {
        lines.push(format!("--log-file {}", path.display()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick known `--flag value` and `--flag=value` options out of `tokens`.
///
/// Unknown tokens are ignored, so raw process arguments can be passed in.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline_value) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value.to_string())),
            _ => (token, None),
        };
        if is_value_flag(name) {
            let value = match inline_value {
                Some(value) => Some(value),
                None => {
                    let next = tokens.get(i + 1).cloned();
                    if next.is_some() {
                        i += 1;
                    }
                    next
                }
            };
            if let Some(value) = value {
                set_flag(&mut flags, name, value);
            }
        }
        i += 1;
    }
    flags
}

fn is_value_flag(name: &str) -> bool {
    matches!(
        name,
        "--store" | "--storage-key" | "--remote-url" | "--export-dir" | "--code-lang" | "--log-file"
    )
}

fn set_flag(flags: &mut ConfigFlags, name: &str, value: String) {
    match name {
        "--store" => flags.store = Some(PathBuf::from(value)),
        "--storage-key" => flags.storage_key = Some(value),
        "--remote-url" => flags.remote_url = Some(value),
        "--export-dir" => flags.export_dir = Some(PathBuf::from(value)),
        "--code-lang" => flags.code_lang = Some(value),
        "--log-file" => flags.log_file = Some(PathBuf::from(value)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let args = tokens(&[
            "marknote",
            "--store",
            "notes.json",
            "--storage-key=work",
            "--code-lang",
            "rust",
            "--log-file=marknote.log",
            "--unknown",
        ]);
        let flags = parse_flag_tokens(&args);
        assert_eq!(flags.store, Some(PathBuf::from("notes.json")));
        assert_eq!(flags.storage_key.as_deref(), Some("work"));
        assert_eq!(flags.code_lang.as_deref(), Some("rust"));
        assert_eq!(flags.log_file, Some(PathBuf::from("marknote.log")));
        assert_eq!(flags.remote_url, None);
    }

    #[test]
    fn test_trailing_value_flag_without_value_is_ignored() {
        let flags = parse_flag_tokens(&tokens(&["--export-dir"]));
        assert_eq!(flags.export_dir, None);
    }

    #[test]
    fn test_url_value_keeps_its_own_equals_signs() {
        let flags = parse_flag_tokens(&tokens(&["--remote-url=https://h.test/p?a=1"]));
        assert_eq!(flags.remote_url.as_deref(), Some("https://h.test/p?a=1"));
    }

    #[test]
    fn test_defaults_fill_unset_options() {
        let flags = ConfigFlags::default();
        assert_eq!(flags.storage_key(), "markdown-content");
        assert_eq!(flags.remote_url(), "https://jsonplaceholder.typicode.com/posts");
        assert_eq!(flags.export_dir(), PathBuf::from("."));
        assert_eq!(flags.code_lang(), "js");
        assert!(flags.store_path().ends_with("store.json"));
    }

    #[test]
    fn test_empty_code_lang_flag_drops_the_tag() {
        let flags = parse_flag_tokens(&tokens(&["--code-lang="]));
        assert_eq!(flags.code_lang(), "");
    }

    #[test]
    fn test_config_union_prefers_later_layer() {
        let file = ConfigFlags {
            storage_key: Some("file".to_string()),
            code_lang: Some("python".to_string()),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            storage_key: Some("cli".to_string()),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert_eq!(merged.storage_key(), "cli");
        assert_eq!(merged.code_lang(), "python");
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".marknoterc");
        let flags = ConfigFlags {
            store: Some(PathBuf::from("store.json")),
            storage_key: Some("notes".to_string()),
            remote_url: Some("http://localhost:3000/posts".to_string()),
            export_dir: Some(PathBuf::from("exports")),
            code_lang: Some("rust".to_string()),
            log_file: Some(PathBuf::from("marknote.log")),
        };

        save_config_flags(&path, &flags).unwrap();
        assert_eq!(load_config_flags(&path).unwrap(), flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
    }
}
