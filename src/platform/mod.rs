// Reader platform paths
// Resolves the per-user configuration directory on Windows, macOS, and Linux.

use std::env;
use std::path::PathBuf;

/// Returns the platform-specific configuration directory for the reader.
///
/// - **Linux**: `$XDG_CONFIG_HOME/zimreader` or `~/.config/zimreader`
/// - **macOS**: `~/Library/Application Support/ZimReader`
/// - **Windows**: `%APPDATA%/ZimReader`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata = env::var("APPDATA").unwrap_or_else(|_| String::from("C:\\ProgramData"));
        PathBuf::from(appdata).join("ZimReader")
    }
    #[cfg(target_os = "macos")]
    {
        home_dir()
            .join("Library")
            .join("Application Support")
            .join("ZimReader")
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        match env::var("XDG_CONFIG_HOME") {
            Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join("zimreader"),
            _ => home_dir().join(".config").join("zimreader"),
        }
    }
}

#[cfg(not(target_os = "windows"))]
fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}
