//! Default SSH private key discovery

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTITY_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^\s*IdentityFile\s+(.+?)\s*$").expect("valid regex"));

const DEFAULT_KEYS: &[&str] = &["id_rsa", "id_dsa", "id_ecdsa", "id_ed25519"];

/// The first usable private key under `~/.ssh`.
pub fn find_default_key() -> Option<PathBuf> {
    let home = BaseDirs::new()?.home_dir().to_path_buf();
    find_default_key_in(&home.join(".ssh"))
}

/// `IdentityFile` entries of `<ssh_dir>/config` that exist, then the
/// conventional key names.
pub fn find_default_key_in(ssh_dir: &Path) -> Option<PathBuf> {
    let home = ssh_dir.parent().unwrap_or(ssh_dir);

    if let Ok(config) = std::fs::read_to_string(ssh_dir.join("config")) {
        let configured = IDENTITY_FILE
            .captures_iter(&config)
            .map(|caps| expand(caps[1].trim_matches('"'), home))
            .find(|path| path.is_file());
        if configured.is_some() {
            return configured;
        }
    }

    DEFAULT_KEYS
        .iter()
        .map(|name| ssh_dir.join(name))
        .find(|path| path.is_file())
}

fn expand(path: &str, home: &Path) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_identity_file_wins() {
        let home = tempfile::tempdir().unwrap();
        let ssh = home.path().join(".ssh");
        std::fs::create_dir(&ssh).unwrap();
        std::fs::write(ssh.join("id_rsa"), "rsa").unwrap();
        std::fs::write(ssh.join("work_key"), "work").unwrap();
        std::fs::write(
            ssh.join("config"),
            "Host *\n  IdentityFile ~/.ssh/missing\n  IdentityFile ~/.ssh/work_key\n",
        )
        .unwrap();

        assert_eq!(find_default_key_in(&ssh), Some(ssh.join("work_key")));
    }

    #[test]
    fn test_conventional_names_in_order() {
        let home = tempfile::tempdir().unwrap();
        let ssh = home.path().join(".ssh");
        std::fs::create_dir(&ssh).unwrap();
        assert_eq!(find_default_key_in(&ssh), None);

        std::fs::write(ssh.join("id_ed25519"), "ed").unwrap();
        std::fs::write(ssh.join("id_ecdsa"), "ec").unwrap();
        assert_eq!(find_default_key_in(&ssh), Some(ssh.join("id_ecdsa")));
    }
}
