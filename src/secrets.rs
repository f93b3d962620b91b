//! Secret resolution from the environment.
//!
//! A secret can be supplied directly in an environment variable, or a second
//! `*_FILE` environment variable can name a file holding the value, the way
//! container orchestrators mount secrets. The file indirection wins when it
//! yields a readable, non-empty value.

use std::env;
use std::fs;

/// Read a secret from the variable named by `env_var`, or from the file
/// named by the variable `file_env_var`.
///
/// File contents are trimmed. An unreadable or empty file falls back to the
/// direct variable. Returns `None` when neither source yields a non-empty
/// value.
pub fn read_env_or_file(env_var: Option<&str>, file_env_var: Option<&str>) -> Option<String> {
    if let Some(file_var) = file_env_var {
        if let Ok(path) = env::var(file_var) {
            if !path.is_empty() {
                if let Ok(content) = fs::read_to_string(&path) {
                    let trimmed = content.trim();
                    if !trimmed.is_empty() {
                        return Some(trimmed.to_string());
                    }
                }
            }
        }
    }

    match env::var(env_var?) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Err(_) => None,
    }
}
