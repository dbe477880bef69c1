//! Command verb allowlist.

use std::collections::HashSet;

use crate::config::PolicyConfig;

/// Trim the command and drop a single leading `/`.
///
/// This is the exact string handed to the executor.
pub fn normalize_command(command_text: &str) -> &str {
    let trimmed = command_text.trim();
    trimmed.strip_prefix('/').unwrap_or(trimmed)
}

/// Lower-cased leading verb of a command, e.g. `"/Kick 5"` → `"kick"`.
///
/// Whitespace left after the `/` is not skipped: `"/ kick"` has an empty verb.
pub fn command_verb(command_text: &str) -> String {
    normalize_command(command_text)
        .split(char::is_whitespace)
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Admits a command when its leading verb is on the list.
///
/// Arguments are never inspected.
#[derive(Debug, Clone)]
pub struct CommandWhitelist {
    verbs: HashSet<String>,
}

impl CommandWhitelist {
    pub fn new<I, S>(verbs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            verbs: verbs
                .into_iter()
                .map(|v| v.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn from_policy(policy: &PolicyConfig) -> Self {
        Self::new(&policy.command_whitelist)
    }

    /// Empty whitelist admits every command.
    pub fn permitted(&self, command_text: &str) -> bool {
        if self.verbs.is_empty() {
            return true;
        }
        self.verbs.contains(&command_verb(command_text))
    }
}
