// Configuration module: everything the tool learns from its environment
// before talking to the server. The command line is declared with clap's
// derive API and the API key is read once from `BUILDRONE_KEY`.

use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Name of the environment variable holding the long-lived API key.
pub const KEY_VAR: &str = "BUILDRONE_KEY";

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "buildrone-upload", version)]
#[command(about = "Upload build artifacts to a buildrone instance and tag commits", long_about = None)]
pub struct Cli {
    /// URL of the buildrone instance
    pub url: String,

    /// Namespace of the repo (usually the account's username)
    pub namespace: String,

    /// Name of the repo
    pub repo: String,

    /// Files or directories to upload. Directories are expanded one level.
    #[arg(long = "upload", value_name = "FILE_OR_DIR", num_args = 1..)]
    pub upload: Vec<PathBuf>,

    /// Tag the current commit, as NAME=true (ready) or NAME=false
    #[arg(long, value_name = "NAME=READY", value_parser = parse_tag_spec)]
    pub tag: Option<TagSpec>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Base URL with any trailing slashes removed, so endpoint paths can be
    /// appended with a single `/`.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// A `--tag` argument: the tag name and its readiness flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSpec {
    pub name: String,
    pub ready: bool,
}

/// Parse `name=value`. Only the exact string `true` marks the tag ready;
/// everything else, including an empty value, means not ready.
pub fn parse_tag_spec(s: &str) -> Result<TagSpec, String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=true|false, got `{s}`"))?;
    if name.is_empty() {
        return Err(format!("tag name is empty in `{s}`"));
    }
    Ok(TagSpec {
        name: name.to_string(),
        ready: value == "true",
    })
}

#[derive(Debug, Error)]
#[error("No API key provided. Run with BUILDRONE_KEY=<apikey>.")]
pub struct MissingKeyError;

/// The long-lived API key. Kept out of `Debug` output so it never ends up
/// in logs.
pub struct ApiKey(String);

impl ApiKey {
    /// Read the key from `BUILDRONE_KEY`.
    pub fn from_env() -> Result<Self, MissingKeyError> {
        Self::from_value(std::env::var(KEY_VAR).ok())
    }

    /// Build a key from an optional raw value; unset and empty are both
    /// treated as missing.
    pub fn from_value(value: Option<String>) -> Result<Self, MissingKeyError> {
        match value {
            Some(v) if !v.is_empty() => Ok(ApiKey(v)),
            _ => Err(MissingKeyError),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
