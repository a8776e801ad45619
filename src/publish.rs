// Publishing flow: authenticate, find the commit, then upload and tag.
// Everything runs in order on the calling thread. Only the token exchange
// and commit lookup can fail the run; upload and tag problems are
// reported and the run carries on.

use crate::api::{ApiClient, Session, TagRecord};
use crate::config::{ApiKey, Cli, TagSpec};
use crate::files::{expand_paths, UploadSet};
use crate::git;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Run one invocation. `workdir` is the git checkout whose `HEAD` is
/// being published.
pub fn run(cli: &Cli, key: &ApiKey, workdir: &Path) -> Result<()> {
    let api = ApiClient::new(cli.base_url())?;
    let session = api.exchange_key(&cli.namespace, &cli.repo, key)?;
    let commit = git::head_commit(workdir)?;
    tracing::debug!("publishing commit {commit}");

    if !cli.upload.is_empty() {
        upload(&session, &commit, &cli.upload);
    }
    if let Some(spec) = &cli.tag {
        tag(&session, &commit, spec, workdir);
    }
    if cli.upload.is_empty() && cli.tag.is_none() {
        tracing::info!("nothing to upload or tag");
    }
    Ok(())
}

fn upload(session: &Session, commit: &str, args: &[PathBuf]) {
    let files = UploadSet::open(&expand_paths(args));
    if files.is_empty() {
        tracing::warn!("no files to upload, skipping request");
        println!("No files to upload");
        return;
    }
    tracing::debug!("uploading {} file(s): {:?}", files.len(), files.names());

    let url = session.upload_url(commit);
    println!("{url}");

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Uploading...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = session.upload(commit, files);
    spinner.finish_and_clear();

    match result {
        Ok(status) => {
            if !status.is_success() {
                tracing::warn!("upload rejected by server: {status}");
            }
            println!("Status {status}");
        }
        Err(e) => {
            tracing::warn!("upload request failed: {e}");
            println!("Upload failed: {e}");
        }
    }
}

fn tag(session: &Session, commit: &str, spec: &TagSpec, workdir: &Path) {
    let version = git::release_version(workdir, commit);
    tracing::debug!("tag {} version {version} ready={}", spec.name, spec.ready);
    let record = TagRecord::now(spec.ready, version);

    println!("{}", session.tag_url(commit, &spec.name));
    match session.tag(commit, &spec.name, &record) {
        Ok(status) => {
            if !status.is_success() {
                tracing::warn!("tag rejected by server: {status}");
            }
            println!("Status {status}");
        }
        Err(e) => {
            tracing::warn!("tag request failed: {e}");
            println!("Tag failed: {e}");
        }
    }
}
