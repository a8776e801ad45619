// Library root
// -----------
// This crate exposes the pieces the `buildrone-upload` binary is built
// from.
//
// Module responsibilities:
// - `config`: command-line arguments, `--tag` parsing and the API key.
// - `api`: HTTP interactions with buildrone (token exchange, upload, tag).
// - `git`: resolving the commit hash and release version.
// - `files`: expanding `--upload` arguments into open file handles.
// - `publish`: the sequential flow tying the above together.
pub mod api;
pub mod config;
pub mod files;
pub mod git;
pub mod publish;
