// Upload set construction: turns `--upload` arguments into open file
// handles ready to be streamed as multipart parts.

use reqwest::blocking::multipart::{Form, Part};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Expand directory arguments into their immediate children, skipping
/// nested directories. Other arguments are passed through untouched, in
/// order; whether they exist is checked when the set is opened.
pub fn expand_paths(args: &[PathBuf]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for arg in args {
        if !arg.is_dir() {
            out.push(arg.clone());
            continue;
        }
        let entries = match fs::read_dir(arg) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("couldn't read directory {}: {e}", arg.display());
                continue;
            }
        };
        let mut children: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| !path.is_dir())
            .collect();
        children.sort();
        out.extend(children);
    }
    out
}

/// One file queued for upload. The handle stays open until the set is
/// turned into a form and that form is dropped.
#[derive(Debug)]
pub struct UploadFile {
    pub name: String,
    file: File,
    len: u64,
}

/// Ordered collection of files sent in a single multipart request.
#[derive(Debug, Default)]
pub struct UploadSet {
    files: Vec<UploadFile>,
}

impl UploadSet {
    /// Open every regular file in `paths`. Anything that is missing, not a
    /// regular file, or can't be opened is skipped with a warning.
    ///
    /// Parts are keyed by base name, so a later file with the same name
    /// replaces the earlier one in place and the earlier handle is closed.
    pub fn open(paths: &[PathBuf]) -> Self {
        let mut files: Vec<UploadFile> = Vec::new();
        for path in paths {
            match open_one(path) {
                Some(file) => {
                    println!("Adding {}", path.display());
                    match files.iter_mut().find(|f| f.name == file.name) {
                        Some(slot) => {
                            tracing::warn!("{} replaces an earlier file named {}", path.display(), file.name);
                            *slot = file;
                        }
                        None => files.push(file),
                    }
                }
                None => tracing::warn!("skipping {}: not a readable file", path.display()),
            }
        }
        UploadSet { files }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Part names in the order they will be sent.
    pub fn names(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.name.as_str()).collect()
    }

    /// Build the multipart form. Each part is keyed by the file's base name
    /// and streams straight from the open handle.
    pub fn into_form(self) -> Form {
        self.files.into_iter().fold(Form::new(), |form, f| {
            let part = Part::reader_with_length(f.file, f.len).file_name(f.name.clone());
            form.part(f.name, part)
        })
    }
}

fn open_one(path: &Path) -> Option<UploadFile> {
    let meta = fs::metadata(path).ok()?;
    if !meta.is_file() {
        return None;
    }
    let name = path.file_name()?.to_string_lossy().into_owned();
    let file = File::open(path).ok()?;
    Some(UploadFile {
        name,
        file,
        len: meta.len(),
    })
}
