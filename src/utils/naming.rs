//! Naming of blobs on the wire and on disk.
//!
//! A blob is requested at `{endpoint}/{digest}` and stored at
//! `{directory}/{digest}{suffix}`, optionally with an upper-cased digest.
//! While it is being written it lives next to its final path with an extra
//! [`TEMP_SUFFIX`].

use crate::digest::Digest;
use crate::error::{Error, Result};

use reqwest::Url;
use std::ffi::OsString;
use std::path::{is_separator, Path, PathBuf};

/// Suffix of the transient file a blob is streamed into before being committed.
pub const TEMP_SUFFIX: &str = ".temp";

/// How blob files are named inside the target directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileNaming {
    /// Use the upper-cased digest string as the file name stem.
    pub upper_case: bool,
    /// Appended verbatim to the digest string.
    pub suffix: String,
}

impl FileNaming {
    /// File name of the blob identified by `digest`.
    pub fn file_name(&self, digest: &Digest) -> String {
        let mut name = digest.to_hex();
        if self.upper_case {
            name.make_ascii_uppercase();
        }
        name.push_str(&self.suffix);
        name
    }

    /// Full path of the blob identified by `digest` inside `directory`.
    ///
    /// Fails when the suffix would make the file name escape `directory`.
    pub fn target_path(&self, directory: &Path, digest: &Digest) -> Result<PathBuf> {
        let name = self.file_name(digest);
        if name.chars().any(|c| is_separator(c) || c == '\0') {
            return Err(Error::InvalidPath(format!(
                "file name \"{}\" contains a path separator or a NUL byte",
                name
            )));
        }
        Ok(directory.join(name))
    }
}

/// Path of the transient file used while `target` is being downloaded.
pub fn temp_path(target: &Path) -> PathBuf {
    let mut path = OsString::from(target.as_os_str());
    path.push(TEMP_SUFFIX);
    PathBuf::from(path)
}

/// URL of the blob identified by `digest` on the store at `endpoint`.
///
/// A trailing slash on the endpoint is ignored.
pub fn blob_url(endpoint: &Url, digest: &Digest) -> String {
    format!("{}/{}", endpoint.as_str().trim_end_matches('/'), digest)
}
