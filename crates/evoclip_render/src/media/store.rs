//! Object storage adapter.

use std::fs;
use std::path::{Component, Path, PathBuf};

use super::types::{MediaError, MediaRef, MediaResult};

/// Object storage as seen by the render engine.
///
/// Downloads land in the caller's private work directory; uploads return
/// the reference under which the object was stored.
pub trait MediaStore: Send + Sync {
    /// Make sure a bucket exists before uploading into it.
    fn ensure_bucket(&self, bucket: &str) -> MediaResult<()>;

    /// Copy an object to `dest` and return the local path.
    fn download_to_local(&self, media_ref: &MediaRef, dest: &Path) -> MediaResult<PathBuf>;

    /// Store a local file under `dest`.
    fn upload_local(&self, path: &Path, dest: &MediaRef, content_type: &str)
        -> MediaResult<MediaRef>;

    /// Store an in-memory payload under `dest`.
    fn upload_bytes(&self, data: &[u8], dest: &MediaRef, content_type: &str)
        -> MediaResult<MediaRef>;
}

/// Filesystem-backed store: one directory per bucket under `root`.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk location of an object.
    ///
    /// Rejects keys that would escape the bucket directory.
    pub fn object_path(&self, media_ref: &MediaRef) -> MediaResult<PathBuf> {
        let escapes = |value: &str| {
            Path::new(value)
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        };
        if escapes(&media_ref.bucket) || escapes(&media_ref.key) {
            return Err(MediaError::InvalidRef(media_ref.to_string()));
        }
        Ok(self.root.join(&media_ref.bucket).join(&media_ref.key))
    }

    fn write_object(&self, dest: &MediaRef, write: impl FnOnce(&Path) -> std::io::Result<()>)
        -> MediaResult<MediaRef> {
        let target = self.object_path(dest)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| MediaError::io(format!("creating {}", parent.display()), e))?;
        }
        write(&target).map_err(|e| MediaError::io(format!("writing {}", dest), e))?;
        Ok(dest.clone())
    }
}

impl MediaStore for LocalMediaStore {
    fn ensure_bucket(&self, bucket: &str) -> MediaResult<()> {
        let dir = self.root.join(bucket);
        fs::create_dir_all(&dir)
            .map_err(|e| MediaError::io(format!("creating bucket {}", bucket), e))
    }

    fn download_to_local(&self, media_ref: &MediaRef, dest: &Path) -> MediaResult<PathBuf> {
        let source = self.object_path(media_ref)?;
        if !source.is_file() {
            return Err(MediaError::NotFound(media_ref.to_string()));
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| MediaError::io(format!("creating {}", parent.display()), e))?;
        }
        fs::copy(&source, dest)
            .map_err(|e| MediaError::io(format!("downloading {}", media_ref), e))?;

        tracing::debug!("Downloaded {} -> {}", media_ref, dest.display());
        Ok(dest.to_path_buf())
    }

    fn upload_local(
        &self,
        path: &Path,
        dest: &MediaRef,
        _content_type: &str,
    ) -> MediaResult<MediaRef> {
        if !path.is_file() {
            return Err(MediaError::NotFound(path.display().to_string()));
        }
        self.write_object(dest, |target| fs::copy(path, target).map(|_| ()))
    }

    fn upload_bytes(
        &self,
        data: &[u8],
        dest: &MediaRef,
        _content_type: &str,
    ) -> MediaResult<MediaRef> {
        self.write_object(dest, |target| fs::write(target, data))
    }
}
