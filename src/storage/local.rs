use std::{io::ErrorKind, path::PathBuf};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Local;
use tokio::{fs, fs::OpenOptions, io::AsyncWriteExt};
use uuid::Uuid;

use crate::settings::Config;

use super::{attachment_file_name, AttachmentKind, AttachmentStorage, StagedAttachment};

pub const DEFAULT_UPLOAD_DIR: &str = "uploads/student";
const STAGING_DIR: &str = ".staging";
const MAX_RESERVE_ATTEMPTS: i64 = 1000;

/// Attachments on the local filesystem. Staged files live in `<root>/.staging`
/// and are renamed into `<root>` on finalize, so both phases stay on the same
/// filesystem.
///
/// Staging reserves the final path by creating it empty with `create_new`, so
/// two uploads never share a final path and `discard` only ever removes files
/// the same staged attachment created.
pub struct LocalDiskStorage {
    root: PathBuf,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage rooted at `config.upload_dir`, relative paths resolved against
    /// the working directory.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let dir = PathBuf::from(
            config
                .upload_dir
                .clone()
                .unwrap_or(DEFAULT_UPLOAD_DIR.to_string()),
        );
        let root = if dir.is_absolute() {
            dir
        } else {
            std::env::current_dir()?.join(dir)
        };
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn staging(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    /// Create an empty file at a free `{kind}_{millis}_{name}` path. Taken names
    /// move the timestamp forward by one millisecond.
    async fn reserve_final_path(
        &self,
        kind: AttachmentKind,
        file_name: &str,
    ) -> anyhow::Result<PathBuf> {
        let millis = Local::now().timestamp_millis();
        for offset in 0..MAX_RESERVE_ATTEMPTS {
            let path = self
                .root
                .join(attachment_file_name(kind, millis + offset, file_name));
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(_) => return Ok(path),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Err(anyhow!(
            "no free name for {:?} attachment {}",
            kind,
            file_name
        ))
    }
}

async fn remove_if_exists(path: &PathBuf) -> anyhow::Result<()> {
    match fs::remove_file(path).await {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[async_trait]
impl AttachmentStorage for LocalDiskStorage {
    async fn stage(
        &self,
        kind: AttachmentKind,
        file_name: &str,
        content: &[u8],
    ) -> anyhow::Result<StagedAttachment> {
        let staging = self.staging();
        fs::create_dir_all(&staging).await?;
        let final_path = self.reserve_final_path(kind, file_name).await?;

        let staged_path = staging.join(format!("{}_{}", Uuid::now_v7().simple(), file_name));
        let written = async {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&staged_path)
                .await?;
            file.write_all(content).await?;
            file.flush().await?;
            anyhow::Ok(())
        }
        .await;
        if let Err(err) = written {
            remove_if_exists(&staged_path).await?;
            remove_if_exists(&final_path).await?;
            return Err(err);
        }
        tracing::debug!("staged {:?} attachment at {:?}", kind, staged_path);
        Ok(StagedAttachment {
            kind,
            staged_path,
            final_path,
        })
    }

    async fn finalize(&self, staged: &StagedAttachment) -> anyhow::Result<()> {
        // the final path must still be the empty file reserved by `stage`
        let reserved = fs::metadata(&staged.final_path).await?;
        if reserved.len() != 0 {
            return Err(anyhow!(
                "refusing to overwrite {:?}, it is not an empty reservation",
                staged.final_path
            ));
        }
        fs::rename(&staged.staged_path, &staged.final_path).await?;
        Ok(())
    }

    async fn discard(&self, staged: &StagedAttachment) -> anyhow::Result<()> {
        remove_if_exists(&staged.staged_path).await?;
        remove_if_exists(&staged.final_path).await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> anyhow::Result<()> {
        remove_if_exists(&PathBuf::from(path)).await
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn test_stage_then_finalize() -> anyhow::Result<()> {
        // Given
        let dir = tempdir()?;
        let storage = LocalDiskStorage::new(dir.path());

        // When
        let staged = storage
            .stage(AttachmentKind::Cv, "resume.pdf", b"%PDF-1.7")
            .await?;

        // Expect
        assert!(staged.staged_path.exists());
        // final path is reserved but still empty
        assert_eq!(std::fs::read(&staged.final_path)?.len(), 0);
        let name = staged.final_path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("cv_"));
        assert!(name.ends_with("_resume.pdf"));
        assert_eq!(staged.final_path.parent(), Some(dir.path()));

        storage.finalize(&staged).await?;
        assert!(!staged.staged_path.exists());
        assert_eq!(std::fs::read(&staged.final_path)?, b"%PDF-1.7");
        assert_eq!(staged.stored_path(), staged.final_path.to_string_lossy());
        Ok(())
    }

    #[tokio::test]
    async fn test_discard_either_phase() -> anyhow::Result<()> {
        // Given
        let dir = tempdir()?;
        let storage = LocalDiskStorage::new(dir.path());
        let staged = storage
            .stage(AttachmentKind::Letter, "letter.txt", b"hello")
            .await?;
        let finalized = storage
            .stage(AttachmentKind::CoverPhoto, "cover.png", b"png")
            .await?;
        storage.finalize(&finalized).await?;

        // When
        storage.discard(&staged).await?;
        storage.discard(&finalized).await?;

        // Expect
        assert!(!staged.staged_path.exists());
        assert!(!finalized.final_path.exists());
        // discarding twice is harmless
        storage.discard(&staged).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_stage_same_name() -> anyhow::Result<()> {
        // Given
        let dir = tempdir()?;
        let storage = LocalDiskStorage::new(dir.path());

        // When
        let (first, second) = tokio::join!(
            storage.stage(AttachmentKind::Cv, "cv.pdf", b"first"),
            storage.stage(AttachmentKind::Cv, "cv.pdf", b"second"),
        );
        let (first, second) = (first?, second?);

        // Expect distinct paths in both phases
        assert_ne!(first.staged_path, second.staged_path);
        assert_ne!(first.final_path, second.final_path);
        storage.finalize(&first).await?;
        storage.finalize(&second).await?;
        assert_eq!(std::fs::read(&first.final_path)?, b"first");
        assert_eq!(std::fs::read(&second.final_path)?, b"second");

        // removing one leaves the other intact
        storage.discard(&second).await?;
        storage.remove(&second.stored_path()).await?;
        assert!(!second.final_path.exists());
        assert_eq!(std::fs::read(&first.final_path)?, b"first");
        Ok(())
    }

    #[tokio::test]
    async fn test_finalize_refuses_foreign_file() -> anyhow::Result<()> {
        // Given
        let dir = tempdir()?;
        let storage = LocalDiskStorage::new(dir.path());
        let staged = storage
            .stage(AttachmentKind::Letter, "letter.pdf", b"mine")
            .await?;
        std::fs::write(&staged.final_path, b"someone else")?;

        // When
        let res = storage.finalize(&staged).await;

        // Expect
        assert!(res.is_err());
        assert_eq!(std::fs::read(&staged.final_path)?, b"someone else");
        assert!(staged.staged_path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_stage_skips_taken_name() -> anyhow::Result<()> {
        // Given
        let dir = tempdir()?;
        let storage = LocalDiskStorage::new(dir.path());
        let millis = Local::now().timestamp_millis();
        for offset in 0..5 {
            let taken = attachment_file_name(AttachmentKind::Cv, millis + offset, "cv.pdf");
            std::fs::write(dir.path().join(taken), b"taken")?;
        }

        // When
        let staged = storage.stage(AttachmentKind::Cv, "cv.pdf", b"new").await?;
        storage.finalize(&staged).await?;

        // Expect
        assert_eq!(std::fs::read(&staged.final_path)?, b"new");
        let num_taken = std::fs::read_dir(dir.path())?
            .filter_map(|x| x.ok())
            .filter(|x| std::fs::read(x.path()).map(|c| c == b"taken").unwrap_or(false))
            .count();
        assert_eq!(num_taken, 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_missing_is_ok() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let storage = LocalDiskStorage::new(dir.path());
        let missing = dir.path().join("nothing_here.pdf");
        storage.remove(missing.to_str().unwrap()).await?;
        Ok(())
    }
}
