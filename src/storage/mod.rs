use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub mod local;

/// The four attachment slots of a student profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachmentKind {
    Cv,
    Letter,
    ProfilePicture,
    CoverPhoto,
}

impl AttachmentKind {
    /// Prefix used in stored filenames.
    pub fn prefix(&self) -> &'static str {
        match self {
            AttachmentKind::Cv => "cv",
            AttachmentKind::Letter => "letter",
            AttachmentKind::ProfilePicture => "profile",
            AttachmentKind::CoverPhoto => "cover",
        }
    }
}

/// Bytes received for one attachment slot.
#[derive(Clone, Debug)]
pub struct AttachmentUpload {
    pub kind: AttachmentKind,
    pub file_name: String,
    pub content: Vec<u8>,
}

/// An attachment written to the staging area and not yet visible at its final
/// location.
#[derive(Clone, Debug, PartialEq)]
pub struct StagedAttachment {
    pub kind: AttachmentKind,
    pub staged_path: PathBuf,
    pub final_path: PathBuf,
}

impl StagedAttachment {
    /// Path recorded on the profile once the attachment is finalized.
    pub fn stored_path(&self) -> String {
        self.final_path.to_string_lossy().to_string()
    }
}

/// Two-phase attachment store. Callers stage every upload, write the database
/// record, finalize the staged uploads and only then commit. `discard` undoes
/// either phase.
#[async_trait]
pub trait AttachmentStorage: Send + Sync {
    async fn stage(
        &self,
        kind: AttachmentKind,
        file_name: &str,
        content: &[u8],
    ) -> anyhow::Result<StagedAttachment>;

    async fn finalize(&self, staged: &StagedAttachment) -> anyhow::Result<()>;

    async fn discard(&self, staged: &StagedAttachment) -> anyhow::Result<()>;

    /// Delete an attachment previously finalized at `path`. Missing files are
    /// not an error.
    async fn remove(&self, path: &str) -> anyhow::Result<()>;
}

/// Strip any directory part from a client supplied filename.
pub fn sanitize_file_name(original: &str) -> Option<String> {
    let normalized = original.replace('\\', "/");
    let name = Path::new(&normalized).file_name()?.to_str()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

/// `{kind}_{epoch_millis}_{name}`
pub fn attachment_file_name(kind: AttachmentKind, epoch_millis: i64, name: &str) -> String {
    format!("{}_{}_{}", kind.prefix(), epoch_millis, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_file_name() {
        assert_eq!(
            attachment_file_name(AttachmentKind::Cv, 1700000000123, "resume.pdf"),
            "cv_1700000000123_resume.pdf"
        );
        assert_eq!(
            attachment_file_name(AttachmentKind::Letter, 1, "letter.docx"),
            "letter_1_letter.docx"
        );
        assert_eq!(
            attachment_file_name(AttachmentKind::ProfilePicture, 2, "me.png"),
            "profile_2_me.png"
        );
        assert_eq!(
            attachment_file_name(AttachmentKind::CoverPhoto, 3, "bg.jpg"),
            "cover_3_bg.jpg"
        );
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("cv.pdf"), Some("cv.pdf".to_string()));
        assert_eq!(
            sanitize_file_name("../../etc/passwd"),
            Some("passwd".to_string())
        );
        assert_eq!(
            sanitize_file_name("C:\\Users\\me\\cv final.pdf"),
            Some("cv final.pdf".to_string())
        );
        assert_eq!(sanitize_file_name(""), None);
        assert_eq!(sanitize_file_name(".."), None);
        assert_eq!(sanitize_file_name("uploads/"), Some("uploads".to_string()));
        assert_eq!(sanitize_file_name("/"), None);
    }
}
