use chrono::{DateTime, FixedOffset, Local, SubsecRound};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    model::{
        student_profile::{ProfileAggregate, StudentProfile},
        user::User,
    },
    repository::{
        student_profile::{
            delete_profile as delete_profile_row, get_profile_by_id, get_profile_by_user_email,
            get_profile_by_user_id, profile_exists, save_profile,
        },
        user::get_user_by_email,
    },
    storage::{
        sanitize_file_name, AttachmentKind, AttachmentStorage, AttachmentUpload, StagedAttachment,
    },
};

use super::error::ProfileError;

/// Stored locations of the four attachment slots.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileFiles {
    pub cv: Option<String>,
    pub motivation_letter: Option<String>,
    pub profile_picture: Option<String>,
    pub cover_photo: Option<String>,
}

impl From<&StudentProfile> for ProfileFiles {
    fn from(profile: &StudentProfile) -> Self {
        Self {
            cv: profile.cv_path.clone(),
            motivation_letter: profile.motivation_letter_path.clone(),
            profile_picture: profile.profile_picture.clone(),
            cover_photo: profile.cover_photo.clone(),
        }
    }
}

/// Current time at the precision Postgres stores, so returned aggregates
/// compare equal to what a later read gives back.
fn current_time() -> DateTime<FixedOffset> {
    Local::now().fixed_offset().trunc_subsecs(6)
}

/// The one ownership rule: the profile's owner id must be the acting user's id.
pub fn ensure_owner(profile: &StudentProfile, user: &User) -> Result<(), ProfileError> {
    if profile.user_id != user.id {
        return Err(ProfileError::not_owner(profile.id));
    }
    Ok(())
}

async fn resolve_user(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
) -> Result<User, ProfileError> {
    get_user_by_email(tx, email)
        .await?
        .ok_or_else(|| ProfileError::user_not_found(email))
}

async fn load_owned_profile(
    tx: &mut Transaction<'_, Postgres>,
    id: i32,
    email: &str,
) -> Result<ProfileAggregate, ProfileError> {
    let aggregate = get_profile_by_id(tx, id)
        .await?
        .ok_or_else(|| ProfileError::profile_not_found(id))?;
    let user = resolve_user(tx, email).await?;
    ensure_owner(&aggregate.profile, &user)?;
    Ok(aggregate)
}

fn require_uploads(
    uploads: &[AttachmentUpload],
    required: &[AttachmentKind],
) -> Result<(), ProfileError> {
    for kind in required {
        if !uploads.iter().any(|x| x.kind == *kind) {
            return Err(ProfileError::ValidationFailed(format!(
                "{} file is required",
                kind.prefix()
            )));
        }
    }
    for upload in uploads {
        if upload.content.is_empty() {
            return Err(ProfileError::ValidationFailed(format!(
                "{} file is empty",
                upload.kind.prefix()
            )));
        }
    }
    Ok(())
}

async fn discard_all(storage: &dyn AttachmentStorage, staged: &[StagedAttachment]) {
    for item in staged {
        if let Err(err) = storage.discard(item).await {
            tracing::warn!("failed to discard attachment {:?}: {}", item.staged_path, err);
        }
    }
}

async fn stage_uploads(
    storage: &dyn AttachmentStorage,
    uploads: &[AttachmentUpload],
) -> Result<Vec<StagedAttachment>, ProfileError> {
    let mut staged: Vec<StagedAttachment> = vec![];
    for upload in uploads {
        let Some(file_name) = sanitize_file_name(&upload.file_name) else {
            discard_all(storage, &staged).await;
            return Err(ProfileError::ValidationFailed(format!(
                "invalid file name for {} file",
                upload.kind.prefix()
            )));
        };
        match storage.stage(upload.kind, &file_name, &upload.content).await {
            Ok(val) => staged.push(val),
            Err(err) => {
                discard_all(storage, &staged).await;
                return Err(err.into());
            }
        }
    }
    Ok(staged)
}

/// Point the profile at the staged attachments. Returns the paths that were
/// replaced.
fn apply_attachments(profile: &mut StudentProfile, staged: &[StagedAttachment]) -> Vec<String> {
    let mut superseded: Vec<String> = vec![];
    for item in staged {
        let slot = match item.kind {
            AttachmentKind::Cv => &mut profile.cv_path,
            AttachmentKind::Letter => &mut profile.motivation_letter_path,
            AttachmentKind::ProfilePicture => &mut profile.profile_picture,
            AttachmentKind::CoverPhoto => &mut profile.cover_photo,
        };
        if let Some(previous) = slot.replace(item.stored_path()) {
            superseded.push(previous);
        }
    }
    superseded
}

/// Finalize staged attachments, then commit. Any failure discards the
/// attachments and leaves the transaction uncommitted.
async fn commit_with_attachments(
    tx: Transaction<'_, Postgres>,
    storage: &dyn AttachmentStorage,
    staged: &[StagedAttachment],
) -> Result<(), ProfileError> {
    for item in staged {
        if let Err(err) = storage.finalize(item).await {
            discard_all(storage, staged).await;
            return Err(err.into());
        }
    }
    if let Err(err) = tx.commit().await {
        discard_all(storage, staged).await;
        return Err(err.into());
    }
    Ok(())
}

async fn remove_files(storage: &dyn AttachmentStorage, paths: &[String]) {
    for path in paths {
        if let Err(err) = storage.remove(path).await {
            tracing::warn!("failed to remove attachment {}: {}", path, err);
        }
    }
}

/// Create the acting user's profile. CV and letter uploads are required.
pub async fn create_profile(
    db: &PgPool,
    storage: &dyn AttachmentStorage,
    email: &str,
    draft: ProfileAggregate,
    uploads: Vec<AttachmentUpload>,
) -> Result<ProfileAggregate, ProfileError> {
    require_uploads(&uploads, &[AttachmentKind::Cv, AttachmentKind::Letter])?;
    let mut tx = db.begin().await?;
    let user = resolve_user(&mut tx, email).await?;
    if get_profile_by_user_id(&mut tx, &user.id).await?.is_some() {
        return Err(ProfileError::ValidationFailed(format!(
            "user with email = {} already has a profile",
            email
        )));
    }

    let mut aggregate = draft;
    aggregate.profile.id = 0;
    aggregate.profile.user_id = user.id;
    let staged = stage_uploads(storage, &uploads).await?;
    apply_attachments(&mut aggregate.profile, &staged);

    let now = current_time();
    if let Err(err) = save_profile(&mut tx, &mut aggregate, &now).await {
        discard_all(storage, &staged).await;
        return Err(ProfileError::from_write(err));
    }
    commit_with_attachments(tx, storage, &staged).await?;
    tracing::info!("created profile {} for user {}", aggregate.profile.id, user.id);
    Ok(aggregate)
}

/// Replace scalar fields and all four child collections of an owned profile.
/// Picture and cover photo keep their current file unless a new one is
/// uploaded.
pub async fn update_profile(
    db: &PgPool,
    storage: &dyn AttachmentStorage,
    id: i32,
    email: &str,
    draft: ProfileAggregate,
    uploads: Vec<AttachmentUpload>,
) -> Result<ProfileAggregate, ProfileError> {
    require_uploads(&uploads, &[AttachmentKind::Cv, AttachmentKind::Letter])?;
    let mut tx = db.begin().await?;
    let mut aggregate = load_owned_profile(&mut tx, id, email).await?;

    aggregate.profile.headline = draft.profile.headline.clone();
    aggregate.profile.summary = draft.profile.summary.clone();
    aggregate.profile.location = draft.profile.location.clone();
    aggregate.profile.phone = draft.profile.phone.clone();
    aggregate.replace_children(draft);

    let staged = stage_uploads(storage, &uploads).await?;
    let superseded = apply_attachments(&mut aggregate.profile, &staged);

    let now = current_time();
    if let Err(err) = save_profile(&mut tx, &mut aggregate, &now).await {
        discard_all(storage, &staged).await;
        return Err(ProfileError::from_write(err));
    }
    commit_with_attachments(tx, storage, &staged).await?;
    remove_files(storage, &superseded).await;
    tracing::info!("updated profile {}", aggregate.profile.id);
    Ok(aggregate)
}

pub async fn get_profile(db: &PgPool, id: i32, email: &str) -> Result<ProfileAggregate, ProfileError> {
    let mut tx = db.begin().await?;
    load_owned_profile(&mut tx, id, email).await
}

/// Profile owned by the user with this email.
pub async fn get_own_profile(db: &PgPool, email: &str) -> Result<ProfileAggregate, ProfileError> {
    let mut tx = db.begin().await?;
    resolve_user(&mut tx, email).await?;
    get_profile_by_user_email(&mut tx, email)
        .await?
        .ok_or_else(|| {
            ProfileError::NotFound(format!("profile for user with email = {} not found", email))
        })
}

/// Profile owned by `user_id`, without an ownership check. For callers that
/// already act as that user.
pub async fn get_profile_for_user(
    db: &PgPool,
    user_id: &Uuid,
) -> Result<ProfileAggregate, ProfileError> {
    let mut tx = db.begin().await?;
    get_profile_by_user_id(&mut tx, user_id)
        .await?
        .ok_or_else(|| {
            ProfileError::NotFound(format!("profile for user with id = {} not found", user_id))
        })
}

pub async fn get_profile_files(db: &PgPool, id: i32, email: &str) -> Result<ProfileFiles, ProfileError> {
    let mut tx = db.begin().await?;
    let aggregate = load_owned_profile(&mut tx, id, email).await?;
    Ok(ProfileFiles::from(&aggregate.profile))
}

/// Delete an owned profile with its children and, once committed, its files.
pub async fn delete_profile(
    db: &PgPool,
    storage: &dyn AttachmentStorage,
    id: i32,
    email: &str,
) -> Result<(), ProfileError> {
    let mut tx = db.begin().await?;
    let aggregate = load_owned_profile(&mut tx, id, email).await?;
    delete_profile_row(&mut tx, id).await?;
    if profile_exists(&mut tx, id).await? {
        tracing::error!("profile {} still exists after delete", id);
        return Err(ProfileError::DeleteVerification(id));
    }
    tx.commit().await?;
    remove_files(storage, &aggregate.attachment_paths()).await;
    tracing::info!("deleted profile {}", id);
    Ok(())
}
