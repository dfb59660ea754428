use poem_openapi::{payload::Json, types::multipart::Upload, ApiResponse, Multipart, Object};
use serde::{Deserialize, Serialize};

use super::common::{
    BadRequestResponse, ForbiddenResponse, InternalServerErrorResponse, MessageResponse,
    NotFoundResponse, UnauthorizedResponse,
};
use crate::{
    core::utils::{date_to_string_opt, datetime_to_string_opt, parse_date_opt},
    model::{
        student_certification::StudentCertification,
        student_education::StudentEducation,
        student_experience::StudentExperience,
        student_profile::{ProfileAggregate, StudentProfile},
        student_skill::StudentSkill,
    },
    service::{error::ProfileError, profile::ProfileFiles},
    storage::{AttachmentKind, AttachmentUpload},
};

// Request

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EducationRequest {
    pub school: Option<String>,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SkillRequest {
    pub name: String,
    pub level: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CertificationRequest {
    pub name: String,
    pub issuing_organization: Option<String>,
    pub issue_date: Option<String>,
    pub expiration_date: Option<String>,
    pub credential_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExperienceRequest {
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub is_current: bool,
    pub description: Option<String>,
}

/// JSON document carried by the `profile` multipart field. Keys are snake_case;
/// unknown keys are rejected.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileRequest {
    pub headline: Option<String>,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub educations: Vec<EducationRequest>,
    #[serde(default)]
    pub skills: Vec<SkillRequest>,
    #[serde(default)]
    pub certifications: Vec<CertificationRequest>,
    #[serde(default)]
    pub experiences: Vec<ExperienceRequest>,
}

fn parse_date(value: &Option<String>, field: &str) -> Result<Option<chrono::NaiveDate>, ProfileError> {
    parse_date_opt(value).map_err(|_| {
        ProfileError::ValidationFailed(format!("{} must be a date formatted as YYYY-MM-DD", field))
    })
}

// VARCHAR sizes of the student profile tables
const NAME_MAX_LEN: usize = 255;
const CODE_MAX_LEN: usize = 64;

fn max_len(value: Option<String>, field: &str, max: usize) -> Result<Option<String>, ProfileError> {
    match value {
        Some(text) if text.chars().count() > max => Err(ProfileError::ValidationFailed(format!(
            "{} must be at most {} characters",
            field, max
        ))),
        value => Ok(value),
    }
}

fn require_text(value: &str, field: &str) -> Result<String, ProfileError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ProfileError::ValidationFailed(format!("{} is required", field)));
    }
    max_len(Some(value.to_string()), field, NAME_MAX_LEN).map(|x| x.unwrap_or_default())
}

impl ProfileRequest {
    /// Unsaved aggregate; ownership and attachment paths are filled in by the
    /// service.
    pub fn into_aggregate(self) -> Result<ProfileAggregate, ProfileError> {
        let mut educations: Vec<StudentEducation> = vec![];
        for (idx, item) in self.educations.into_iter().enumerate() {
            educations.push(StudentEducation {
                start_date: parse_date(&item.start_date, &format!("educations[{}].start_date", idx))?,
                end_date: parse_date(&item.end_date, &format!("educations[{}].end_date", idx))?,
                school: max_len(item.school, &format!("educations[{}].school", idx), NAME_MAX_LEN)?,
                degree: max_len(item.degree, &format!("educations[{}].degree", idx), NAME_MAX_LEN)?,
                field_of_study: max_len(
                    item.field_of_study,
                    &format!("educations[{}].field_of_study", idx),
                    NAME_MAX_LEN,
                )?,
                description: item.description,
                ..Default::default()
            });
        }

        let mut skills: Vec<StudentSkill> = vec![];
        for (idx, item) in self.skills.into_iter().enumerate() {
            skills.push(StudentSkill {
                name: require_text(&item.name, &format!("skills[{}].name", idx))?,
                level: max_len(item.level, &format!("skills[{}].level", idx), CODE_MAX_LEN)?,
                ..Default::default()
            });
        }

        let mut certifications: Vec<StudentCertification> = vec![];
        for (idx, item) in self.certifications.into_iter().enumerate() {
            certifications.push(StudentCertification {
                name: require_text(&item.name, &format!("certifications[{}].name", idx))?,
                issue_date: parse_date(
                    &item.issue_date,
                    &format!("certifications[{}].issue_date", idx),
                )?,
                expiration_date: parse_date(
                    &item.expiration_date,
                    &format!("certifications[{}].expiration_date", idx),
                )?,
                issuing_organization: max_len(
                    item.issuing_organization,
                    &format!("certifications[{}].issuing_organization", idx),
                    NAME_MAX_LEN,
                )?,
                credential_url: item.credential_url,
                ..Default::default()
            });
        }

        let mut experiences: Vec<StudentExperience> = vec![];
        for (idx, item) in self.experiences.into_iter().enumerate() {
            experiences.push(StudentExperience {
                title: require_text(&item.title, &format!("experiences[{}].title", idx))?,
                start_date: parse_date(&item.start_date, &format!("experiences[{}].start_date", idx))?,
                end_date: parse_date(&item.end_date, &format!("experiences[{}].end_date", idx))?,
                company: max_len(item.company, &format!("experiences[{}].company", idx), NAME_MAX_LEN)?,
                location: max_len(
                    item.location,
                    &format!("experiences[{}].location", idx),
                    NAME_MAX_LEN,
                )?,
                is_current: item.is_current,
                description: item.description,
                ..Default::default()
            });
        }

        Ok(ProfileAggregate {
            profile: StudentProfile {
                headline: max_len(self.headline, "headline", NAME_MAX_LEN)?,
                summary: self.summary,
                location: max_len(self.location, "location", NAME_MAX_LEN)?,
                phone: max_len(self.phone, "phone", CODE_MAX_LEN)?,
                ..Default::default()
            },
            educations,
            skills,
            certifications,
            experiences,
        })
    }
}

#[derive(Multipart)]
pub struct ProfileForm {
    /// Profile as a JSON document
    pub profile: String,
    pub cv: Upload,
    pub letter: Upload,
    #[oai(rename = "profilePicture")]
    pub profile_picture: Option<Upload>,
    #[oai(rename = "coverPhoto")]
    pub cover_photo: Option<Upload>,
}

async fn read_upload(kind: AttachmentKind, upload: Upload) -> Result<AttachmentUpload, ProfileError> {
    let file_name = upload.file_name().unwrap_or_default().to_string();
    let content = upload
        .into_vec()
        .await
        .map_err(|err| ProfileError::Internal(err.into()))?;
    Ok(AttachmentUpload {
        kind,
        file_name,
        content,
    })
}

impl ProfileForm {
    /// Parse the JSON part and read every file part. Optional parts without
    /// content are treated as absent.
    pub async fn into_parts(self) -> Result<(ProfileAggregate, Vec<AttachmentUpload>), ProfileError> {
        let request: ProfileRequest = serde_json::from_str(&self.profile).map_err(|err| {
            ProfileError::ValidationFailed(format!("invalid profile payload: {}", err))
        })?;
        let draft = request.into_aggregate()?;

        let mut uploads = vec![
            read_upload(AttachmentKind::Cv, self.cv).await?,
            read_upload(AttachmentKind::Letter, self.letter).await?,
        ];
        let optional = [
            (AttachmentKind::ProfilePicture, self.profile_picture),
            (AttachmentKind::CoverPhoto, self.cover_photo),
        ];
        for (kind, upload) in optional {
            if let Some(upload) = upload {
                let upload = read_upload(kind, upload).await?;
                if !upload.content.is_empty() {
                    uploads.push(upload);
                }
            }
        }
        Ok((draft, uploads))
    }
}

// Response

#[derive(Object, Deserialize, Serialize, Debug, PartialEq)]
pub struct EducationResponse {
    pub id: i32,
    pub school: Option<String>,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Object, Deserialize, Serialize, Debug, PartialEq)]
pub struct SkillResponse {
    pub id: i32,
    pub name: String,
    pub level: Option<String>,
}

#[derive(Object, Deserialize, Serialize, Debug, PartialEq)]
pub struct CertificationResponse {
    pub id: i32,
    pub name: String,
    pub issuing_organization: Option<String>,
    pub issue_date: Option<String>,
    pub expiration_date: Option<String>,
    pub credential_url: Option<String>,
}

#[derive(Object, Deserialize, Serialize, Debug, PartialEq)]
pub struct ExperienceResponse {
    pub id: i32,
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub is_current: bool,
    pub description: Option<String>,
}

#[derive(Object, Deserialize, Serialize, Debug, PartialEq)]
pub struct ProfileDetailResponse {
    pub id: i32,
    pub user_id: String,
    pub headline: Option<String>,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub cv_path: Option<String>,
    pub motivation_letter_path: Option<String>,
    pub profile_picture: Option<String>,
    pub cover_photo: Option<String>,
    pub created_date: Option<String>,
    pub updated_date: Option<String>,
    pub educations: Vec<EducationResponse>,
    pub skills: Vec<SkillResponse>,
    pub certifications: Vec<CertificationResponse>,
    pub experiences: Vec<ExperienceResponse>,
}

impl From<ProfileAggregate> for ProfileDetailResponse {
    fn from(aggregate: ProfileAggregate) -> Self {
        let profile = aggregate.profile;
        Self {
            id: profile.id,
            user_id: profile.user_id.to_string(),
            headline: profile.headline,
            summary: profile.summary,
            location: profile.location,
            phone: profile.phone,
            cv_path: profile.cv_path,
            motivation_letter_path: profile.motivation_letter_path,
            profile_picture: profile.profile_picture,
            cover_photo: profile.cover_photo,
            created_date: datetime_to_string_opt(profile.created_date),
            updated_date: datetime_to_string_opt(profile.updated_date),
            educations: aggregate
                .educations
                .into_iter()
                .map(|x| EducationResponse {
                    id: x.id,
                    school: x.school,
                    degree: x.degree,
                    field_of_study: x.field_of_study,
                    start_date: date_to_string_opt(x.start_date),
                    end_date: date_to_string_opt(x.end_date),
                    description: x.description,
                })
                .collect(),
            skills: aggregate
                .skills
                .into_iter()
                .map(|x| SkillResponse {
                    id: x.id,
                    name: x.name,
                    level: x.level,
                })
                .collect(),
            certifications: aggregate
                .certifications
                .into_iter()
                .map(|x| CertificationResponse {
                    id: x.id,
                    name: x.name,
                    issuing_organization: x.issuing_organization,
                    issue_date: date_to_string_opt(x.issue_date),
                    expiration_date: date_to_string_opt(x.expiration_date),
                    credential_url: x.credential_url,
                })
                .collect(),
            experiences: aggregate
                .experiences
                .into_iter()
                .map(|x| ExperienceResponse {
                    id: x.id,
                    title: x.title,
                    company: x.company,
                    location: x.location,
                    start_date: date_to_string_opt(x.start_date),
                    end_date: date_to_string_opt(x.end_date),
                    is_current: x.is_current,
                    description: x.description,
                })
                .collect(),
        }
    }
}

#[derive(Object, Deserialize, Serialize, Debug, PartialEq)]
#[oai(rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub struct ProfileFilesResponse {
    pub cv: Option<String>,
    pub motivation_letter: Option<String>,
    pub profile_picture: Option<String>,
    pub cover_photo: Option<String>,
}

impl From<ProfileFiles> for ProfileFilesResponse {
    fn from(files: ProfileFiles) -> Self {
        Self {
            cv: files.cv,
            motivation_letter: files.motivation_letter,
            profile_picture: files.profile_picture,
            cover_photo: files.cover_photo,
        }
    }
}

#[derive(ApiResponse)]
pub enum ProfileCreateResponses {
    #[oai(status = 200)]
    Ok(Json<ProfileDetailResponse>),

    #[oai(status = 400)]
    BadRequest(Json<BadRequestResponse>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 403)]
    Forbidden(Json<ForbiddenResponse>),

    #[oai(status = 404)]
    NotFound(Json<NotFoundResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

#[derive(ApiResponse)]
pub enum ProfileUpdateResponses {
    #[oai(status = 200)]
    Ok(Json<ProfileDetailResponse>),

    #[oai(status = 400)]
    BadRequest(Json<BadRequestResponse>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 403)]
    Forbidden(Json<ForbiddenResponse>),

    #[oai(status = 404)]
    NotFound(Json<NotFoundResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

#[derive(ApiResponse)]
pub enum ProfileDetailResponses {
    #[oai(status = 200)]
    Ok(Json<ProfileDetailResponse>),

    #[oai(status = 400)]
    BadRequest(Json<BadRequestResponse>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 403)]
    Forbidden(Json<ForbiddenResponse>),

    #[oai(status = 404)]
    NotFound(Json<NotFoundResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

#[derive(ApiResponse)]
pub enum ProfileFilesResponses {
    #[oai(status = 200)]
    Ok(Json<ProfileFilesResponse>),

    #[oai(status = 400)]
    BadRequest(Json<BadRequestResponse>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 403)]
    Forbidden(Json<ForbiddenResponse>),

    #[oai(status = 404)]
    NotFound(Json<NotFoundResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

#[derive(ApiResponse)]
pub enum ProfileDeleteResponses {
    #[oai(status = 200)]
    Ok(Json<MessageResponse>),

    #[oai(status = 400)]
    BadRequest(Json<BadRequestResponse>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 403)]
    Forbidden(Json<ForbiddenResponse>),

    #[oai(status = 404)]
    NotFound(Json<NotFoundResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

// Every profile response enum shares the same failure variants.
macro_rules! impl_profile_error_response {
    ($($name:ident),+ $(,)?) => {$(
        impl $name {
            pub fn from_error(err: ProfileError, function: &str, process: &str) -> Self {
                if !err.is_internal() {
                    tracing::debug!("route.profile.{} ({}): {}", function, process, err);
                }
                match err {
                    ProfileError::ValidationFailed(message) => {
                        $name::BadRequest(Json(BadRequestResponse { message }))
                    }
                    ProfileError::Forbidden(message) => {
                        $name::Forbidden(Json(ForbiddenResponse { message }))
                    }
                    ProfileError::NotFound(message) => {
                        $name::NotFound(Json(NotFoundResponse { message }))
                    }
                    err => $name::InternalServerError(Json(InternalServerErrorResponse::new(
                        "route.profile",
                        function,
                        process,
                        &err.to_string(),
                    ))),
                }
            }
        }
    )+};
}

impl_profile_error_response!(
    ProfileCreateResponses,
    ProfileUpdateResponses,
    ProfileDetailResponses,
    ProfileFilesResponses,
    ProfileDeleteResponses,
);
