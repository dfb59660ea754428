use std::sync::Arc;

use poem::web::Data;
use poem_openapi::{param::Path, payload::Json, OpenApi, Tags};

use crate::{
    core::security::{get_principal_from_token, BearerAuthorization, Principal},
    schema::{
        common::{InternalServerErrorResponse, MessageResponse, UnauthorizedResponse},
        profile::{
            ProfileCreateResponses, ProfileDeleteResponses, ProfileDetailResponse,
            ProfileDetailResponses, ProfileFilesResponse, ProfileFilesResponses, ProfileForm,
            ProfileUpdateResponses,
        },
    },
    service::profile::{
        create_profile, delete_profile, get_own_profile, get_profile, get_profile_files,
        update_profile,
    },
    AppState,
};

#[derive(Tags)]
enum ApiProfileTags {
    Profile,
}

/// Resolve the caller behind a bearer token. On failure returns the process
/// name and the error message.
async fn get_principal(
    state: &AppState,
    jwt_token: Option<String>,
) -> Result<Option<Principal>, (&'static str, String)> {
    // Begin db transaction
    let mut tx = match state.db.begin().await {
        Ok(val) => val,
        Err(err) => return Err(("begin transaction", err.to_string())),
    };

    // get redis conn from pool
    let mut redis_conn = match state.redis_conn.get() {
        Ok(val) => val,
        Err(err) => return Err(("get redis pool connection", err.to_string())),
    };

    match get_principal_from_token(&mut tx, &mut redis_conn, jwt_token).await {
        Ok(val) => Ok(val),
        Err(err) => Err(("get principal from token", err.to_string())),
    }
}

fn internal_error(function: &str, process: &str, err: &str) -> Json<InternalServerErrorResponse> {
    Json(InternalServerErrorResponse::new(
        "route.profile",
        function,
        process,
        err,
    ))
}

pub struct ApiProfile;

#[OpenApi]
impl ApiProfile {
    #[oai(path = "/profiles", method = "post", tag = "ApiProfileTags::Profile")]
    async fn create_profile_api(
        &self,
        form: ProfileForm,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> ProfileCreateResponses {
        // Validate user token
        let principal = match get_principal(&state, auth.0.token).await {
            Ok(Some(val)) => val,
            Ok(None) => {
                return ProfileCreateResponses::Unauthorized(Json(UnauthorizedResponse::default()))
            }
            Err((process, err)) => {
                return ProfileCreateResponses::InternalServerError(internal_error(
                    "create_profile_api",
                    process,
                    &err,
                ))
            }
        };

        let (draft, uploads) = match form.into_parts().await {
            Ok(val) => val,
            Err(err) => {
                return ProfileCreateResponses::from_error(err, "create_profile_api", "read form")
            }
        };

        match create_profile(
            &state.db,
            state.storage.as_ref(),
            &principal.email,
            draft,
            uploads,
        )
        .await
        {
            Ok(val) => ProfileCreateResponses::Ok(Json(ProfileDetailResponse::from(val))),
            Err(err) => {
                ProfileCreateResponses::from_error(err, "create_profile_api", "create_profile")
            }
        }
    }

    #[oai(path = "/profiles/me", method = "get", tag = "ApiProfileTags::Profile")]
    async fn get_own_profile_api(
        &self,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> ProfileDetailResponses {
        // Validate user token
        let principal = match get_principal(&state, auth.0.token).await {
            Ok(Some(val)) => val,
            Ok(None) => {
                return ProfileDetailResponses::Unauthorized(Json(UnauthorizedResponse::default()))
            }
            Err((process, err)) => {
                return ProfileDetailResponses::InternalServerError(internal_error(
                    "get_own_profile_api",
                    process,
                    &err,
                ))
            }
        };

        match get_own_profile(&state.db, &principal.email).await {
            Ok(val) => ProfileDetailResponses::Ok(Json(ProfileDetailResponse::from(val))),
            Err(err) => {
                ProfileDetailResponses::from_error(err, "get_own_profile_api", "get_own_profile")
            }
        }
    }

    #[oai(path = "/profiles/:id", method = "put", tag = "ApiProfileTags::Profile")]
    async fn update_profile_api(
        &self,
        Path(id): Path<i32>,
        form: ProfileForm,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> ProfileUpdateResponses {
        // Validate user token
        let principal = match get_principal(&state, auth.0.token).await {
            Ok(Some(val)) => val,
            Ok(None) => {
                return ProfileUpdateResponses::Unauthorized(Json(UnauthorizedResponse::default()))
            }
            Err((process, err)) => {
                return ProfileUpdateResponses::InternalServerError(internal_error(
                    "update_profile_api",
                    process,
                    &err,
                ))
            }
        };

        let (draft, uploads) = match form.into_parts().await {
            Ok(val) => val,
            Err(err) => {
                return ProfileUpdateResponses::from_error(err, "update_profile_api", "read form")
            }
        };

        match update_profile(
            &state.db,
            state.storage.as_ref(),
            id,
            &principal.email,
            draft,
            uploads,
        )
        .await
        {
            Ok(val) => ProfileUpdateResponses::Ok(Json(ProfileDetailResponse::from(val))),
            Err(err) => {
                ProfileUpdateResponses::from_error(err, "update_profile_api", "update_profile")
            }
        }
    }

    #[oai(path = "/profiles/:id", method = "get", tag = "ApiProfileTags::Profile")]
    async fn get_profile_api(
        &self,
        Path(id): Path<i32>,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> ProfileDetailResponses {
        // Validate user token
        let principal = match get_principal(&state, auth.0.token).await {
            Ok(Some(val)) => val,
            Ok(None) => {
                return ProfileDetailResponses::Unauthorized(Json(UnauthorizedResponse::default()))
            }
            Err((process, err)) => {
                return ProfileDetailResponses::InternalServerError(internal_error(
                    "get_profile_api",
                    process,
                    &err,
                ))
            }
        };

        match get_profile(&state.db, id, &principal.email).await {
            Ok(val) => ProfileDetailResponses::Ok(Json(ProfileDetailResponse::from(val))),
            Err(err) => ProfileDetailResponses::from_error(err, "get_profile_api", "get_profile"),
        }
    }

    #[oai(
        path = "/profiles/:id/files",
        method = "get",
        tag = "ApiProfileTags::Profile"
    )]
    async fn get_profile_files_api(
        &self,
        Path(id): Path<i32>,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> ProfileFilesResponses {
        // Validate user token
        let principal = match get_principal(&state, auth.0.token).await {
            Ok(Some(val)) => val,
            Ok(None) => {
                return ProfileFilesResponses::Unauthorized(Json(UnauthorizedResponse::default()))
            }
            Err((process, err)) => {
                return ProfileFilesResponses::InternalServerError(internal_error(
                    "get_profile_files_api",
                    process,
                    &err,
                ))
            }
        };

        match get_profile_files(&state.db, id, &principal.email).await {
            Ok(val) => ProfileFilesResponses::Ok(Json(ProfileFilesResponse::from(val))),
            Err(err) => ProfileFilesResponses::from_error(
                err,
                "get_profile_files_api",
                "get_profile_files",
            ),
        }
    }

    #[oai(path = "/profiles/:id", method = "delete", tag = "ApiProfileTags::Profile")]
    async fn delete_profile_api(
        &self,
        Path(id): Path<i32>,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> ProfileDeleteResponses {
        // Validate user token
        let principal = match get_principal(&state, auth.0.token).await {
            Ok(Some(val)) => val,
            Ok(None) => {
                return ProfileDeleteResponses::Unauthorized(Json(UnauthorizedResponse::default()))
            }
            Err((process, err)) => {
                return ProfileDeleteResponses::InternalServerError(internal_error(
                    "delete_profile_api",
                    process,
                    &err,
                ))
            }
        };

        match delete_profile(&state.db, state.storage.as_ref(), id, &principal.email).await {
            Ok(_) => ProfileDeleteResponses::Ok(Json(MessageResponse {
                message: format!("profile with id = {} deleted", id),
            })),
            Err(err) => {
                ProfileDeleteResponses::from_error(err, "delete_profile_api", "delete_profile")
            }
        }
    }
}
