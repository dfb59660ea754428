use std::sync::Arc;

use chrono::{Duration, Local};
use poem::web::Data;
use poem_openapi::{payload::Json, OpenApi, Tags};

use crate::{
    core::{
        security::{generate_token_from_user, verify_hash_password, BearerAuthorization},
        session::{add_session, remove_session},
    },
    repository::user::get_user_by_username,
    schema::{
        auth::{LoginRequest, LoginResponse, LoginResponses, LogoutResponses},
        common::{BadRequestResponse, InternalServerErrorResponse, UnauthorizedResponse},
    },
    settings::get_config,
    AppState,
};

#[derive(Tags)]
enum ApiAuthTags {
    Auth,
}

pub struct ApiAuth;

#[OpenApi]
impl ApiAuth {
    #[oai(path = "/auth/login", method = "post", tag = "ApiAuthTags::Auth")]
    async fn auth_login(
        &self,
        json: Json<LoginRequest>,
        state: Data<&Arc<AppState>>,
    ) -> LoginResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return LoginResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.auth",
                        "auth_login",
                        "begin transaction",
                        &err.to_string(),
                    ),
                ));
            }
        };

        // get redis conn from pool
        let mut redis_conn = match state.redis_conn.get() {
            Ok(val) => val,
            Err(err) => {
                return LoginResponses::InternalServerError(Json(InternalServerErrorResponse::new(
                    "route.auth",
                    "auth_login",
                    "get redis pool connection",
                    &err.to_string(),
                )))
            }
        };

        // get username on db
        let user = match get_user_by_username(&mut tx, &json.user_name).await {
            Ok((Some(user), Some(_))) => user,
            Ok(_) => {
                return LoginResponses::BadRequest(Json(BadRequestResponse {
                    message: "Invalid credentials".to_string(),
                }));
            }
            Err(err) => {
                return LoginResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.auth",
                        "auth_login",
                        "check user on database",
                        &err.to_string(),
                    ),
                ));
            }
        };

        // validate user password
        let is_valid = match verify_hash_password(&json.password, &user.password) {
            Ok(val) => val,
            Err(err) => {
                return LoginResponses::InternalServerError(Json(InternalServerErrorResponse::new(
                    "route.auth",
                    "auth_login",
                    "validate user password",
                    &err.to_string(),
                )))
            }
        };
        if !is_valid || user.is_active == Some(false) {
            return LoginResponses::BadRequest(Json(BadRequestResponse {
                message: "Invalid credentials".to_string(),
            }));
        }

        let config = get_config();
        let token = match generate_token_from_user(&user, &config) {
            Ok(val) => val,
            Err(err) => {
                return LoginResponses::InternalServerError(Json(InternalServerErrorResponse::new(
                    "route.auth",
                    "auth_login",
                    "generate token",
                    &err.to_string(),
                )))
            }
        };

        if let Err(err) = add_session(&mut redis_conn, &user, &config, token.clone()) {
            return LoginResponses::InternalServerError(Json(InternalServerErrorResponse::new(
                "route.auth",
                "auth_login",
                "add_session to redis",
                &err.to_string(),
            )));
        }
        let now = Local::now();
        let exp = now + Duration::minutes(config.jwt_exp as i64);
        LoginResponses::Ok(Json(LoginResponse {
            exp: exp.format("%Y-%m-%d %H:%M:%S %:z").to_string(),
            exp_in: exp.timestamp(),
            token,
            token_type: "Bearer".to_string(),
        }))
    }

    #[oai(path = "/auth/logout", method = "post", tag = "ApiAuthTags::Auth")]
    async fn auth_logout(
        &self,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> LogoutResponses {
        // get redis conn from pool
        let mut redis_conn = match state.redis_conn.get() {
            Ok(val) => val,
            Err(err) => {
                return LogoutResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.auth",
                        "auth_logout",
                        "get redis pool connection",
                        &err.to_string(),
                    ),
                ))
            }
        };

        let Some(jwt_token) = auth.0.token else {
            return LogoutResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        };
        match remove_session(&mut redis_conn, jwt_token) {
            Ok(true) => LogoutResponses::NoContent,
            Ok(false) => LogoutResponses::Unauthorized(Json(UnauthorizedResponse::default())),
            Err(err) => LogoutResponses::InternalServerError(Json(
                InternalServerErrorResponse::new(
                    "route.auth",
                    "auth_logout",
                    "remove session",
                    &err.to_string(),
                ),
            )),
        }
    }
}
