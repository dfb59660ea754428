use poem_openapi::{payload::Json, ApiResponse, Object};
use serde::{Deserialize, Serialize};

use crate::schema::common::{
    BadRequestResponse, InternalServerErrorResponse, UnauthorizedResponse,
};

#[derive(Object, Deserialize, Serialize)]
pub struct LoginRequest {
    pub user_name: String,
    pub password: String,
}

#[derive(Object, Deserialize, Serialize)]
pub struct LoginResponse {
    pub exp: String,
    pub exp_in: i64,
    pub token: String,
    pub token_type: String,
}

#[derive(ApiResponse)]
pub enum LoginResponses {
    #[oai(status = 200)]
    Ok(Json<LoginResponse>),

    #[oai(status = 400)]
    BadRequest(Json<BadRequestResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

#[derive(ApiResponse)]
pub enum LogoutResponses {
    #[oai(status = 204)]
    NoContent,

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}
