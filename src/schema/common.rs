use poem_openapi::Object;
use serde::{Deserialize, Serialize};

#[derive(Object, Deserialize, Serialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Object, Deserialize, Serialize, Debug)]
pub struct BadRequestResponse {
    pub message: String,
}

#[derive(Object, Deserialize, Serialize, Debug)]
pub struct UnauthorizedResponse {
    pub message: String,
}

impl Default for UnauthorizedResponse {
    fn default() -> Self {
        Self {
            message: "Unauthorized".to_string(),
        }
    }
}

#[derive(Object, Deserialize, Serialize, Debug)]
pub struct ForbiddenResponse {
    pub message: String,
}

#[derive(Object, Deserialize, Serialize, Debug)]
pub struct NotFoundResponse {
    pub message: String,
}

#[derive(Object, Deserialize, Serialize, Debug)]
pub struct InternalServerErrorResponse {
    pub message: String,
    pub location: String,
    pub process: String,
}

impl InternalServerErrorResponse {
    /// Logs the underlying error; the client only sees where it happened.
    pub fn new(module: &str, function: &str, process: &str, err: &str) -> Self {
        let location = format!("{}.{}", module, function);
        tracing::error!("{} ({}): {}", location, process, err);
        Self {
            message: "Internal server error".to_string(),
            location,
            process: process.to_string(),
        }
    }
}
