// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::Config,
    error::AppError,
    models::{
        caller::Caller,
        id::{SectionId, StudentId, TeacherId},
    },
};

/// JWT Claims structure.
///
/// Tokens are issued by the account service; this backend only verifies them.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - the student or teacher profile id.
    pub sub: String,
    /// 'student' or 'teacher'.
    pub role: String,
    /// Section of a student, if enrolled in one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    /// Resolves the claims into the calling principal.
    pub fn caller(&self) -> Result<Caller, AppError> {
        let profile = Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::AuthError("Invalid subject in token".to_string()))?;

        match self.role.as_str() {
            "student" => {
                let section = self
                    .section
                    .as_deref()
                    .map(Uuid::parse_str)
                    .transpose()
                    .map_err(|_| AppError::AuthError("Invalid section in token".to_string()))?
                    .map(SectionId::from);
                Ok(Caller::student(StudentId::from(profile), section))
            }
            "teacher" => Ok(Caller::teacher(TeacherId::from(profile))),
            other => Err(AppError::AuthError(format!("Unsupported role '{}'", other))),
        }
    }
}

/// Signs a token for the given principal.
///
/// Used by the `issue_token` tool and tests.
pub fn sign_jwt(
    caller: &Caller,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    // Calculate expiration: current time + expiration_seconds
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let (sub, section) = match caller {
        Caller::Student(student) => (
            student.id.to_string(),
            student.section.map(|s| s.to_string()),
        ),
        Caller::Teacher(teacher) => (teacher.id.to_string(), None),
    };

    let claims = Claims {
        sub,
        role: caller.role().to_string(),
        section,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise returns an `AppError`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Axum Middleware: Authentication.
///
/// Validates the 'Authorization: Bearer <token>' header and injects the
/// resolved `Caller` into the request extensions for handlers to use.
/// Missing or invalid tokens are rejected with 401 Unauthorized.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => return AppError::AuthError("Missing bearer token".to_string()).into_response(),
    };

    match verify_jwt(token, &config.jwt_secret).and_then(|claims| claims.caller()) {
        Ok(caller) => {
            req.extensions_mut().insert(caller);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}
