use std::sync::Arc;

use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
    body::Body,
};
use headers::{authorization::Bearer, Authorization, HeaderMapExt};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;

use crate::jwt::validate_token;

/// Resolves the bearer token into a [`User`] request extension.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::Auth("Missing or malformed bearer token".to_string()))?;

    let user = validate_token(auth.token(), &state.config.jwt_secret).map_err(AppError::Auth)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

pub fn require_admin(user: &User) -> Result<(), AppError> {
    require_role(user, &[Role::Admin])
}

pub fn require_role(user: &User, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Role {} may not perform this action",
            user.role
        )))
    }
}

/// Admins act for anyone, everyone else only for their own profile.
pub fn require_self_or_admin(user: &User, profile_id: Uuid) -> Result<(), AppError> {
    if user.can_act_for(profile_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Not authorized to act for this profile".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestUser;
    use assert_matches::assert_matches;

    #[test]
    fn role_checks() {
        let admin = TestUser::admin("a@example.com").to_user();
        let doctor = TestUser::doctor("d@example.com").to_user();

        assert!(require_admin(&admin).is_ok());
        assert_matches!(require_admin(&doctor), Err(AppError::Forbidden(_)));
        assert!(require_role(&doctor, &[Role::Doctor, Role::Admin]).is_ok());
    }

    #[test]
    fn self_or_admin() {
        let admin = TestUser::admin("a@example.com").to_user();
        let patient = TestUser::patient("p@example.com").to_user();

        assert!(require_self_or_admin(&patient, patient.id).is_ok());
        assert!(require_self_or_admin(&admin, patient.id).is_ok());
        assert_matches!(
            require_self_or_admin(&patient, Uuid::new_v4()),
            Err(AppError::Forbidden(_))
        );
    }
}
