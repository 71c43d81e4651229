//! OpenAPI document served at `/api/v1/openapi.json` and rendered by the
//! Swagger UI at `/docs`. Register new endpoints here so they stay documented.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use super::handlers::auth::types::{
    LoginForm, RefreshRequest, RegisterRequest, TokenResponse, UserResponse, UserUpdateRequest,
};
use super::handlers::items::{ItemCreateRequest, ItemResponse, ItemUpdateRequest};
use super::handlers::{auth, health, items, root, users};

#[derive(OpenApi)]
#[openapi(
    paths(
        root::root,
        health::health,
        auth::register,
        auth::login,
        auth::refresh,
        auth::test_token,
        users::me,
        users::update_me,
        users::get_user,
        users::list_users,
        users::delete_user,
        items::create_item,
        items::list_items,
        items::my_items,
        items::get_item,
        items::update_item,
        items::delete_item,
    ),
    components(schemas(
        RegisterRequest,
        LoginForm,
        RefreshRequest,
        TokenResponse,
        UserResponse,
        UserUpdateRequest,
        ItemCreateRequest,
        ItemUpdateRequest,
        ItemResponse,
    )),
    modifiers(&BearerSecurity),
    tags(
        (name = "auth", description = "Registration, login, and token refresh"),
        (name = "users", description = "User directory with ownership checks"),
        (name = "items", description = "Item CRUD with ownership checks"),
        (name = "health", description = "Service health"),
        (name = "root", description = "API entry points"),
    )
)]
pub struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn openapi_covers_auth_routes() {
        let spec = ApiDoc::openapi();
        let paths = &spec.paths.paths;
        for path in [
            "/api/v1/auth/register",
            "/api/v1/auth/login",
            "/api/v1/auth/refresh",
            "/api/v1/auth/test-token",
            "/api/v1/users/me",
            "/api/v1/items/{id}",
        ] {
            assert!(paths.contains_key(path), "missing path: {path}");
        }
    }
}
