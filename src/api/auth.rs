//! Registration, login and the bearer-token extractor

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{get, post, web, FromRequest, HttpRequest, HttpResponse};
use anyhow::anyhow;
use futures::future::LocalBoxFuture;
use serde::Deserialize;

use super::AppState;
use crate::core::authenticate;
use crate::db::UserTable;
use crate::error::ApiError;
use crate::models::{normalize_email, NewUser, User, Validate};
use crate::utils::auth::{create_jwt, hash_password, verify_password};

/// Authenticated caller, resolved from `Authorization: Bearer <token>`
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let header = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let path = req.path().to_string();

        Box::pin(async move {
            let state = state.ok_or_else(|| anyhow!("application state is not configured"))?;

            match authenticate(state.db.pool(), &state.jwt, header.as_deref()).await {
                Ok(user) => Ok(AuthUser(user)),
                Err(rejection) => {
                    tracing::debug!("Rejected request to {}: {:?}", path, rejection);
                    Err(rejection.into())
                }
            }
        })
    }
}

/// login request
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn token_response(status: actix_web::http::StatusCode, user: &User, token: String) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "success": true,
        "token": token,
        "user": user.to_public(),
    }))
}

/// POST /register
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<NewUser>,
) -> Result<HttpResponse, ApiError> {
    let new_user = body.into_inner().normalized();
    new_user.validate()?;

    let pool = state.db.pool();
    if UserTable::get_by_email(pool, &new_user.email).await?.is_some() {
        return Err(ApiError::BadRequest("user already exists".to_string()));
    }

    let user = UserTable::insert(pool, &new_user, &hash_password(&new_user.password)).await?;
    let token = create_jwt(user.id, &state.jwt.secret, state.jwt.ttl)?;

    tracing::info!("Registered user {} ({})", user.username, user.id);
    Ok(token_response(actix_web::http::StatusCode::CREATED, &user, token))
}

/// POST /login
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let LoginRequest { email, password } = body.into_inner();
    let (email, password) = match (email, password) {
        (Some(e), Some(p)) if !e.trim().is_empty() && !p.is_empty() => (e, p),
        _ => {
            return Err(ApiError::BadRequest(
                "please provide email and password".to_string(),
            ))
        }
    };

    let user = UserTable::get_by_email(state.db.pool(), &normalize_email(&email))
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(&password, &user.password)? {
        return Err(ApiError::InvalidCredentials);
    }

    let token = create_jwt(user.id, &state.jwt.secret, state.jwt.ttl)?;
    Ok(token_response(actix_web::http::StatusCode::OK, &user, token))
}

/// GET /me
#[get("/me")]
pub async fn me(AuthUser(user): AuthUser) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": user.to_public(),
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(register).service(login).service(me);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{app, state, user};
    use crate::utils::auth::{encode_claims, verify_jwt, Claims};
    use actix_web::test;
    use serde_json::{json, Value};
    use std::time::{SystemTime, UNIX_EPOCH};

    #[actix_web::test]
    async fn test_register_returns_verifiable_token() {
        let state = state().await;
        let app = test::init_service(app(state.clone())).await;

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "username": "brian",
                "email": "Brian@Example.com",
                "password": "redspecial"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["user"]["email"], "brian@example.com");
        assert!(body["user"].get("password").is_none());

        let claims = verify_jwt(body["token"].as_str().unwrap(), &state.jwt.secret).unwrap();
        assert_eq!(claims.sub, body["user"]["id"].as_i64().unwrap());
    }

    #[actix_web::test]
    async fn test_register_duplicate_and_invalid() {
        let state = state().await;
        let app = test::init_service(app(state.clone())).await;
        user(&state, "roger").await;

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "username": "roger2",
                "email": "roger@example.com",
                "password": "drums123"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({ "username": "john", "email": "nope", "password": "123" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: Value = test::read_body_json(resp).await;
        let fields: Vec<&str> = body["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["email", "password"]);
    }

    #[actix_web::test]
    async fn test_login() {
        let state = state().await;
        let app = test::init_service(app(state.clone())).await;
        user(&state, "freddie").await;

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "FREDDIE@example.com", "password": "secret1" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "freddie@example.com", "password": "wrong-pass" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "freddie@example.com" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_me_rejections() {
        let state = state().await;
        let app = test::init_service(app(state.clone())).await;
        let (id, bearer) = user(&state, "deacon").await;

        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(("Authorization", bearer.as_str()))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["user"]["id"], id);

        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
        let expired = encode_claims(
            &Claims {
                sub: id,
                iat: now - 100,
                exp: now - 10,
            },
            &state.jwt.secret,
        )
        .unwrap();
        let ghost = create_jwt(id + 42, &state.jwt.secret, state.jwt.ttl).unwrap();

        let cases = [
            None,
            Some("Bearer garbage".to_string()),
            Some(format!("Bearer {}", expired)),
            Some(format!("Bearer {}", ghost)),
        ];
        for header in cases {
            let mut req = test::TestRequest::get().uri("/api/auth/me");
            if let Some(h) = &header {
                req = req.insert_header(("Authorization", h.as_str()));
            }
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), 401, "header {:?}", header);
        }
    }
}
