use std::sync::Arc;

use poem::{http::StatusCode, test::TestClient};
use serde_json::json;
use sqlx::PgPool;
use tempfile::tempdir;
use uuid::Uuid;

use crate::{
    core::security::{get_principal_from_token, hash_password},
    factory::user::UserFactory,
    init_openapi_route,
    model::user::User,
    settings::get_config,
    storage::local::LocalDiskStorage,
    AppState,
};

#[sqlx::test]
async fn test_login_then_logout(pool: PgPool) -> anyhow::Result<()> {
    // Given
    let mut config = get_config();
    config.prefix = Some("/api".to_string());
    let dir = tempdir()?;
    let client = redis::Client::open(config.redis_url.clone())?;
    let redis_pool = r2d2::Pool::builder().build(client.clone())?;
    let app_state = Arc::new(AppState {
        db: pool,
        redis_conn: redis_pool,
        storage: Arc::new(LocalDiskStorage::new(dir.path())),
    });
    let mut user_factory = UserFactory::<Uuid>::new();
    user_factory.modified_one(|data, ext| User {
        id: ext,
        user_name: "test_user".to_string(),
        password: hash_password("password").unwrap(),
        ..data.clone()
    });
    let user_id = Uuid::now_v7();
    let (_, user_profile) = user_factory.generate_one(&app_state.db, user_id).await?;
    let app = init_openapi_route(app_state.clone(), &config);
    let cli = TestClient::new(app);

    // When login
    let json_payload = json!({
        "user_name": "test_user",
        "password": "password"
    });
    let resp = cli
        .post("/api/auth/login")
        .body_json(&json_payload)
        .send()
        .await;

    // Expect login
    resp.assert_status_is_ok();
    let json = resp.json().await;
    let token = json.value().object().get_opt("token");
    assert!(token.is_some());
    let token: String = token.unwrap().deserialize();
    json.value().object().get("token_type").assert_string("Bearer");
    let mut tx = app_state.db.begin().await?;
    let mut redis_conn = client.get_connection()?;
    let principal =
        get_principal_from_token(&mut tx, &mut redis_conn, Some(token.clone())).await?;
    assert!(principal.is_some());
    assert_eq!(principal.map(|x| x.email), user_profile.email);

    // When logout
    let resp = cli
        .post("/api/auth/logout")
        .header("authorization", format!("Bearer {}", token))
        .send()
        .await;

    // Expect logout
    resp.assert_status(StatusCode::NO_CONTENT);
    let res: Option<String> = redis::cmd("GET").arg(&token).query(&mut redis_conn)?;
    assert!(res.is_none());

    // When second logout
    let resp = cli
        .post("/api/auth/logout")
        .header("authorization", format!("Bearer {}", token))
        .send()
        .await;

    // Expect second logout
    resp.assert_status(StatusCode::UNAUTHORIZED);
    Ok(())
}

#[sqlx::test]
async fn test_login_invalid_credentials(pool: PgPool) -> anyhow::Result<()> {
    // Given
    let mut config = get_config();
    config.prefix = Some("/api".to_string());
    let dir = tempdir()?;
    let client = redis::Client::open(config.redis_url.clone())?;
    let redis_pool = r2d2::Pool::builder().build(client)?;
    let app_state = Arc::new(AppState {
        db: pool,
        redis_conn: redis_pool,
        storage: Arc::new(LocalDiskStorage::new(dir.path())),
    });
    let mut user_factory = UserFactory::<()>::new();
    user_factory.modified_one(|data, _| User {
        user_name: "test_user".to_string(),
        password: hash_password("password").unwrap(),
        ..data.clone()
    });
    user_factory.generate_one(&app_state.db, ()).await?;
    let app = init_openapi_route(app_state.clone(), &config);
    let cli = TestClient::new(app);

    // When wrong password
    let resp = cli
        .post("/api/auth/login")
        .body_json(&json!({"user_name": "test_user", "password": "wrong"}))
        .send()
        .await;

    // Expect
    resp.assert_status(StatusCode::BAD_REQUEST);

    // When unknown user
    let resp = cli
        .post("/api/auth/login")
        .body_json(&json!({"user_name": "nobody", "password": "password"}))
        .send()
        .await;

    // Expect
    resp.assert_status(StatusCode::BAD_REQUEST);
    Ok(())
}
