use bms_auth::{AuthService, JwtManager, hash_password};
use bms_storage::{InMemoryUserStore, UserRecord, UserStore};
use std::sync::Arc;

fn service(store: Arc<InMemoryUserStore>) -> AuthService {
    AuthService::new(store, JwtManager::new("secret".to_string(), 3600, 7200))
}

#[tokio::test]
async fn login_then_verify_and_refresh() {
    let store = Arc::new(InMemoryUserStore::new());
    store
        .create_user(UserRecord {
            user_id: "user-1".to_string(),
            email: "user@example.com".to_string(),
            password_hash: hash_password("pass123").expect("hash"),
            display_name: "User One".to_string(),
            is_system_administrator: false,
            refresh_jti: None,
        })
        .await
        .expect("create");
    let auth = service(store.clone());

    let (user, tokens) = auth.login("user@example.com", "pass123").await.expect("login");
    assert_eq!(user.user_id, "user-1");

    let ctx = auth.verify_access_token(&tokens.access_token).expect("verify");
    assert_eq!(ctx.email, "user@example.com");

    let rotated = auth.refresh(&tokens.refresh_token).await.expect("refresh");
    // 轮换后旧 refresh token 失效
    assert!(auth.refresh(&tokens.refresh_token).await.is_err());
    assert!(auth.refresh(&rotated.refresh_token).await.is_ok());
}

#[tokio::test]
async fn bad_password_rejected() {
    let store = Arc::new(InMemoryUserStore::new());
    store
        .create_user(UserRecord {
            user_id: "user-1".to_string(),
            email: "user@example.com".to_string(),
            password_hash: hash_password("pass123").expect("hash"),
            display_name: "User One".to_string(),
            is_system_administrator: false,
            refresh_jti: None,
        })
        .await
        .expect("create");
    let auth = service(store);
    assert!(auth.login("user@example.com", "wrong").await.is_err());
    assert!(auth.login("nobody@example.com", "pass123").await.is_err());
}
