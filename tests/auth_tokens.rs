use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use storefront_api::{
    dto::auth::Claims,
    models::AdminUser,
    services::auth_service::{hash_password, issue_token, verify_password},
};
use uuid::Uuid;

#[test]
fn password_hash_roundtrip() {
    let hash = hash_password("hunter2").expect("hash");
    assert!(verify_password(&hash, "hunter2").expect("verify"));
    assert!(!verify_password(&hash, "hunter3").expect("verify"));
}

#[test]
fn hashes_are_salted() {
    let a = hash_password("hunter2").expect("hash");
    let b = hash_password("hunter2").expect("hash");
    assert_ne!(a, b);
}

#[test]
fn issued_token_embeds_identity() {
    let user = AdminUser {
        id: Uuid::new_v4(),
        email: "admin@example.com".into(),
        role: "admin".into(),
    };
    let token = issue_token("test-secret", &user).expect("token");

    let decoded = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(b"test-secret"),
        &Validation::default(),
    )
    .expect("decode");

    assert_eq!(decoded.claims.sub, user.id.to_string());
    assert_eq!(decoded.claims.email, user.email);
    assert_eq!(decoded.claims.role, user.role);
}

#[test]
fn token_with_wrong_secret_is_rejected() {
    let user = AdminUser {
        id: Uuid::new_v4(),
        email: "admin@example.com".into(),
        role: "admin".into(),
    };
    let token = issue_token("test-secret", &user).expect("token");

    let result = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(b"other-secret"),
        &Validation::default(),
    );
    assert!(result.is_err());
}

#[test]
fn expired_token_is_rejected() {
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        email: "admin@example.com".into(),
        role: "admin".into(),
        exp: (chrono::Utc::now().timestamp() - 3600) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"test-secret"),
    )
    .expect("encode");

    let result = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(b"test-secret"),
        &Validation::default(),
    );
    assert!(result.is_err());
}
