use super::*;

fn create_test_service() -> JwtService {
    JwtService::new(&JwtConfig {
        access_secret: "test-access-secret".to_string(),
        refresh_secret: "test-refresh-secret".to_string(),
        access_token_expiry_secs: 900,
        refresh_token_expiry_secs: 604_800,
    })
}

#[test]
fn test_generate_and_validate_access_token() {
    let service = create_test_service();
    let user_id = Uuid::new_v4();

    let token = service
        .generate_access_token(user_id, "jane@example.com")
        .unwrap();
    let claims = service.validate_access_token(&token).unwrap();

    assert_eq!(claims.user_id(), user_id);
    assert_eq!(claims.email, "jane@example.com");
    assert_eq!(claims.kind, TokenKind::Access);
    assert_eq!(claims.exp - claims.iat, 900);
}

#[test]
fn test_generate_pair_refresh_round_trip() {
    let service = create_test_service();
    let user_id = Uuid::new_v4();

    let pair = service.generate_pair(user_id, "jane@example.com").unwrap();
    let claims = service.validate_refresh_token(&pair.refresh_token).unwrap();

    assert_eq!(claims.user_id(), user_id);
    assert_eq!(claims.kind, TokenKind::Refresh);
    assert_eq!(claims.expires_at(), Some(pair.refresh_expires_at));
}

#[test]
fn test_refresh_token_is_not_an_access_token() {
    let service = create_test_service();
    let pair = service.generate_pair(Uuid::new_v4(), "a@b.co").unwrap();

    assert!(service.validate_access_token(&pair.refresh_token).is_err());
    assert!(service.validate_refresh_token(&pair.access_token).is_err());
}

#[test]
fn test_same_secret_wrong_kind_is_invalid() {
    let service = JwtService::new(&JwtConfig {
        access_secret: "shared".to_string(),
        refresh_secret: "shared".to_string(),
        access_token_expiry_secs: 900,
        refresh_token_expiry_secs: 900,
    });
    let pair = service.generate_pair(Uuid::new_v4(), "a@b.co").unwrap();

    assert!(matches!(
        service.validate_access_token(&pair.refresh_token),
        Err(JwtError::Invalid)
    ));
}

#[test]
fn test_tokens_issued_together_are_distinct() {
    let service = create_test_service();
    let user_id = Uuid::new_v4();

    let first = service.generate_pair(user_id, "a@b.co").unwrap();
    let second = service.generate_pair(user_id, "a@b.co").unwrap();

    assert_ne!(first.refresh_token, second.refresh_token);
}

#[test]
fn test_expired_token() {
    let service = JwtService::new(&JwtConfig {
        access_secret: "s".to_string(),
        refresh_secret: "r".to_string(),
        access_token_expiry_secs: -3600,
        refresh_token_expiry_secs: 60,
    });
    let token = service.generate_access_token(Uuid::new_v4(), "a@b.co").unwrap();

    assert!(matches!(
        service.validate_access_token(&token),
        Err(JwtError::Expired)
    ));
}

#[test]
fn test_invalid_token() {
    let service = create_test_service();
    assert!(service.validate_access_token("invalid.token.here").is_err());
}

#[test]
fn test_debug_hides_keys() {
    let rendered = format!("{:?}", create_test_service());
    assert!(rendered.contains("[hidden]"));
    assert!(!rendered.contains("test-access-secret"));
}
