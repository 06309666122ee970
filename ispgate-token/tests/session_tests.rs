use chrono::{Duration, TimeZone, Utc};
use ispgate_token::{SigningSecret, TokenError, TokenService, SESSION_TTL_HOURS};
use ispgate_types::{Clock, IdentityId, ManualClock, ResourceId, Role};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn service_at(clock: &ManualClock) -> TokenService {
    let secret = SigningSecret::new("test-secret-for-session-tokens").unwrap();
    TokenService::new(&secret, Arc::new(clock.clone()))
}

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap())
}

// ── issue / verify ────────────────────────────────────────────────

#[test]
fn admin_token_verifies_immediately_and_expires_after_25_hours() {
    let clock = clock();
    let tokens = service_at(&clock);
    let token = tokens
        .issue_session(IdentityId::new(42), "a@b.com", Role::Admin, Duration::hours(24))
        .unwrap();

    let claims = tokens.verify_session(&token).unwrap();
    assert_eq!(claims.identity_id, IdentityId::new(42));
    assert_eq!(claims.email, "a@b.com");
    assert_eq!(claims.role, Role::Admin);
    assert_eq!(claims.expires_at - claims.issued_at, 24 * 3600);

    clock.advance(Duration::hours(25));
    assert_eq!(tokens.verify_session(&token), Err(TokenError::Invalid));
}

#[test]
fn token_is_valid_until_the_last_second_before_expiry() {
    let clock = clock();
    let tokens = service_at(&clock);
    let token = tokens
        .issue_session(IdentityId::new(1), "x@y.z", Role::Isp, Duration::hours(SESSION_TTL_HOURS))
        .unwrap();

    clock.advance(Duration::hours(SESSION_TTL_HOURS) - Duration::seconds(1));
    assert!(tokens.verify_session(&token).is_ok());

    clock.advance(Duration::seconds(1));
    assert_eq!(tokens.verify_session(&token), Err(TokenError::Invalid));
}

#[test]
fn claims_convert_to_caller_identity() {
    let clock = clock();
    let tokens = service_at(&clock);
    let token = tokens
        .issue_session(IdentityId::new(7), "d@b.com", Role::Distributor, Duration::hours(1))
        .unwrap();
    let caller = tokens.verify_session(&token).unwrap().caller();
    assert_eq!(caller.identity_id, IdentityId::new(7));
    assert_eq!(caller.role, Role::Distributor);
}

#[test]
fn claims_payload_uses_wire_names() {
    let clock = clock();
    let tokens = service_at(&clock);
    let claims = tokens
        .verify_session(
            &tokens
                .issue_session(IdentityId::new(3), "e@f.g", Role::Isp, Duration::hours(1))
                .unwrap(),
        )
        .unwrap();
    let json = serde_json::to_value(&claims).unwrap();
    assert_eq!(json["user_id"], 3);
    assert_eq!(json["role"], "isp");
    assert!(json.get("iat").is_some());
    assert!(json.get("exp").is_some());
}

// ── rejection ─────────────────────────────────────────────────────

#[test]
fn token_signed_with_other_secret_is_invalid() {
    let clock = clock();
    let other = TokenService::new(
        &SigningSecret::new("another-secret").unwrap(),
        Arc::new(clock.clone()),
    );
    let token = other
        .issue_session(IdentityId::new(1), "a@b.com", Role::Admin, Duration::hours(1))
        .unwrap();
    assert_eq!(service_at(&clock).verify_session(&token), Err(TokenError::Invalid));
}

#[test]
fn spliced_payload_is_invalid() {
    let clock = clock();
    let tokens = service_at(&clock);
    let isp = tokens
        .issue_session(IdentityId::new(1), "a@b.com", Role::Isp, Duration::hours(1))
        .unwrap();
    let admin = tokens
        .issue_session(IdentityId::new(1), "a@b.com", Role::Admin, Duration::hours(1))
        .unwrap();

    // Admin payload glued onto the ISP token's signature.
    let isp_parts: Vec<&str> = isp.split('.').collect();
    let admin_parts: Vec<&str> = admin.split('.').collect();
    let forged = format!("{}.{}.{}", isp_parts[0], admin_parts[1], isp_parts[2]);
    assert_eq!(tokens.verify_session(&forged), Err(TokenError::Invalid));
}

#[test]
fn garbage_is_invalid() {
    let clock = clock();
    let tokens = service_at(&clock);
    for bad in ["", "abc", "a.b.c", "....."] {
        assert_eq!(tokens.verify_session(bad), Err(TokenError::Invalid));
    }
}

#[test]
fn license_token_is_not_a_session() {
    let clock = clock();
    let tokens = service_at(&clock);
    let license = tokens
        .issue_license_token(
            ResourceId::new(5),
            "ISP-0123456789abcdef01234567",
            clock.now() + Duration::days(30),
        )
        .unwrap();
    assert_eq!(tokens.verify_session(&license), Err(TokenError::InvalidClaims));
}
