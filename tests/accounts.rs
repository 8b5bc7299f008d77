mod common;

use taxi_orders::AppError;
use taxi_orders::services::{Registration, Role};

#[tokio::test]
async fn test_register_then_authenticate() {
    let state = common::setup().await;
    let id = common::register(&state, Role::Driver, "ivan", 4.7).await;

    let session = state
        .accounts
        .authenticate(Role::Driver, "ivan", common::PASSWORD)
        .await
        .unwrap();

    assert_eq!(session.id, id);
    assert_eq!(session.username, "ivan");
    assert_eq!(session.rating, 4.7);
    assert_eq!(session.role, Role::Driver);
}

#[tokio::test]
async fn test_wrong_password_and_unknown_user_fail_the_same_way() {
    let state = common::setup().await;
    common::passenger(&state, "kira").await;

    let wrong_password = state
        .accounts
        .authenticate(Role::Passenger, "kira", "not the password")
        .await
        .unwrap_err();
    let unknown_user = state
        .accounts
        .authenticate(Role::Passenger, "nobody", common::PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, AppError::AuthFailure));
    assert!(matches!(unknown_user, AppError::AuthFailure));
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
}

#[tokio::test]
async fn test_roles_have_separate_accounts() {
    let state = common::setup().await;
    common::passenger(&state, "sasha").await;

    let err = state
        .accounts
        .authenticate(Role::Driver, "sasha", common::PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AuthFailure));

    // The same name may exist once per role.
    let driver_id = common::driver(&state, "sasha").await;
    let session = state
        .accounts
        .authenticate(Role::Driver, "sasha", common::PASSWORD)
        .await
        .unwrap();
    assert_eq!(session.id, driver_id);
    assert_eq!(session.role, Role::Driver);
}

#[tokio::test]
async fn test_duplicate_username_is_rejected() {
    let state = common::setup().await;
    common::driver(&state, "ivan").await;

    let err = state
        .accounts
        .register(Role::Driver, Registration::new("ivan", "other", 3.0))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_username_is_trimmed() {
    let state = common::setup().await;
    common::passenger(&state, "  kira ").await;

    let session = state
        .accounts
        .authenticate(Role::Passenger, "kira", common::PASSWORD)
        .await
        .unwrap();
    assert_eq!(session.username, "kira");
}

#[tokio::test]
async fn test_invalid_registration_writes_nothing() {
    let state = common::setup().await;

    let err = state
        .accounts
        .register(Role::Passenger, Registration::new("kira", "pw", 7.0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // The name is still free.
    common::passenger(&state, "kira").await;
}
