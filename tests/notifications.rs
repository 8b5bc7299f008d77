mod common;

use taxi_orders::AppError;

#[tokio::test]
async fn test_fetch_unread_acknowledges_everything_it_returns() {
    let state = common::setup().await;
    let kira = common::passenger(&state, "kira").await;

    let first = state.notifications.notify(kira, "first").await.unwrap();
    let second = state.notifications.notify(kira, "second").await.unwrap();

    let unread = state.notifications.fetch_unread(kira).await.unwrap();
    let ids: Vec<i32> = unread.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![second, first]);
    assert!(unread.iter().all(|n| n.is_read));

    let again = state.notifications.fetch_unread(kira).await.unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn test_notifications_are_per_passenger() {
    let state = common::setup().await;
    let kira = common::passenger(&state, "kira").await;
    let ilya = common::passenger(&state, "ilya").await;

    state.notifications.notify(kira, "for kira").await.unwrap();

    assert!(state.notifications.fetch_unread(ilya).await.unwrap().is_empty());
    let unread = state.notifications.fetch_unread(kira).await.unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].message, "for kira");
    assert_eq!(unread[0].passenger_id, kira);
}

#[tokio::test]
async fn test_notify_unknown_passenger_is_not_found() {
    let state = common::setup().await;

    let err = state.notifications.notify(42, "hello").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { id: 42, .. }));
}

#[tokio::test]
async fn test_new_notifications_after_fetch_are_unread() {
    let state = common::setup().await;
    let kira = common::passenger(&state, "kira").await;

    state.notifications.notify(kira, "old").await.unwrap();
    state.notifications.fetch_unread(kira).await.unwrap();
    state.notifications.notify(kira, "new").await.unwrap();

    let unread = state.notifications.fetch_unread(kira).await.unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].message, "new");
}
