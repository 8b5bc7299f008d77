mod common;

use taxi_orders::AppError;
use taxi_orders::db::find_required;
use taxi_orders::entities::order;
use taxi_orders::services::{Registration, Role};

const POOL: u32 = 5;
const CONTENDERS: usize = 8;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_drivers_on_pooled_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let state = common::setup_file(dir.path(), POOL).await;
    let kira = common::passenger(&state, "kira").await;
    let mut drivers = Vec::new();
    for n in 0..CONTENDERS {
        drivers.push(common::driver(&state, &format!("driver{n}")).await);
    }

    for round in 0..10 {
        let order_id = state
            .orders
            .create_order(kira, common::ride("10:00"))
            .await
            .unwrap();

        let handles: Vec<_> = drivers
            .iter()
            .map(|&driver_id| {
                let orders = state.orders.clone();
                tokio::spawn(async move { orders.assign_driver(order_id, driver_id).await })
            })
            .collect();

        let mut winners = Vec::new();
        let mut already_assigned = 0;
        for (handle, &driver_id) in handles.into_iter().zip(&drivers) {
            match handle.await.unwrap() {
                Ok(()) => winners.push(driver_id),
                Err(AppError::AlreadyAssigned { order_id: id }) => {
                    assert_eq!(id, order_id);
                    already_assigned += 1;
                }
                Err(other) => panic!("round {round}: driver {driver_id} got {other:?}"),
            }
        }
        assert_eq!(winners.len(), 1, "round {round}: winners {winners:?}");
        assert_eq!(already_assigned, CONTENDERS - 1);

        let stored = find_required::<order::Entity, _>(state.store.conn(), order_id)
            .await
            .unwrap();
        assert_eq!(stored.driver_id, Some(winners[0]));

        // creation plus exactly one acceptance
        let unread = state.notifications.fetch_unread(kira).await.unwrap();
        assert_eq!(unread.len(), 2, "round {round}");
        let accepted = unread
            .iter()
            .filter(|n| n.message.contains("accepted"))
            .count();
        assert_eq!(accepted, 1, "round {round}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_driver_and_passenger_delete_same_order_concurrently() {
    let dir = tempfile::tempdir().unwrap();
    let state = common::setup_file(dir.path(), POOL).await;
    let kira = common::passenger(&state, "kira").await;
    let ivan = common::driver(&state, "ivan").await;

    for round in 0..10 {
        let order_id = state
            .orders
            .create_assigned_order(kira, ivan, common::ride("10:00"))
            .await
            .unwrap();

        let by_driver = {
            let orders = state.orders.clone();
            tokio::spawn(async move { orders.delete_order(order_id, ivan, Role::Driver).await })
        };
        let by_passenger = {
            let orders = state.orders.clone();
            tokio::spawn(async move { orders.delete_order(order_id, kira, Role::Passenger).await })
        };

        let results = [by_driver.await.unwrap(), by_passenger.await.unwrap()];
        let deleted = results.iter().filter(|r| r.is_ok()).count();
        let missing = results
            .iter()
            .filter(|r| matches!(r, Err(AppError::NotFound { id, .. }) if *id == order_id))
            .count();
        assert_eq!((deleted, missing), (1, 1), "round {round}: {results:?}");
    }

    assert!(
        state
            .orders
            .list_orders_for_role(Role::Passenger, kira)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registration_of_one_name() {
    let dir = tempfile::tempdir().unwrap();
    let state = common::setup_file(dir.path(), POOL).await;

    let handles: Vec<_> = (0..CONTENDERS)
        .map(|_| {
            let accounts = state.accounts.clone();
            tokio::spawn(async move {
                accounts
                    .register(
                        Role::Passenger,
                        Registration::new("kira", common::PASSWORD, 4.0),
                    )
                    .await
            })
        })
        .collect();

    let mut registered = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => registered += 1,
            Err(AppError::Conflict(_)) => {}
            Err(other) => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(registered, 1);

    state
        .accounts
        .authenticate(Role::Passenger, "kira", common::PASSWORD)
        .await
        .unwrap();
}
