//! Payment status queries and delayed settlement.

use std::time::Duration;

use sportify_core::common::MemberId;
use sportify_core::domains::payments::{get_payment_status, PaymentStatus};
use sportify_core::kernel::{ShutdownMode, TestDependencies, DEFAULT_SETTLEMENT_DELAY};

#[tokio::test(start_paused = true)]
async fn repeated_polling_settles_once() {
    let test_deps = TestDependencies::new();
    let event_id = test_deps.events.insert_event("Addr1", None);
    let user_id = MemberId::new();
    let payment_id = test_deps.payments.insert_pending(event_id, user_id);
    let deps = test_deps.server_deps();

    for _ in 0..10 {
        let status = get_payment_status(payment_id, &deps).await.unwrap();
        assert_eq!(status, Some(PaymentStatus::Pending));
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
    tokio::time::sleep(DEFAULT_SETTLEMENT_DELAY).await;

    assert_eq!(get_payment_status(payment_id, &deps).await.unwrap(), Some(PaymentStatus::Paid));
    assert_eq!(test_deps.events.paid_users(event_id), vec![user_id]);
    assert_eq!(test_deps.payments.status_update_count(), 1);
    assert_eq!(deps.settlement.scheduled_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_polling_from_many_clients() {
    let test_deps = TestDependencies::new();
    let event_id = test_deps.events.insert_event("Addr1", None);
    let payment_id = test_deps.payments.insert_pending(event_id, MemberId::new());
    let deps = test_deps.server_deps();

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let deps = deps.clone();
            tokio::spawn(async move { get_payment_status(payment_id, &deps).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(deps.settlement.in_flight(), 1);
    deps.settlement.shutdown(ShutdownMode::Drain).await;
    assert_eq!(test_deps.payments.status_update_count(), 1);
}
