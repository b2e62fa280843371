use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task;

use opstate::subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic};
use opstate::{Observer, Source, Subscribeable, SubscriptionRegistry, Unsubscribeable};

// Emits 0..=end from a tokio task, one item per scheduling slot, stopping
// when the unsubscribe signal arrives.
fn make_emit_u32_source(end: u32) -> Source<u32> {
    Source::new(move |mut subscriber: Subscriber<u32>| {
        let done = Arc::new(Mutex::new(false));
        let done_c = Arc::clone(&done);
        let (tx, mut rx) = mpsc::channel(10);

        task::spawn(async move {
            if let Some(stop) = rx.recv().await {
                *done_c.lock().unwrap() = stop;
            }
        });

        let handle = task::spawn(async move {
            for i in 0..=end {
                if *done.lock().unwrap() {
                    return;
                }
                subscriber.next(i);
                task::yield_now().await;
            }
            subscriber.complete();
        });

        Subscription::new(
            UnsubscribeLogic::Future(Box::pin(async move {
                let _ = tx.send(true).await;
            })),
            SubscriptionHandle::JoinTask(handle),
        )
    })
}

#[tokio::test]
async fn synchronous_source_emits_in_order_and_completes() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let completed = Arc::new(Mutex::new(false));
    let received_c = Arc::clone(&received);
    let completed_c = Arc::clone(&completed);

    let mut source = Source::new(|mut subscriber: Subscriber<i32>| {
        for i in 1..=5 {
            subscriber.next(i);
        }
        subscriber.complete();
        Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
    });

    source.subscribe(Subscriber::new(
        move |v| received_c.lock().unwrap().push(v),
        |_| {},
        move || *completed_c.lock().unwrap() = true,
    ));

    assert_eq!(*received.lock().unwrap(), vec![1, 2, 3, 4, 5]);
    assert!(*completed.lock().unwrap());
}

#[tokio::test]
async fn async_source_runs_to_completion_when_joined() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let received_c = Arc::clone(&received);

    let mut source = make_emit_u32_source(9);
    let subscription = source.subscribe(Subscriber::on_next(move |v| {
        received_c.lock().unwrap().push(v);
    }));

    subscription.join().await.unwrap();
    assert_eq!(*received.lock().unwrap(), (0..=9).collect::<Vec<u32>>());
}

#[tokio::test]
async fn cancelled_async_source_stops_emitting() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let received_c = Arc::clone(&received);

    let mut source = make_emit_u32_source(1_000_000);
    let mut registry = SubscriptionRegistry::new();
    registry.listen(
        &mut source,
        Subscriber::on_next(move |v| received_c.lock().unwrap().push(v)),
    );

    task::yield_now().await;
    registry.cancel_all().await;

    // Let the stop signal propagate to the producer task.
    for _ in 0..10 {
        task::yield_now().await;
    }
    let count_after_cancel = received.lock().unwrap().len();
    assert!(
        count_after_cancel < 1_000_000,
        "source ran to completion despite cancellation"
    );

    // The producer gets more scheduling slots; no further items may arrive.
    for _ in 0..10 {
        task::yield_now().await;
    }
    assert_eq!(received.lock().unwrap().len(), count_after_cancel);
}

#[tokio::test]
async fn wrapped_subscription_cancels_inner() {
    let cancelled = Arc::new(Mutex::new(false));
    let cancelled_c = Arc::clone(&cancelled);

    let inner = Subscription::new(
        UnsubscribeLogic::Logic(Box::new(move || {
            *cancelled_c.lock().unwrap() = true;
        })),
        SubscriptionHandle::Nil,
    );
    let outer = Subscription::new(
        UnsubscribeLogic::Wrapped(Box::new(inner)),
        SubscriptionHandle::Nil,
    );

    outer.unsubscribe();
    assert!(*cancelled.lock().unwrap());
}
