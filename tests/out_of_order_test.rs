use payment_tracker::application::tracker::PaymentTracker;
use payment_tracker::application::update::ChainUpdate;
use payment_tracker::domain::payment::NewPayment;
use payment_tracker::domain::policy::ConfirmationPolicy;
use payment_tracker::domain::status::PaymentStatus;
use payment_tracker::domain::values::{Address, Amount, Network, TxHash};
use payment_tracker::infrastructure::in_memory::{InMemoryEventBus, InMemoryPaymentRepository};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rust_decimal_macros::dec;

fn tracker() -> PaymentTracker {
    PaymentTracker::new(
        Box::new(InMemoryPaymentRepository::new()),
        Box::new(InMemoryEventBus::new()),
        ConfirmationPolicy::default(),
    )
}

fn hash(tx: &str) -> TxHash {
    TxHash::new(tx).unwrap()
}

fn detection(tx: &str) -> NewPayment {
    NewPayment {
        tx_hash: hash(tx),
        network: Network::default(),
        from: Address::new("sender").unwrap(),
        to: Address::new("merchant").unwrap(),
        amount: Amount::new(dec!(2500)).unwrap(),
        fee: None,
    }
}

/// Block info plus confirmation counts 1..=15, each delivered twice.
fn noisy_updates(tx: &str) -> Vec<ChainUpdate> {
    let mut updates = vec![ChainUpdate::Block {
        tx_hash: hash(tx),
        number: 812_000,
        hash: "000000000000000000021f".into(),
    }];
    for count in 1..=15 {
        let update = ChainUpdate::Confirmations {
            tx_hash: hash(tx),
            count,
        };
        updates.push(update.clone());
        updates.push(update);
    }
    updates
}

#[tokio::test]
async fn test_shuffled_feed_converges() {
    for seed in 0..20u64 {
        let tracker = tracker();
        tracker.register(detection("0xaa")).await.unwrap();

        let mut updates = noisy_updates("0xaa");
        updates.shuffle(&mut StdRng::seed_from_u64(seed));
        for update in updates {
            tracker.process(update).await.unwrap();
        }
        let payment = tracker.payment(&hash("0xaa")).await.unwrap().unwrap();
        assert_eq!(payment.status(), PaymentStatus::Confirmed, "seed {seed}");
        assert_eq!(payment.confirmations().value(), 15, "seed {seed}");
        assert_eq!(payment.block_info().unwrap().number(), 812_000);
    }
}

#[tokio::test]
async fn test_status_never_regresses() {
    let tracker = tracker();
    tracker.register(detection("0xaa")).await.unwrap();

    let mut updates = noisy_updates("0xaa");
    updates.shuffle(&mut StdRng::seed_from_u64(7));

    let mut seen_confirming = false;
    let mut max_count = 0;
    for update in updates {
        tracker.process(update).await.unwrap();
        let payment = tracker.payment(&hash("0xaa")).await.unwrap().unwrap();

        assert!(payment.confirmations().value() >= max_count);
        max_count = payment.confirmations().value();

        if seen_confirming {
            assert_ne!(payment.status(), PaymentStatus::Detected);
        }
        seen_confirming |= payment.status() == PaymentStatus::Confirming;
    }
}

#[tokio::test]
async fn test_independent_payments_in_parallel() {
    let tracker = std::sync::Arc::new(tracker());
    let txs: Vec<String> = (0..16).map(|i| format!("0x{i:02x}")).collect();

    let mut handles = Vec::new();
    for tx in txs.clone() {
        let tracker = tracker.clone();
        handles.push(tokio::spawn(async move {
            tracker.register(detection(&tx)).await.unwrap();
            for update in noisy_updates(&tx) {
                tracker.process(update).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for tx in &txs {
        let payment = tracker.payment(&hash(tx)).await.unwrap().unwrap();
        assert_eq!(payment.status(), PaymentStatus::Confirmed);
    }
}
