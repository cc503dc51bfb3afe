use antrian::eta;
use antrian::{
  CartLine, DeliveryInfo, ManualClock, MemoryLedger, Notifier, OrderLedger, OrderStatus, QueueService, QueueSettings,
  Recipient, TransitionRequest,
};
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use tokio::runtime::Runtime;

const KIOSK: i64 = 1;
const OPERATOR: i64 = 10;

struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
  async fn connect(&self) -> anyhow::Result<()> {
    Ok(())
  }

  fn is_connected(&self) -> bool {
    true
  }

  async fn send(&self, _recipient: &Recipient, _message: &str) -> anyhow::Result<()> {
    Ok(())
  }
}

/// A service over a kiosk with `n` paid, not yet admitted orders.
async fn seed_paid_orders(n: i64) -> (QueueService, Vec<i64>) {
  let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
  let ledger = Arc::new(MemoryLedger::new());
  ledger.add_kiosk(KIOSK, OPERATOR);

  let mut ids = Vec::with_capacity(n as usize);
  for i in 0..n {
    let buyer = format!("guest-{}", i);
    ledger.put_cart_item(
      &buyer,
      CartLine {
        menu_item_id: 1 + i % 5,
        name: "Nasi goreng".to_string(),
        price: 18_000,
        estimated_minutes: (i % 9) as i32,
        quantity: 1,
        kiosk_id: KIOSK,
      },
    );
    let order = ledger.checkout(&buyer, &DeliveryInfo::pickup(), t0).await.unwrap();
    ledger
      .apply_transition(order.id, TransitionRequest::to(OrderStatus::Paid), t0)
      .await
      .unwrap();
    ids.push(order.id);
  }

  let service = QueueService::new(
    ledger,
    Arc::new(ManualClock::new(t0 + Duration::minutes(1))),
    Arc::new(NullNotifier),
    QueueSettings::default(),
  );
  (service, ids)
}

fn bench_sequential_admissions(c: &mut Criterion) {
  let mut group = c.benchmark_group("SequentialAdmissions");
  let rt = Runtime::new().unwrap();

  for n in [10i64, 100, 500].iter() {
    group.throughput(Throughput::Elements(*n as u64));
    group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
      b.iter_batched(
        || rt.block_on(seed_paid_orders(n)),
        |(service, ids)| {
          rt.block_on(async move {
            for id in ids {
              service
                .update_order_status(id, OPERATOR, OrderStatus::Processing)
                .await
                .unwrap();
            }
          })
        },
        BatchSize::SmallInput,
      );
    });
  }
  group.finish();
}

fn bench_concurrent_admissions(c: &mut Criterion) {
  let mut group = c.benchmark_group("ConcurrentAdmissions");
  let rt = tokio::runtime::Builder::new_multi_thread()
    .worker_threads(4)
    .enable_all()
    .build()
    .unwrap();

  for n in [10i64, 100].iter() {
    group.throughput(Throughput::Elements(*n as u64));
    group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
      b.iter_batched(
        || rt.block_on(seed_paid_orders(n)),
        |(service, ids)| {
          rt.block_on(async move {
            let service = Arc::new(service);
            let handles: Vec<_> = ids
              .into_iter()
              .map(|id| {
                let service = service.clone();
                tokio::spawn(async move { service.update_order_status(id, OPERATOR, OrderStatus::Processing).await })
              })
              .collect();
            for handle in handles {
              handle.await.unwrap().unwrap();
            }
          })
        },
        BatchSize::SmallInput,
      );
    });
  }
  group.finish();
}

fn bench_queue_position(c: &mut Criterion) {
  let mut group = c.benchmark_group("QueuePosition");
  let rt = Runtime::new().unwrap();

  for n in [100i64, 1_000].iter() {
    let (service, ids) = rt.block_on(seed_paid_orders(*n));
    let orders = rt
      .block_on(service.ledger().kiosk_orders(KIOSK, &OrderStatus::ACTIVE))
      .unwrap();
    let last = orders.iter().find(|o| Some(&o.id) == ids.last()).unwrap().clone();

    group.bench_with_input(BenchmarkId::from_parameter(n), &orders, |b, orders| {
      b.iter(|| eta::queue_position(&last, orders));
    });
  }
  group.finish();
}

criterion_group!(
  benches,
  bench_sequential_admissions,
  bench_concurrent_admissions,
  bench_queue_position
);
criterion_main!(benches);
