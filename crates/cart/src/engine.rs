//! The cart engine: single holder of the session cart.

use std::sync::Arc;

use cart_store::SnapshotStore;
use common::ItemId;
use tokio::sync::{Mutex, watch};
use tracing::Instrument;

use crate::cart::{Cart, RequestedAmount, validate_amount};
use crate::error::CartError;
use crate::persistence::CartRepository;
use crate::services::{Catalog, Notification, NotificationSink, Operation, StockOracle};

/// Result of a cart operation: the committed cart, or why nothing changed.
pub type Outcome = Result<Cart, CartError>;

/// Holds the current cart and applies operations against live stock.
///
/// Mutations are serialized: each one holds the writer lock from the moment
/// it captures the base cart until its snapshot write returns, so two
/// overlapping calls can never commit against the same stale base. Once a
/// mutation holds the lock it runs on its own task, and dropping the caller's
/// future does not stop it between the commit and the snapshot write. Reads
/// go through [`CartEngine::cart`] and never wait for an in-flight mutation.
///
/// A rejected operation leaves the cart and the store untouched and sends
/// exactly one notification to the sink. A failed snapshot write is logged
/// and does not change the operation's outcome.
pub struct CartEngine<C, O, S, N> {
    shared: Arc<Shared<C, O, S, N>>,
    writer: Arc<Mutex<()>>,
}

struct Shared<C, O, S, N> {
    catalog: C,
    stock: O,
    repository: CartRepository<S>,
    sink: N,
    current: watch::Sender<Cart>,
}

enum Command {
    Add,
    Remove,
    SetAmount(RequestedAmount),
}

impl Command {
    fn operation(&self) -> Operation {
        match self {
            Command::Add => Operation::Add,
            Command::Remove => Operation::Remove,
            Command::SetAmount(_) => Operation::SetAmount,
        }
    }
}

impl<C, O, S, N> CartEngine<C, O, S, N>
where
    C: Catalog + 'static,
    O: StockOracle + 'static,
    S: SnapshotStore + 'static,
    N: NotificationSink + 'static,
{
    /// Creates an engine with an empty cart.
    pub fn new(catalog: C, stock: O, store: S, sink: N) -> Self {
        Self::with_cart(catalog, stock, store, sink, Cart::new())
    }

    /// Creates an engine starting from `cart`.
    pub fn with_cart(catalog: C, stock: O, store: S, sink: N, cart: Cart) -> Self {
        Self::from_parts(catalog, stock, CartRepository::new(store), sink, cart)
    }

    /// Creates an engine from the last saved snapshot.
    ///
    /// The snapshot is taken verbatim; lines are only checked against stock
    /// when an operation next touches them. A missing snapshot starts an
    /// empty cart, and so does one that cannot be read.
    pub async fn restore(catalog: C, stock: O, store: S, sink: N) -> Self {
        let repository = CartRepository::new(store);
        let cart = match repository.load().await {
            Ok(Some(cart)) => {
                tracing::info!(lines = cart.len(), "restored cart snapshot");
                cart
            }
            Ok(None) => Cart::new(),
            Err(error) => {
                tracing::warn!(%error, "discarding unreadable cart snapshot");
                Cart::new()
            }
        };

        Self::from_parts(catalog, stock, repository, sink, cart)
    }

    fn from_parts(
        catalog: C,
        stock: O,
        repository: CartRepository<S>,
        sink: N,
        cart: Cart,
    ) -> Self {
        let (current, _) = watch::channel(cart);
        Self {
            shared: Arc::new(Shared {
                catalog,
                stock,
                repository,
                sink,
                current,
            }),
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the last committed cart.
    pub fn cart(&self) -> Cart {
        self.shared.current.borrow().clone()
    }

    /// Returns a receiver that observes every committed cart.
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.shared.current.subscribe()
    }

    /// Adds one unit of an item.
    #[tracing::instrument(skip(self), fields(item_id = %item_id))]
    pub async fn add(&self, item_id: ItemId) -> Outcome {
        self.run(item_id, Command::Add).await
    }

    /// Removes the line for an item entirely.
    #[tracing::instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove(&self, item_id: ItemId) -> Outcome {
        self.run(item_id, Command::Remove).await
    }

    /// Sets the amount of an existing line to exactly `amount`.
    pub async fn set_amount(&self, item_id: ItemId, amount: i64) -> Outcome {
        self.set_requested_amount(item_id, RequestedAmount::Whole(amount))
            .await
    }

    /// Sets the amount of an existing line from an unvalidated value.
    ///
    /// A value that is not a positive integer is rejected as
    /// `InvalidAmount` without any lookup.
    #[tracing::instrument(skip(self, amount), fields(item_id = %item_id, amount = %amount))]
    pub async fn set_requested_amount(
        &self,
        item_id: ItemId,
        amount: RequestedAmount,
    ) -> Outcome {
        self.run(item_id, Command::SetAmount(amount)).await
    }

    /// Waits for the writer lock, then finishes the mutation on its own task.
    ///
    /// Lock waiters are served in FIFO order, so operations commit in the
    /// order they were invoked.
    async fn run(&self, item_id: ItemId, command: Command) -> Outcome {
        let writer = Arc::clone(&self.writer).lock_owned().await;
        let shared = Arc::clone(&self.shared);

        let task = tokio::spawn(
            async move {
                let _writer = writer;
                shared.apply(item_id, command).await
            }
            .in_current_span(),
        );

        match task.await {
            Ok(outcome) => outcome,
            Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
            Err(error) => Err(CartError::Unavailable(error.to_string())),
        }
    }
}

impl<C, O, S, N> Shared<C, O, S, N>
where
    C: Catalog,
    O: StockOracle,
    S: SnapshotStore,
    N: NotificationSink,
{
    async fn apply(&self, item_id: ItemId, command: Command) -> Outcome {
        let operation = command.operation();
        let base = self.current.borrow().clone();

        let next = match command {
            Command::Add => self.plan_add(&base, item_id).await,
            Command::Remove => base.remove(item_id),
            Command::SetAmount(amount) => self.plan_set_amount(&base, item_id, amount).await,
        };
        self.settle(operation, item_id, next).await
    }

    async fn plan_add(&self, base: &Cart, item_id: ItemId) -> Outcome {
        let item = self.catalog.item(item_id).await?;
        let stock = self.stock.stock(item_id).await?;
        base.increment(&item, stock.amount)
    }

    async fn plan_set_amount(
        &self,
        base: &Cart,
        item_id: ItemId,
        amount: RequestedAmount,
    ) -> Outcome {
        let amount = validate_amount(amount)?;
        let stock = self.stock.stock(item_id).await?;
        base.set_amount(item_id, amount, stock.amount)
    }

    async fn settle(&self, operation: Operation, item_id: ItemId, next: Outcome) -> Outcome {
        match next {
            Ok(cart) => {
                self.persist(&cart).await;
                self.current.send_replace(cart.clone());
                metrics::counter!(
                    "cart_operations_total",
                    "operation" => operation.as_str(),
                    "outcome" => "committed"
                )
                .increment(1);
                tracing::debug!(%operation, lines = cart.len(), "cart committed");
                Ok(cart)
            }
            Err(error) => {
                metrics::counter!(
                    "cart_operations_total",
                    "operation" => operation.as_str(),
                    "outcome" => error.kind().as_str()
                )
                .increment(1);
                tracing::info!(%operation, %error, "cart operation rejected");

                self.sink
                    .notify(Notification::rejected(operation, item_id, &error));
                Err(error)
            }
        }
    }

    async fn persist(&self, cart: &Cart) {
        if let Err(error) = self.repository.save(cart).await {
            metrics::counter!("cart_persist_failures_total").increment(1);
            tracing::warn!(%error, "failed to persist cart snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::persistence::CART_STORAGE_KEY;
    use crate::services::{InMemoryCatalog, InMemoryStockOracle, RecordingSink};
    use crate::value_objects::{Item, Money, StockRecord};
    use cart_store::InMemorySnapshotStore;
    use std::time::Duration;

    type TestEngine =
        CartEngine<InMemoryCatalog, InMemoryStockOracle, InMemorySnapshotStore, RecordingSink>;

    const A: ItemId = ItemId::new(1);
    const B: ItemId = ItemId::new(2);

    struct Fixture {
        engine: TestEngine,
        catalog: InMemoryCatalog,
        stock: InMemoryStockOracle,
        store: InMemorySnapshotStore,
        sink: RecordingSink,
    }

    fn item(id: ItemId) -> Item {
        Item::new(
            id,
            format!("Sneaker {id}"),
            Money::from_cents(13990),
            format!("https://img/{id}.jpg"),
        )
    }

    fn fixture(stock: &[(ItemId, u32)]) -> Fixture {
        let catalog = InMemoryCatalog::with_items(stock.iter().map(|&(id, _)| item(id)));
        let oracle = InMemoryStockOracle::with_records(
            stock.iter().map(|&(id, amount)| StockRecord::new(id, amount)),
        );
        let store = InMemorySnapshotStore::new();
        let sink = RecordingSink::new();

        Fixture {
            engine: CartEngine::new(catalog.clone(), oracle.clone(), store.clone(), sink.clone()),
            catalog,
            stock: oracle,
            store,
            sink,
        }
    }

    fn amounts(cart: &Cart) -> Vec<(ItemId, u32)> {
        cart.lines()
            .iter()
            .map(|line| (line.id(), line.amount()))
            .collect()
    }

    async fn saved(store: &InMemorySnapshotStore) -> Option<Cart> {
        store
            .get(CART_STORAGE_KEY)
            .await
            .unwrap()
            .map(|snapshot| snapshot.into_state().unwrap())
    }

    #[tokio::test]
    async fn test_add_until_out_of_stock() {
        let f = fixture(&[(A, 5)]);

        let cart = f.engine.add(A).await.unwrap();
        assert_eq!(amounts(&cart), vec![(A, 1)]);
        assert_eq!(saved(&f.store).await, Some(cart));

        for _ in 0..4 {
            f.engine.add(A).await.unwrap();
        }
        assert_eq!(amounts(&f.engine.cart()), vec![(A, 5)]);
        assert_eq!(f.sink.count(), 0);

        let writes = f.store.write_count();
        let err = f.engine.add(A).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::OutOfStock);
        assert_eq!(amounts(&f.engine.cart()), vec![(A, 5)]);
        assert_eq!(f.sink.kinds(), vec![FailureKind::OutOfStock]);
        assert_eq!(f.store.write_count(), writes);
    }

    #[tokio::test]
    async fn test_add_unknown_item_is_not_found() {
        let f = fixture(&[]);

        let err = f.engine.add(A).await.unwrap_err();
        assert_eq!(err, CartError::ItemNotFound { item_id: A });
        assert!(f.engine.cart().is_empty());
        assert_eq!(f.sink.kinds(), vec![FailureKind::NotFound]);
        assert_eq!(f.store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_add_with_catalog_entry_but_no_stock_record() {
        let f = fixture(&[]);
        f.catalog.insert(item(A));

        let err = f.engine.add(A).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::NotFound);
        assert!(f.engine.cart().is_empty());
    }

    #[tokio::test]
    async fn test_add_appends_in_insertion_order() {
        let f = fixture(&[(A, 5), (B, 5)]);

        f.engine.add(B).await.unwrap();
        f.engine.add(A).await.unwrap();
        f.engine.add(B).await.unwrap();

        assert_eq!(amounts(&f.engine.cart()), vec![(B, 2), (A, 1)]);
    }

    #[tokio::test]
    async fn test_stock_is_read_fresh_each_operation() {
        let f = fixture(&[(A, 5)]);
        f.engine.add(A).await.unwrap();
        f.engine.add(A).await.unwrap();

        f.stock.set_available(A, 2);
        assert_eq!(
            f.engine.add(A).await,
            Err(CartError::OutOfStock {
                item_id: A,
                requested: 3,
                available: 2
            })
        );

        f.stock.set_available(A, 3);
        assert_eq!(f.engine.add(A).await.unwrap().amount_of(A), 3);
    }

    #[tokio::test]
    async fn test_remove_then_remove_again() {
        let f = fixture(&[(A, 5), (B, 5)]);
        f.engine.add(A).await.unwrap();
        f.engine.add(B).await.unwrap();

        let cart = f.engine.remove(A).await.unwrap();
        assert_eq!(amounts(&cart), vec![(B, 1)]);
        assert_eq!(saved(&f.store).await, Some(cart.clone()));

        let writes = f.store.write_count();
        assert_eq!(
            f.engine.remove(A).await,
            Err(CartError::LineNotFound { item_id: A })
        );
        assert_eq!(f.engine.cart(), cart);
        assert_eq!(f.sink.kinds(), vec![FailureKind::NotFound]);
        assert_eq!(f.store.write_count(), writes);
    }

    #[tokio::test]
    async fn test_remove_needs_no_lookups() {
        let f = fixture(&[(A, 5)]);
        f.engine.add(A).await.unwrap();
        let lookups = f.stock.lookup_count();

        f.engine.remove(A).await.unwrap();
        assert_eq!(f.stock.lookup_count(), lookups);
    }

    #[tokio::test]
    async fn test_set_amount_replaces_exactly() {
        let f = fixture(&[(A, 10)]);
        f.engine.add(A).await.unwrap();
        f.engine.add(A).await.unwrap();

        let cart = f.engine.set_amount(A, 4).await.unwrap();
        assert_eq!(amounts(&cart), vec![(A, 4)]);
        assert_eq!(saved(&f.store).await, Some(cart));
    }

    #[tokio::test]
    async fn test_set_amount_zero_skips_stock_lookup() {
        let f = fixture(&[(A, 3)]);
        f.engine.add(A).await.unwrap();
        f.engine.add(A).await.unwrap();
        let lookups = f.stock.lookup_count();

        let err = f.engine.set_amount(A, 0).await.unwrap_err();
        assert_eq!(
            err,
            CartError::InvalidAmount {
                amount: RequestedAmount::Whole(0)
            }
        );
        assert_eq!(f.stock.lookup_count(), lookups);
        assert_eq!(amounts(&f.engine.cart()), vec![(A, 2)]);
        assert_eq!(f.sink.kinds(), vec![FailureKind::InvalidAmount]);
    }

    #[tokio::test]
    async fn test_set_amount_negative_is_invalid() {
        let f = fixture(&[(A, 3)]);
        f.engine.add(A).await.unwrap();

        let err = f.engine.set_amount(A, -2).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidAmount);
    }

    #[tokio::test]
    async fn test_set_amount_above_stock() {
        let f = fixture(&[(A, 3)]);
        f.engine.add(A).await.unwrap();

        let err = f.engine.set_amount(A, 4).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::OutOfStock);
        assert_eq!(f.engine.cart().amount_of(A), 1);
    }

    #[tokio::test]
    async fn test_set_amount_never_inserts() {
        let f = fixture(&[(A, 3)]);

        let err = f.engine.set_amount(A, 2).await.unwrap_err();
        assert_eq!(err, CartError::LineNotFound { item_id: A });
        assert!(f.engine.cart().is_empty());
        assert_eq!(f.store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_set_amount_malformed_is_invalid_and_notified() {
        let f = fixture(&[(A, 3)]);
        f.engine.add(A).await.unwrap();
        let lookups = f.stock.lookup_count();

        let err = f
            .engine
            .set_requested_amount(A, serde_json::json!(1.5).into())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CartError::InvalidAmount {
                amount: RequestedAmount::Malformed("1.5".to_string())
            }
        );
        assert_eq!(f.stock.lookup_count(), lookups);
        assert_eq!(f.engine.cart().amount_of(A), 1);
        assert_eq!(f.sink.kinds(), vec![FailureKind::InvalidAmount]);
        assert_eq!(f.store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_set_amount_with_no_stock_record_is_not_found() {
        let f = fixture(&[(A, 3)]);
        f.engine.add(A).await.unwrap();
        f.stock.remove(A);
        let writes = f.store.write_count();

        let err = f.engine.set_amount(A, 2).await.unwrap_err();
        assert_eq!(err, CartError::ItemNotFound { item_id: A });
        assert_eq!(f.engine.cart().amount_of(A), 1);
        assert_eq!(f.sink.kinds(), vec![FailureKind::NotFound]);
        assert_eq!(f.store.write_count(), writes);
    }

    #[tokio::test]
    async fn test_abandoned_add_still_commits_and_persists() {
        let f = fixture(&[(A, 3)]);
        f.store.set_put_latency(Duration::from_millis(100));

        let abandoned = tokio::time::timeout(Duration::from_millis(30), f.engine.add(A)).await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(f.engine.cart().amount_of(A), 1);
        assert_eq!(saved(&f.store).await, Some(f.engine.cart()));
        assert_eq!(f.store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_oracle_rejects_without_changes() {
        let f = fixture(&[(A, 3)]);
        f.engine.add(A).await.unwrap();
        f.stock.set_unavailable(true);

        let err = f.engine.add(A).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Unavailable);
        assert_eq!(f.engine.cart().amount_of(A), 1);
        assert_eq!(f.sink.notifications()[0].message, "Could not add item to cart");
    }

    #[tokio::test]
    async fn test_persist_failure_does_not_fail_operation() {
        let f = fixture(&[(A, 3)]);
        f.store.set_fail_on_put(true);

        let cart = f.engine.add(A).await.unwrap();
        assert_eq!(f.engine.cart(), cart);
        assert_eq!(f.sink.count(), 0);
        assert!(saved(&f.store).await.is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_commits_only() {
        let f = fixture(&[(A, 1)]);
        let mut updates = f.engine.subscribe();

        f.engine.add(A).await.unwrap();
        assert!(updates.has_changed().unwrap());
        assert_eq!(updates.borrow_and_update().amount_of(A), 1);

        f.engine.add(A).await.unwrap_err();
        assert!(!updates.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_restore_from_snapshot() {
        let f = fixture(&[(A, 5), (B, 5)]);
        f.engine.add(B).await.unwrap();
        f.engine.add(A).await.unwrap();
        f.engine.add(A).await.unwrap();
        let committed = f.engine.cart();

        let restored: TestEngine =
            CartEngine::restore(f.catalog, f.stock, f.store, RecordingSink::new()).await;
        assert_eq!(restored.cart(), committed);
    }

    #[tokio::test]
    async fn test_restore_corrupt_snapshot_starts_empty() {
        let store = InMemorySnapshotStore::new();
        store
            .put(cart_store::Snapshot::new(
                CART_STORAGE_KEY,
                serde_json::json!("garbage"),
            ))
            .await
            .unwrap();

        let engine: TestEngine = CartEngine::restore(
            InMemoryCatalog::new(),
            InMemoryStockOracle::new(),
            store,
            RecordingSink::new(),
        )
        .await;
        assert!(engine.cart().is_empty());
    }
}
