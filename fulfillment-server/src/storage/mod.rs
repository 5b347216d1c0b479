//! redb-based storage for orders, vouchers, loyalty and shipments
//!
//! All values are JSON-encoded. Mutations take an explicit
//! [`WriteTransaction`] so that a business operation (order creation with a
//! voucher debit, payment confirmation with a points credit) commits or
//! aborts as a single unit. redb write transactions are serializable, which
//! is what the voucher select-then-update sequence relies on.

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use shared::models::{
    LoyaltyAccount, Order, OrderStatusHistory, PointTransaction, Shipment, ShipmentStatus,
    ShipmentTrackingEvent, Voucher,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Orders table: key = order_number, value = JSON
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Order status history: (order_number, seq) -> JSON, append-only
const ORDER_HISTORY_TABLE: TableDefinition<(&str, u64), &[u8]> =
    TableDefinition::new("order_history");

/// Vouchers table: key = voucher code, value = JSON
const VOUCHERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("vouchers");

/// FIFO index: (user_id, created_at, code) -> ()
const USER_VOUCHERS_TABLE: TableDefinition<(&str, i64, &str), ()> =
    TableDefinition::new("user_vouchers");

/// Loyalty accounts table: key = user_id, value = JSON
const LOYALTY_ACCOUNTS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("loyalty_accounts");

/// Point transactions: (user_id, seq) -> JSON, append-only
const POINT_TRANSACTIONS_TABLE: TableDefinition<(&str, u64), &[u8]> =
    TableDefinition::new("point_transactions");

/// Orders that already received their points credit: order_number -> ()
const CREDITED_ORDERS_TABLE: TableDefinition<&str, ()> = TableDefinition::new("credited_orders");

/// Shipments table: key = shipment_id, value = JSON
const SHIPMENTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("shipments");

/// One-to-one index: order_number -> shipment_id
const ORDER_SHIPMENT_TABLE: TableDefinition<&str, &str> = TableDefinition::new("order_shipment");

/// Tracking events: (shipment_id, event_date, description) -> JSON.
/// The key doubles as the dedup check.
const TRACKING_EVENTS_TABLE: TableDefinition<(&str, i64, &str), &[u8]> =
    TableDefinition::new("tracking_events");

/// Monotonic counters (order numbers, per-entity sequences)
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Voucher not found: {0}")]
    VoucherNotFound(String),

    #[error("Shipment not found: {0}")]
    ShipmentNotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for shared::AppError {
    fn from(e: StorageError) -> Self {
        use shared::{AppError, ErrorCode};
        let msg = e.to_string();
        match e {
            StorageError::OrderNotFound(_) => {
                AppError::with_message(ErrorCode::OrderNotFound, msg)
            }
            StorageError::VoucherNotFound(_) => {
                AppError::with_message(ErrorCode::VoucherNotFound, msg)
            }
            StorageError::ShipmentNotFound(_) => {
                AppError::with_message(ErrorCode::ShipmentNotFound, msg)
            }
            _ => AppError::database(msg),
        }
    }
}

/// Fulfillment storage
#[derive(Clone)]
pub struct Storage {
    db: Arc<Database>,
}

impl Storage {
    /// Open or create the database at `path`
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db =
            Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    fn init_tables(db: &Database) -> StorageResult<()> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_HISTORY_TABLE)?;
            let _ = write_txn.open_table(VOUCHERS_TABLE)?;
            let _ = write_txn.open_table(USER_VOUCHERS_TABLE)?;
            let _ = write_txn.open_table(LOYALTY_ACCOUNTS_TABLE)?;
            let _ = write_txn.open_table(POINT_TRANSACTIONS_TABLE)?;
            let _ = write_txn.open_table(CREDITED_ORDERS_TABLE)?;
            let _ = write_txn.open_table(SHIPMENTS_TABLE)?;
            let _ = write_txn.open_table(ORDER_SHIPMENT_TABLE)?;
            let _ = write_txn.open_table(TRACKING_EVENTS_TABLE)?;
            let _ = write_txn.open_table(COUNTERS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Counters ==========

    /// Increment and return the named counter (starts at 1)
    pub fn next_counter(&self, txn: &WriteTransaction, name: &str) -> StorageResult<u64> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let next = table.get(name)?.map(|v| v.value()).unwrap_or(0) + 1;
        table.insert(name, next)?;
        Ok(next)
    }

    // ========== Orders ==========

    /// Insert or overwrite an order
    pub fn put_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.order_number.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get an order by number
    pub fn get_order(&self, order_number: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_number)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Get an order inside a write transaction (read-modify-write)
    pub fn get_order_for_update(
        &self,
        txn: &WriteTransaction,
        order_number: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_number)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Append one status history entry (per-order sequence)
    pub fn append_history(
        &self,
        txn: &WriteTransaction,
        entry: &OrderStatusHistory,
    ) -> StorageResult<()> {
        let seq = self.next_counter(txn, &format!("history:{}", entry.order_number))?;
        let mut table = txn.open_table(ORDER_HISTORY_TABLE)?;
        let value = serde_json::to_vec(entry)?;
        table.insert((entry.order_number.as_str(), seq), value.as_slice())?;
        Ok(())
    }

    /// Status history for an order, in append order
    pub fn get_history(&self, order_number: &str) -> StorageResult<Vec<OrderStatusHistory>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDER_HISTORY_TABLE)?;

        let mut entries = Vec::new();
        let range_start: (&str, u64) = (order_number, 0);
        let range_end: (&str, u64) = (order_number, u64::MAX);
        for result in table.range(range_start..=range_end)? {
            let (_, guard) = result?;
            entries.push(serde_json::from_slice(guard.value())?);
        }
        Ok(entries)
    }

    // ========== Vouchers ==========

    /// Insert a new voucher and its FIFO index entry
    pub fn insert_voucher(&self, txn: &WriteTransaction, voucher: &Voucher) -> StorageResult<()> {
        let mut table = txn.open_table(VOUCHERS_TABLE)?;
        let value = serde_json::to_vec(voucher)?;
        table.insert(voucher.code.as_str(), value.as_slice())?;

        if let Some(user_id) = &voucher.user_id {
            let mut idx = txn.open_table(USER_VOUCHERS_TABLE)?;
            idx.insert((user_id.as_str(), voucher.created_at, voucher.code.as_str()), ())?;
        }
        Ok(())
    }

    /// Overwrite an existing voucher (balances/active flag changed).
    /// The FIFO index key is immutable, so no index update.
    pub fn update_voucher(&self, txn: &WriteTransaction, voucher: &Voucher) -> StorageResult<()> {
        let mut table = txn.open_table(VOUCHERS_TABLE)?;
        let value = serde_json::to_vec(voucher)?;
        table.insert(voucher.code.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a voucher by code
    pub fn get_voucher(&self, code: &str) -> StorageResult<Option<Voucher>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(VOUCHERS_TABLE)?;
        match table.get(code)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// A user's vouchers in FIFO order (oldest `created_at` first), read
    /// inside the write transaction so the debit sees a stable snapshot
    pub fn user_vouchers_fifo(
        &self,
        txn: &WriteTransaction,
        user_id: &str,
    ) -> StorageResult<Vec<Voucher>> {
        let idx = txn.open_table(USER_VOUCHERS_TABLE)?;
        let table = txn.open_table(VOUCHERS_TABLE)?;

        let mut vouchers = Vec::new();
        let range_start: (&str, i64, &str) = (user_id, i64::MIN, "");
        let range_end: (&str, i64, &str) = (user_id, i64::MAX, "\u{ffff}");
        for result in idx.range(range_start..=range_end)? {
            let (key, _) = result?;
            let (_, _, code) = key.value();
            if let Some(guard) = table.get(code)? {
                vouchers.push(serde_json::from_slice(guard.value())?);
            }
        }
        Ok(vouchers)
    }

    /// A user's vouchers in FIFO order (read-only)
    pub fn get_user_vouchers(&self, user_id: &str) -> StorageResult<Vec<Voucher>> {
        let read_txn = self.db.begin_read()?;
        let idx = read_txn.open_table(USER_VOUCHERS_TABLE)?;
        let table = read_txn.open_table(VOUCHERS_TABLE)?;

        let mut vouchers = Vec::new();
        let range_start: (&str, i64, &str) = (user_id, i64::MIN, "");
        let range_end: (&str, i64, &str) = (user_id, i64::MAX, "\u{ffff}");
        for result in idx.range(range_start..=range_end)? {
            let (key, _) = result?;
            let (_, _, code) = key.value();
            if let Some(guard) = table.get(code)? {
                vouchers.push(serde_json::from_slice(guard.value())?);
            }
        }
        Ok(vouchers)
    }

    // ========== Loyalty ==========

    /// Get a loyalty account (read-only)
    pub fn get_loyalty_account(&self, user_id: &str) -> StorageResult<Option<LoyaltyAccount>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LOYALTY_ACCOUNTS_TABLE)?;
        match table.get(user_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Get a loyalty account inside a write transaction
    pub fn get_loyalty_account_for_update(
        &self,
        txn: &WriteTransaction,
        user_id: &str,
    ) -> StorageResult<Option<LoyaltyAccount>> {
        let table = txn.open_table(LOYALTY_ACCOUNTS_TABLE)?;
        match table.get(user_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Insert or overwrite a loyalty account
    pub fn put_loyalty_account(
        &self,
        txn: &WriteTransaction,
        account: &LoyaltyAccount,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(LOYALTY_ACCOUNTS_TABLE)?;
        let value = serde_json::to_vec(account)?;
        table.insert(account.user_id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Append one point transaction (per-user sequence)
    pub fn append_point_transaction(
        &self,
        txn: &WriteTransaction,
        tx: &PointTransaction,
    ) -> StorageResult<()> {
        let seq = self.next_counter(txn, &format!("points:{}", tx.user_id))?;
        let mut table = txn.open_table(POINT_TRANSACTIONS_TABLE)?;
        let value = serde_json::to_vec(tx)?;
        table.insert((tx.user_id.as_str(), seq), value.as_slice())?;
        Ok(())
    }

    /// Point transaction log for a user, in append order
    pub fn get_point_transactions(&self, user_id: &str) -> StorageResult<Vec<PointTransaction>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(POINT_TRANSACTIONS_TABLE)?;

        let mut txs = Vec::new();
        let range_start: (&str, u64) = (user_id, 0);
        let range_end: (&str, u64) = (user_id, u64::MAX);
        for result in table.range(range_start..=range_end)? {
            let (_, guard) = result?;
            txs.push(serde_json::from_slice(guard.value())?);
        }
        Ok(txs)
    }

    /// Record that an order received its points credit.
    /// Returns false if the order was already recorded.
    pub fn mark_order_credited(
        &self,
        txn: &WriteTransaction,
        order_number: &str,
    ) -> StorageResult<bool> {
        let mut table = txn.open_table(CREDITED_ORDERS_TABLE)?;
        if table.get(order_number)?.is_some() {
            return Ok(false);
        }
        table.insert(order_number, ())?;
        Ok(true)
    }

    // ========== Shipments ==========

    /// Insert a shipment and its order index entry
    pub fn insert_shipment(
        &self,
        txn: &WriteTransaction,
        shipment: &Shipment,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(SHIPMENTS_TABLE)?;
        let value = serde_json::to_vec(shipment)?;
        table.insert(shipment.id.as_str(), value.as_slice())?;

        let mut idx = txn.open_table(ORDER_SHIPMENT_TABLE)?;
        idx.insert(shipment.order_number.as_str(), shipment.id.as_str())?;
        Ok(())
    }

    /// Overwrite an existing shipment
    pub fn update_shipment(
        &self,
        txn: &WriteTransaction,
        shipment: &Shipment,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(SHIPMENTS_TABLE)?;
        let value = serde_json::to_vec(shipment)?;
        table.insert(shipment.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a shipment by ID
    pub fn get_shipment(&self, id: &str) -> StorageResult<Option<Shipment>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SHIPMENTS_TABLE)?;
        match table.get(id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Get the shipment for an order, if any
    pub fn get_shipment_by_order(&self, order_number: &str) -> StorageResult<Option<Shipment>> {
        let read_txn = self.db.begin_read()?;
        let idx = read_txn.open_table(ORDER_SHIPMENT_TABLE)?;
        let id = match idx.get(order_number)? {
            Some(guard) => guard.value().to_string(),
            None => return Ok(None),
        };
        let table = read_txn.open_table(SHIPMENTS_TABLE)?;
        match table.get(id.as_str())? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Whether an order already has a shipment, checked inside the write
    /// transaction that would insert the new one
    pub fn order_has_shipment(
        &self,
        txn: &WriteTransaction,
        order_number: &str,
    ) -> StorageResult<bool> {
        let idx = txn.open_table(ORDER_SHIPMENT_TABLE)?;
        Ok(idx.get(order_number)?.is_some())
    }

    /// All shipments not yet delivered (batch sync candidates)
    pub fn non_terminal_shipments(&self) -> StorageResult<Vec<Shipment>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SHIPMENTS_TABLE)?;

        let mut shipments: Vec<Shipment> = Vec::new();
        for result in table.iter()? {
            let (_, guard) = result?;
            let shipment: Shipment = serde_json::from_slice(guard.value())?;
            if shipment.status != ShipmentStatus::Delivered {
                shipments.push(shipment);
            }
        }
        shipments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(shipments)
    }

    /// Insert a tracking event unless its dedup key already exists.
    /// Returns true when the event is new.
    pub fn insert_tracking_event(
        &self,
        txn: &WriteTransaction,
        event: &ShipmentTrackingEvent,
    ) -> StorageResult<bool> {
        let mut table = txn.open_table(TRACKING_EVENTS_TABLE)?;
        let key = (
            event.shipment_id.as_str(),
            event.event_date,
            event.description.as_str(),
        );
        if table.get(key)?.is_some() {
            return Ok(false);
        }
        let value = serde_json::to_vec(event)?;
        table.insert(key, value.as_slice())?;
        Ok(true)
    }

    /// Tracking events for a shipment, ordered by event date
    pub fn get_tracking_events(
        &self,
        shipment_id: &str,
    ) -> StorageResult<Vec<ShipmentTrackingEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TRACKING_EVENTS_TABLE)?;

        let mut events = Vec::new();
        let range_start: (&str, i64, &str) = (shipment_id, i64::MIN, "");
        let range_end: (&str, i64, &str) = (shipment_id, i64::MAX, "\u{ffff}");
        for result in table.range(range_start..=range_end)? {
            let (_, guard) = result?;
            events.push(serde_json::from_slice(guard.value())?);
        }
        Ok(events)
    }
}
