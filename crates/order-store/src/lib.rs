pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::{OrderId, OwnerId};
pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, OrderPage, OrderQuery, OwnerTotals};
pub use store::{OrderStore, OrderStoreExt, StatusChange};
