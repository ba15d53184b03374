//! Infrastructure layer - database, migrations and transactions.

mod db;
pub mod migrations;
mod unit_of_work;

pub use db::Database;
pub use migrations::Migrator;
pub use unit_of_work::{Persistence, TransactionContext, TxCouponRepository, UnitOfWork};
