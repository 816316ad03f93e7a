//! Storage ports and their adapters.

pub mod memory;
pub mod ports;
#[cfg(feature = "database")]
pub mod postgres;

pub use memory::InMemoryDatabase;
pub use ports::{PostsRepository, UsersRepository};
#[cfg(feature = "database")]
pub use postgres::PostgresDatabase;
