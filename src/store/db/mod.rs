mod mem;
mod postgres;

pub use mem::MemStore;
pub use postgres::PostgresStore;
