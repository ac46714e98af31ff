//! PostgreSQL 持久化实现

mod postgres_reservation_repository;
mod postgres_salon_repository;
mod postgres_user_repository;
pub mod schema;

pub use postgres_reservation_repository::PostgresReservationRepository;
pub use postgres_salon_repository::PostgresSalonRepository;
pub use postgres_user_repository::PostgresUserRepository;
