//! 应用层

pub mod auth_service;
pub mod notifier;
pub mod payment_service;
pub mod reservation_service;
pub mod salon_service;

pub use auth_service::*;
pub use notifier::*;
pub use payment_service::*;
pub use reservation_service::*;
pub use salon_service::*;
