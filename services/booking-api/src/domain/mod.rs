//! 领域层

pub mod email;
pub mod repositories;
pub mod reservation;
pub mod salon;
pub mod user;

pub use email::Email;
pub use repositories::*;
pub use reservation::*;
pub use salon::*;
pub use user::*;
