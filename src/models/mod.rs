// Re-export all model types
pub use self::cart::*;
pub use self::customer::*;
pub use self::enums::*;
pub use self::errors::*;
pub use self::order::*;
pub use self::product::*;
pub use self::seller::*;
pub use self::session::*;

mod cart;
mod customer;
mod enums;
mod errors;
mod order;
mod product;
mod seller;
mod session;
