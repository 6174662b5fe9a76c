pub mod feed_item;
pub mod health;

pub use feed_item::feed_item;
pub use health::{VERSION_HEADER, ping};
