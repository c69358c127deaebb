pub mod category;
pub mod item;

pub use category::Category;
pub use item::{host_of, NewsItem, ERROR_HOST, UNKNOWN_HOST};
