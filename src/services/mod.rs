pub mod auth;
pub mod cache;
pub mod events;
pub mod folder;
pub mod qtree;
pub mod work;

pub use auth::*;
pub use cache::CollectionCache;
pub use events::*;
pub use folder::*;
pub use qtree::*;
pub use work::*;
