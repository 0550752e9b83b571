pub mod client;
#[cfg(test)]
pub mod fake;
pub mod gateway;
pub mod item;
pub mod lenient;
pub mod upstream;

pub use client::ArchiveClient;
pub use gateway::{ArchiveError, MetadataGateway, Result};
pub use item::{File, Item, MediaType};
