pub mod entry_request;

pub use entry_request::{EntryRequest, StatusView};
