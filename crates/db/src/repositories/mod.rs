pub mod entry_request_repo;

pub use entry_request_repo::EntryRequestRepo;
