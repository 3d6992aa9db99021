pub mod entry_request;
