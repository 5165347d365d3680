pub mod config_ops;
pub mod index_ops;
pub mod query_ops;
