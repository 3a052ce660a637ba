pub mod lock_store;
pub mod run_log;
pub mod time_service;

pub use lock_store::LockStore;
pub use run_log::RunLog;
pub use time_service::TimeService;
