pub mod job_lock_coordinator;

pub use job_lock_coordinator::JobLockCoordinator;
