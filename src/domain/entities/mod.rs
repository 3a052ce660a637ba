pub mod acquisition;
pub mod job_outcome;
pub mod job_run;
pub mod lock_name;
pub mod retry_policy;

pub use acquisition::*;
pub use job_outcome::*;
pub use job_run::*;
pub use lock_name::*;
pub use retry_policy::*;
