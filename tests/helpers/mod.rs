#![allow(dead_code)]
pub mod fake_supabase;
pub mod stores;

#[allow(unused_imports)]
pub use fake_supabase::*;
#[allow(unused_imports)]
pub use stores::*;
