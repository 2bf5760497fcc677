pub mod accounts;

pub use accounts::{AccountState, AccountStore};
