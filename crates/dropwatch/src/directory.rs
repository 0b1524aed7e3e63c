//! [`StaticDirectory`]: accounts listed in the configuration file.

use std::convert::Infallible;

use dropwatch_core::{account::Account, source::AccountDirectory};

/// A fixed account list. Has no change notification.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
  accounts: Vec<Account>,
}

impl StaticDirectory {
  pub fn new(accounts: Vec<Account>) -> Self { Self { accounts } }
}

impl AccountDirectory for StaticDirectory {
  type Error = Infallible;

  async fn resolve(&self) -> Result<Vec<Account>, Infallible> {
    Ok(self.accounts.clone())
  }
}
