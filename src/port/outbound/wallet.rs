//! External provider wallet port.
//!
//! The provider wire format and request signing are adapter concerns; the
//! application only sees a balance or an [`ExternalWalletError`].

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::ProviderCredential;
use crate::error::ExternalWalletError;

#[async_trait]
pub trait WalletClient: Send + Sync {
    /// Authoritative balance of `external_username` at the provider.
    async fn balance(
        &self,
        credential: &ProviderCredential,
        external_username: &str,
    ) -> Result<Decimal, ExternalWalletError>;
}

/// Reject values a provider should never report.
///
/// # Errors
/// Returns [`ExternalWalletError::Malformed`] for negative balances.
pub fn validate_balance(balance: Decimal) -> Result<Decimal, ExternalWalletError> {
    if balance < Decimal::ZERO {
        return Err(ExternalWalletError::Malformed(format!(
            "negative balance {balance}"
        )));
    }
    Ok(balance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn negative_balances_are_malformed() {
        assert!(validate_balance(dec!(-0.01)).is_err());
        assert_eq!(validate_balance(dec!(0)).unwrap(), dec!(0));
        assert_eq!(validate_balance(dec!(12.50)).unwrap(), dec!(12.50));
    }
}
