//! Ledger reconciliation against provider wallets.
//!
//! - [`resolver`]: walks the partner hierarchy to the root credential
//! - [`reconciler`]: guard, wallet query and ledger write, run as a task

pub mod reconciler;
pub mod resolver;

pub use reconciler::{ReconcileOutcome, ReconcileRequest, Reconciler};
pub use resolver::CredentialResolver;
