use std::sync::Arc;

use libris_billing::Billing;
use libris_ledger::{Catalog, LoanLedger, OverdueSweep};
use libris_store::Datastore;

use crate::auth::AuthProvider;

/// Services shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Datastore>,
    pub auth: Arc<dyn AuthProvider>,
    pub catalog: Catalog,
    pub loans: LoanLedger,
    pub sweep: OverdueSweep,
    pub billing: Billing,
}
