use crate::dhcp::Lease;
use crate::error::Error;
use crate::lease_store::LeaseStore;
use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct InMemoryLeaseStore {
    leases: Vec<Lease>,
}

#[async_trait::async_trait]
impl LeaseStore for InMemoryLeaseStore {
    async fn leases(&self) -> Vec<Lease> {
        self.leases.clone()
    }

    async fn set_leases(&mut self, leases: Vec<Lease>) -> Result<(), Error> {
        self.leases = leases;
        Ok(())
    }

    async fn reset(&mut self) -> Result<(), Error> {
        self.leases.clear();
        Ok(())
    }
}
