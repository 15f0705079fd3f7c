//! DHCP lease storage.
//!
//! Holds the static and dynamic leases the [DHCP facade][crate::dhcp] manages. Two
//! implementations are provided, [`memory::InMemoryLeaseStore`] and [`file::FileLeaseStore`]. The
//! former is not durable across restarts. The latter writes its state to disk for each update
//! and loads this state again on startup.

use crate::dhcp::Lease;
use crate::error::Error;

pub mod file;
pub mod memory;

#[allow(clippy::module_name_repetitions)]
pub use file::FileLeaseStore;
#[allow(clippy::module_name_repetitions)]
pub use memory::InMemoryLeaseStore;

/// `DynLeaseStore` is a boxed [`LeaseStore`] owned by the [`DhcpServer`][crate::dhcp::DhcpServer].
#[allow(clippy::module_name_repetitions)]
pub type DynLeaseStore = Box<dyn LeaseStore + Send + Sync>;

/// An async trait describing storage of DHCP leases.
///
/// The store doesn't interpret leases; validation happens in the
/// [`DhcpServer`][crate::dhcp::DhcpServer] before the new set is handed over.
#[async_trait::async_trait]
pub trait LeaseStore {
    /// All stored leases, static and dynamic, in the order they were stored.
    async fn leases(&self) -> Vec<Lease>;

    /// Replace the stored leases.
    async fn set_leases(&mut self, leases: Vec<Lease>) -> Result<(), Error>;

    /// Forget all leases, removing any state kept outside of memory.
    async fn reset(&mut self) -> Result<(), Error>;
}
