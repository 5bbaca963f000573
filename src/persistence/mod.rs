pub mod ipc;
pub mod memory;

pub use ipc::IpcPolicyStore;
pub use memory::MemoryPolicyStore;

use crate::engines::policy::Policy;
use crate::error::Result;

/// Durable home of checkpointed policies, keyed by symbol and architecture signature.
///
/// `load` returns `Ok(None)` when nothing is stored under the key. A stored policy whose
/// shapes disagree with its recorded architecture is an error, never a partial policy.
pub trait PolicyStore: Send + Sync {
    fn save(&self, symbol: &str, signature: &str, policy: &Policy) -> Result<()>;
    fn load(&self, symbol: &str, signature: &str) -> Result<Option<Policy>>;
}

impl<S: PolicyStore + ?Sized> PolicyStore for std::sync::Arc<S> {
    fn save(&self, symbol: &str, signature: &str, policy: &Policy) -> Result<()> {
        (**self).save(symbol, signature, policy)
    }

    fn load(&self, symbol: &str, signature: &str) -> Result<Option<Policy>> {
        (**self).load(symbol, signature)
    }
}
