use super::PolicyStore;
use crate::engines::policy::Policy;
use crate::error::Result;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-process store, for tests and for runs that must not touch disk.
#[derive(Default)]
pub struct MemoryPolicyStore {
    data: Mutex<HashMap<(String, String), Policy>>,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PolicyStore for MemoryPolicyStore {
    fn save(&self, symbol: &str, signature: &str, policy: &Policy) -> Result<()> {
        let mut data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        data.insert((symbol.to_string(), signature.to_string()), policy.clone());
        Ok(())
    }

    fn load(&self, symbol: &str, signature: &str) -> Result<Option<Policy>> {
        let data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        Ok(data.get(&(symbol.to_string(), signature.to_string())).cloned())
    }
}
