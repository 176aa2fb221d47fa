//! Family to invoker mapping

use brieflens_core::{Family, Provider};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One invoker per backend family
#[derive(Clone, Default)]
pub struct InvokerSet {
    invokers: HashMap<Family, Arc<dyn Provider>>,
}

impl InvokerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an invoker under the family it reports, replacing any previous one
    pub fn with(mut self, invoker: Arc<dyn Provider>) -> Self {
        self.insert(invoker);
        self
    }

    pub fn insert(&mut self, invoker: Arc<dyn Provider>) {
        self.invokers.insert(invoker.family(), invoker);
    }

    pub fn get(&self, family: Family) -> Option<&Arc<dyn Provider>> {
        self.invokers.get(&family)
    }

    pub fn contains(&self, family: Family) -> bool {
        self.invokers.contains_key(&family)
    }
}

impl fmt::Debug for InvokerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut families: Vec<&str> = self.invokers.keys().map(|f| f.as_str()).collect();
        families.sort_unstable();
        f.debug_struct("InvokerSet").field("families", &families).finish()
    }
}
