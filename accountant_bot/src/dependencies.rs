use std::sync::Arc;

use accountant_core::{cache::BalanceCache, refresh::ServerDataManager};

#[derive(Clone)]
pub struct BotDependencies {
    pub manager: Arc<ServerDataManager>,
    pub cache: Arc<BalanceCache>,
}

impl BotDependencies {
    pub fn new(manager: Arc<ServerDataManager>) -> Self {
        let cache = manager.cache();
        Self { manager, cache }
    }
}
