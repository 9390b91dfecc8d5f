//! Shared access to one [`Config`] from several threads.

use std::sync::Arc;

use cfgtree_core::{ConfigResult, Tree};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::config::Config;

/// One writer, many readers.
///
/// Cloning shares the same document. Readers that only need a stable view
/// can take a [`snapshot`](Self::snapshot) and drop the lock right away.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<Config>>,
}

impl SharedConfig {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Config> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Config> {
        self.inner.write()
    }

    /// Copy of the current tree, detached from later changes.
    pub fn snapshot(&self) -> Arc<Tree> {
        Arc::new(self.inner.read().tree().clone())
    }

    /// Runs `f` under the write lock.
    pub fn update<R>(&self, f: impl FnOnce(&mut Config) -> ConfigResult<R>) -> ConfigResult<R> {
        let mut guard = self.inner.write();
        f(&mut guard)
    }

    /// Re-reads the document from `text`. On failure readers keep seeing
    /// the previous tree.
    pub fn reload(&self, text: &str) -> ConfigResult<()> {
        self.update(|config| config.read_string(text))?;
        debug!("Shared configuration reloaded");
        Ok(())
    }
}

impl From<Config> for SharedConfig {
    fn from(config: Config) -> Self {
        Self::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgtree_core::{ConfigError, Lookup};

    #[test]
    fn test_snapshot_is_detached() {
        let shared = SharedConfig::new(Config::parse("n = 1;").unwrap());
        let before = shared.snapshot();
        shared.update(|config| config.set("n", 2_i64)).unwrap();

        assert_eq!(before.lookup_int("n"), Ok(1));
        assert_eq!(shared.read().lookup_int("n"), Ok(2));
    }

    #[test]
    fn test_failed_reload_keeps_tree() {
        let shared = SharedConfig::new(Config::parse("n = 1;").unwrap());
        assert!(matches!(
            shared.reload("n = ;"),
            Err(ConfigError::Syntax { .. })
        ));
        assert_eq!(shared.read().lookup_int("n"), Ok(1));
        shared.reload("n = 3;").unwrap();
        assert_eq!(shared.read().lookup_int("n"), Ok(3));
    }

    #[test]
    fn test_concurrent_readers() {
        let shared = SharedConfig::new(Config::parse("items = [1, 2, 3];").unwrap());
        let total: i64 = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..3)
                .map(|i| {
                    let shared = shared.clone();
                    scope.spawn(move || shared.read().lookup_int(&format!("items.[{i}]")).unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(total, 6);
    }
}
