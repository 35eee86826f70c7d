//! Context and key lifecycle

use crate::environment::Environment;
use crate::error::{FacadeError, FacadeResult};
use crate::persist;
use hefacade_engine::HeEngine;
use hefacade_params::{
    ChainLengthEstimator, HeuristicChainLength, ResolvedParameters, SecurityParameters,
};
use std::path::Path;
use std::sync::Arc;

/// Owns the active [`Environment`], if any.
///
/// Starts uninitialized; `generate` or `restore` make it ready. Both build the
/// replacement first and install it only on success, so a failed call leaves
/// the previous environment in place.
pub struct KeyManager<E: HeEngine> {
    engine: Arc<E>,
    estimator: Arc<dyn ChainLengthEstimator>,
    environment: Option<Environment<E>>,
}

impl<E: HeEngine> KeyManager<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self::with_estimator(engine, Arc::new(HeuristicChainLength::default()))
    }

    pub fn with_estimator(engine: Arc<E>, estimator: Arc<dyn ChainLengthEstimator>) -> Self {
        Self {
            engine,
            estimator,
            environment: None,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Uninitialized manager sharing this one's engine and estimator
    pub fn detached(&self) -> Self {
        Self::with_estimator(Arc::clone(&self.engine), Arc::clone(&self.estimator))
    }

    pub fn is_ready(&self) -> bool {
        self.environment.is_some()
    }

    /// Build an environment from `params` without installing it
    pub fn build(&self, params: &SecurityParameters) -> FacadeResult<Environment<E>> {
        Ok(Environment::generate(&*self.engine, params, &*self.estimator)?)
    }

    /// Read a persisted environment without installing it
    pub fn load(&self, path: impl AsRef<Path>) -> FacadeResult<Environment<E>> {
        Ok(persist::load(&*self.engine, path.as_ref())?)
    }

    pub fn generate(&mut self, params: &SecurityParameters) -> FacadeResult<()> {
        let environment = self.build(params)?;
        self.install(environment);
        Ok(())
    }

    pub fn persist(&self, path: impl AsRef<Path>) -> FacadeResult<()> {
        persist::save(&*self.engine, self.environment()?, path.as_ref())?;
        Ok(())
    }

    pub fn restore(&mut self, path: impl AsRef<Path>) -> FacadeResult<()> {
        let environment = self.load(path)?;
        self.install(environment);
        Ok(())
    }

    /// Swap in a new environment, returning the previous one
    pub fn install(&mut self, environment: Environment<E>) -> Option<Environment<E>> {
        self.environment.replace(environment)
    }

    pub fn environment(&self) -> FacadeResult<&Environment<E>> {
        self.environment.as_ref().ok_or(FacadeError::NotReady)
    }

    pub fn slot_count(&self) -> FacadeResult<usize> {
        Ok(self.environment()?.slot_count(&self.engine))
    }

    pub fn parameters(&self) -> FacadeResult<&ResolvedParameters> {
        Ok(self.environment()?.parameters())
    }

    pub fn chain_length(&self) -> FacadeResult<u64> {
        Ok(self.environment()?.chain_length(&self.engine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hefacade_engine::MockEngine;
    use tempfile::TempDir;

    fn params(m: u64) -> SecurityParameters {
        SecurityParameters::builder()
            .set_plaintext_modulus(65537)
            .set_cyclotomic_index(m)
            .set_chain_length(3)
            .build()
            .unwrap()
    }

    #[test]
    fn test_generate() {
        let mut manager = KeyManager::new(Arc::new(MockEngine));
        assert!(!manager.is_ready());
        assert!(matches!(manager.slot_count(), Err(FacadeError::NotReady)));

        manager.generate(&params(257)).unwrap();
        assert!(manager.is_ready());
        assert_eq!(manager.slot_count().unwrap(), 16);
        assert_eq!(manager.chain_length().unwrap(), 3);
        assert_eq!(manager.parameters().unwrap().cyclotomic_index, 257);
    }

    #[test]
    fn test_failed_generate_keeps_environment() {
        let mut manager = KeyManager::new(Arc::new(MockEngine));
        manager.generate(&params(257)).unwrap();

        // p = m, so p is not a unit mod m
        let err = manager.generate(&params(65537)).unwrap_err();
        assert!(matches!(err, FacadeError::Config(_)));
        assert_eq!(manager.parameters().unwrap().cyclotomic_index, 257);
        assert_eq!(manager.slot_count().unwrap(), 16);
    }

    #[test]
    fn test_restore() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keys.state");

        let mut manager = KeyManager::new(Arc::new(MockEngine));
        manager.generate(&params(257)).unwrap();
        manager.persist(&path).unwrap();
        let ct = manager
            .environment()
            .unwrap()
            .encrypt(manager.engine(), &[4, 5])
            .unwrap();

        let mut restored = manager.detached();
        assert!(!restored.is_ready());
        assert!(matches!(
            restored.restore(dir.path().join("missing")),
            Err(FacadeError::Persistence(_))
        ));
        assert!(!restored.is_ready());

        restored.restore(&path).unwrap();
        assert_eq!(restored.parameters().unwrap(), manager.parameters().unwrap());
        let values = restored
            .environment()
            .unwrap()
            .decrypt(restored.engine(), &ct)
            .unwrap();
        assert_eq!(&values[..2], &[4, 5]);

        let previous = restored.install(manager.build(&params(257)).unwrap());
        assert!(previous.is_some());
    }
}
