//! Thread-safe caller-facing surface
//!
//! [`Session`] keeps the [`KeyManager`] and the [`CiphertextRegistry`] behind
//! one reader/writer lock. Read-only calls share the read lock; everything
//! that mutates takes the write lock. `generate` and `restore` build the new
//! environment on a detached [`KeyManager`] before locking and hold the write
//! lock only for the swap.

use crate::error::{FacadeError, FacadeResult};
use crate::evaluator::{self, Evaluator};
use crate::handle::Handle;
use crate::manager::KeyManager;
use crate::registry::CiphertextRegistry;
use hefacade_engine::HeEngine;
use hefacade_params::{
    ChainLengthEstimator, HeuristicChainLength, ResolvedParameters, SecurityParameters,
};
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, instrument};

struct State<E: HeEngine> {
    manager: KeyManager<E>,
    registry: CiphertextRegistry<E::Ciphertext>,
}

pub struct Session<E: HeEngine> {
    /// Never installed; builds environments outside the lock
    staging: KeyManager<E>,
    state: RwLock<State<E>>,
}

impl<E: HeEngine> Session<E> {
    pub fn new(engine: E) -> Self {
        Self::with_estimator(engine, HeuristicChainLength::default())
    }

    pub fn with_estimator(engine: E, estimator: impl ChainLengthEstimator + 'static) -> Self {
        let staging = KeyManager::with_estimator(Arc::new(engine), Arc::new(estimator));
        Self {
            state: RwLock::new(State {
                manager: staging.detached(),
                registry: CiphertextRegistry::new(),
            }),
            staging,
        }
    }

    pub fn engine(&self) -> &E {
        self.staging.engine()
    }

    fn read(&self) -> FacadeResult<RwLockReadGuard<'_, State<E>>> {
        self.state.read().map_err(|_| FacadeError::Poisoned)
    }

    fn write(&self) -> FacadeResult<RwLockWriteGuard<'_, State<E>>> {
        self.state.write().map_err(|_| FacadeError::Poisoned)
    }

    /// Run `f` with an evaluator over the current environment, under the write lock
    fn evaluate<R>(
        &self,
        f: impl FnOnce(&mut Evaluator<'_, E>) -> FacadeResult<R>,
    ) -> FacadeResult<R> {
        let mut guard = self.write()?;
        let state = &mut *guard;
        let environment = state.manager.environment()?;
        let mut evaluator =
            Evaluator::new(state.manager.engine(), environment, &mut state.registry);
        f(&mut evaluator)
    }

    /// Run `f` over the registry once the session is ready, under the write lock
    fn with_registry<R>(
        &self,
        f: impl FnOnce(&mut CiphertextRegistry<E::Ciphertext>) -> FacadeResult<R>,
    ) -> FacadeResult<R> {
        let mut guard = self.write()?;
        let state = &mut *guard;
        state.manager.environment()?;
        f(&mut state.registry)
    }

    /// Derive parameters and replace the context, keys and encoder
    #[instrument(skip_all)]
    pub fn generate(&self, params: &SecurityParameters) -> FacadeResult<()> {
        let environment = self.staging.build(params)?;
        self.write()?.manager.install(environment);
        Ok(())
    }

    pub fn persist(&self, path: impl AsRef<Path>) -> FacadeResult<()> {
        self.read()?.manager.persist(path)
    }

    /// Replace the context, keys and encoder with persisted ones. Stored
    /// handles survive; ciphertexts made under a different context or slot
    /// polynomial will not decrypt afterwards.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn restore(&self, path: impl AsRef<Path>) -> FacadeResult<()> {
        let environment = self.staging.load(path)?;
        let mut state = self.write()?;
        state.manager.install(environment);
        info!(handles = state.registry.len(), "swapped in restored environment");
        Ok(())
    }

    pub fn is_ready(&self) -> FacadeResult<bool> {
        Ok(self.read()?.manager.is_ready())
    }

    pub fn slot_count(&self) -> FacadeResult<usize> {
        self.read()?.manager.slot_count()
    }

    pub fn parameters(&self) -> FacadeResult<ResolvedParameters> {
        Ok(self.read()?.manager.parameters()?.clone())
    }

    pub fn chain_length(&self) -> FacadeResult<u64> {
        self.read()?.manager.chain_length()
    }

    pub fn encrypt(&self, values: &[i64]) -> FacadeResult<Handle> {
        self.evaluate(|ev| ev.encrypt(values))
    }

    pub fn decrypt(&self, handle: &Handle) -> FacadeResult<Vec<i64>> {
        let state = self.read()?;
        let environment = state.manager.environment()?;
        evaluator::decrypt(state.manager.engine(), environment, &state.registry, handle)
    }

    pub fn store(&self, ciphertext: E::Ciphertext) -> FacadeResult<Handle> {
        self.with_registry(|registry| Ok(registry.store(ciphertext)))
    }

    pub fn retrieve(&self, handle: &Handle) -> FacadeResult<E::Ciphertext> {
        let state = self.read()?;
        state.manager.environment()?;
        state.registry.retrieve(handle)
    }

    pub fn alias(&self, handle: &Handle) -> FacadeResult<Handle> {
        self.with_registry(|registry| registry.alias(handle))
    }

    pub fn replace(&self, handle: &Handle, ciphertext: E::Ciphertext) -> FacadeResult<bool> {
        self.with_registry(|registry| Ok(registry.replace(handle, ciphertext)))
    }

    pub fn erase(&self, handle: &Handle) -> FacadeResult<bool> {
        self.with_registry(|registry| Ok(registry.erase(handle)))
    }

    /// Number of stored ciphertexts
    pub fn len(&self) -> FacadeResult<usize> {
        Ok(self.read()?.registry.len())
    }

    pub fn is_empty(&self) -> FacadeResult<bool> {
        Ok(self.read()?.registry.is_empty())
    }

    pub fn add(&self, h1: &Handle, h2: &Handle, negate: bool) -> FacadeResult<()> {
        self.evaluate(|ev| ev.add(h1, h2, negate))
    }

    pub fn multiply(&self, h1: &Handle, h2: &Handle) -> FacadeResult<()> {
        self.evaluate(|ev| ev.multiply(h1, h2))
    }

    pub fn multiply3(&self, h1: &Handle, h2: &Handle, h3: &Handle) -> FacadeResult<()> {
        self.evaluate(|ev| ev.multiply3(h1, h2, h3))
    }

    pub fn scalar_product(
        &self,
        h1: &Handle,
        h2: &Handle,
        partition_size: usize,
    ) -> FacadeResult<()> {
        self.evaluate(|ev| ev.scalar_product(h1, h2, partition_size))
    }

    pub fn square(&self, handle: &Handle) -> FacadeResult<()> {
        self.evaluate(|ev| ev.square(handle))
    }

    pub fn cube(&self, handle: &Handle) -> FacadeResult<()> {
        self.evaluate(|ev| ev.cube(handle))
    }

    pub fn negate(&self, handle: &Handle) -> FacadeResult<()> {
        self.evaluate(|ev| ev.negate(handle))
    }

    pub fn equals(&self, h1: &Handle, h2: &Handle, compare_keys: bool) -> FacadeResult<bool> {
        let state = self.read()?;
        state.manager.environment()?;
        evaluator::equals(state.manager.engine(), &state.registry, h1, h2, compare_keys)
    }

    pub fn rotate(&self, handle: &Handle, amount: i64) -> FacadeResult<()> {
        self.evaluate(|ev| ev.rotate(handle, amount))
    }

    pub fn shift(&self, handle: &Handle, amount: i64) -> FacadeResult<()> {
        self.evaluate(|ev| ev.shift(handle, amount))
    }
}
