//! Homomorphic operations on registered ciphertexts
//!
//! Every operation resolves its handles first, then mutates the ciphertext
//! under the first handle in place. No handle is allocated except by
//! `encrypt`.

use crate::environment::Environment;
use crate::error::FacadeResult;
use crate::handle::Handle;
use crate::registry::CiphertextRegistry;
use hefacade_engine::HeEngine;
use tracing::debug;

/// Decrypt the ciphertext under `handle` without copying it
pub fn decrypt<E: HeEngine>(
    engine: &E,
    environment: &Environment<E>,
    registry: &CiphertextRegistry<E::Ciphertext>,
    handle: &Handle,
) -> FacadeResult<Vec<i64>> {
    let values = registry.inspect([handle], |[ct]| environment.decrypt(engine, ct))??;
    Ok(values)
}

/// Compare two registered ciphertexts
pub fn equals<E: HeEngine>(
    engine: &E,
    registry: &CiphertextRegistry<E::Ciphertext>,
    first: &Handle,
    second: &Handle,
    compare_keys: bool,
) -> FacadeResult<bool> {
    registry.inspect([first, second], |[a, b]| engine.equals(a, b, compare_keys))
}

pub struct Evaluator<'a, E: HeEngine> {
    engine: &'a E,
    environment: &'a Environment<E>,
    registry: &'a mut CiphertextRegistry<E::Ciphertext>,
}

impl<'a, E: HeEngine> Evaluator<'a, E> {
    pub fn new(
        engine: &'a E,
        environment: &'a Environment<E>,
        registry: &'a mut CiphertextRegistry<E::Ciphertext>,
    ) -> Self {
        Self {
            engine,
            environment,
            registry,
        }
    }

    fn public_key(&self) -> &'a E::PublicKey {
        self.environment.encryptor().public_key()
    }

    /// Encrypt `values` and register the result
    pub fn encrypt(&mut self, values: &[i64]) -> FacadeResult<Handle> {
        let ct = self.environment.encrypt(self.engine, values)?;
        Ok(self.registry.store(ct))
    }

    pub fn decrypt(&self, handle: &Handle) -> FacadeResult<Vec<i64>> {
        decrypt(self.engine, self.environment, &*self.registry, handle)
    }

    /// `h1 += h2`, or `h1 -= h2` when `negate` is set
    pub fn add(&mut self, h1: &Handle, h2: &Handle, negate: bool) -> FacadeResult<()> {
        let engine = self.engine;
        self.registry
            .update(h1, [h2], |ct, [other]| Ok(engine.add(ct, other, negate)?))
    }

    /// `h1 *= h2`
    pub fn multiply(&mut self, h1: &Handle, h2: &Handle) -> FacadeResult<()> {
        let (engine, public) = (self.engine, self.public_key());
        self.registry
            .update(h1, [h2], |ct, [other]| Ok(engine.multiply(public, ct, other)?))
    }

    /// `h1 *= h2 * h3`
    pub fn multiply3(&mut self, h1: &Handle, h2: &Handle, h3: &Handle) -> FacadeResult<()> {
        let (engine, public) = (self.engine, self.public_key());
        self.registry.update(h1, [h2, h3], |ct, [first, second]| {
            Ok(engine.multiply_by_two(public, ct, first, second)?)
        })
    }

    /// `h1 *= h2`, then every slot of `h1` becomes the sum of all slots.
    ///
    /// `partition_size` is accepted for compatibility; the reduction always
    /// spans the whole slot vector.
    pub fn scalar_product(
        &mut self,
        h1: &Handle,
        h2: &Handle,
        partition_size: usize,
    ) -> FacadeResult<()> {
        if partition_size != 0 {
            debug!(partition_size, "partition size ignored, reducing over all slots");
        }
        let (engine, public) = (self.engine, self.public_key());
        let encoder = self.environment.encoder();
        self.registry.update(h1, [h2], |ct, [other]| {
            engine.multiply(public, ct, other)?;
            engine.total_sums(encoder, public, ct)?;
            Ok(())
        })
    }

    pub fn square(&mut self, handle: &Handle) -> FacadeResult<()> {
        let (engine, public) = (self.engine, self.public_key());
        self.registry
            .update(handle, [], |ct, []| Ok(engine.square(public, ct)?))
    }

    pub fn cube(&mut self, handle: &Handle) -> FacadeResult<()> {
        let (engine, public) = (self.engine, self.public_key());
        self.registry
            .update(handle, [], |ct, []| Ok(engine.cube(public, ct)?))
    }

    pub fn negate(&mut self, handle: &Handle) -> FacadeResult<()> {
        let engine = self.engine;
        self.registry
            .update(handle, [], |ct, []| Ok(engine.negate(ct)?))
    }

    pub fn equals(&self, h1: &Handle, h2: &Handle, compare_keys: bool) -> FacadeResult<bool> {
        equals(self.engine, &*self.registry, h1, h2, compare_keys)
    }

    /// Cyclic rotation by `amount`; positive moves values to higher slots
    pub fn rotate(&mut self, handle: &Handle, amount: i64) -> FacadeResult<()> {
        let (engine, public) = (self.engine, self.public_key());
        let encoder = self.environment.encoder();
        self.registry
            .update(handle, [], |ct, []| Ok(engine.rotate(encoder, public, ct, amount)?))
    }

    /// Shift by `amount` with zero fill; positive moves values to higher slots
    pub fn shift(&mut self, handle: &Handle, amount: i64) -> FacadeResult<()> {
        let (engine, public) = (self.engine, self.public_key());
        let encoder = self.environment.encoder();
        self.registry
            .update(handle, [], |ct, []| Ok(engine.shift(encoder, public, ct, amount)?))
    }
}
