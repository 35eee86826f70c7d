//! Ciphertext handle registry
//!
//! Owns every ciphertext the façade knows about. Callers never get a
//! reference to a stored ciphertext: [`CiphertextRegistry::retrieve`] hands
//! out a copy, and in-place operations go through [`CiphertextRegistry::update`],
//! which lends operands for the duration of a single closure.

use crate::error::{FacadeError, FacadeResult};
use crate::handle::{Handle, HandleGenerator};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

fn not_found(handle: &Handle) -> FacadeError {
    FacadeError::HandleNotFound {
        handle: handle.clone(),
    }
}

#[derive(Debug)]
pub struct CiphertextRegistry<C> {
    entries: HashMap<Handle, C>,
    generator: HandleGenerator,
}

impl<C: Clone> CiphertextRegistry<C> {
    pub fn new() -> Self {
        Self::with_generator(HandleGenerator::new())
    }

    pub fn with_generator(generator: HandleGenerator) -> Self {
        Self {
            entries: HashMap::new(),
            generator,
        }
    }

    /// Take ownership of a ciphertext and return its new handle
    pub fn store(&mut self, ciphertext: C) -> Handle {
        let mut handle = self.generator.next_handle();
        while self.entries.contains_key(&handle) {
            handle = self.generator.next_handle();
        }
        self.entries.insert(handle.clone(), ciphertext);
        debug!(%handle, stored = self.entries.len(), "stored ciphertext");
        handle
    }

    /// Copy of the ciphertext under `handle`
    pub fn retrieve(&self, handle: &Handle) -> FacadeResult<C> {
        self.get(handle).cloned()
    }

    pub fn get(&self, handle: &Handle) -> FacadeResult<&C> {
        self.entries.get(handle).ok_or_else(|| not_found(handle))
    }

    /// Store an independent copy of `handle` under a fresh handle
    pub fn alias(&mut self, handle: &Handle) -> FacadeResult<Handle> {
        let copy = self.retrieve(handle)?;
        Ok(self.store(copy))
    }

    /// Overwrite the ciphertext under `handle`. Unknown handles are ignored;
    /// returns whether anything was replaced.
    pub fn replace(&mut self, handle: &Handle, ciphertext: C) -> bool {
        match self.entries.get_mut(handle) {
            Some(slot) => {
                *slot = ciphertext;
                true
            }
            None => {
                debug!(%handle, "replace ignored unknown handle");
                false
            }
        }
    }

    /// Drop the ciphertext under `handle`. Unknown handles are ignored;
    /// returns whether anything was removed.
    pub fn erase(&mut self, handle: &Handle) -> bool {
        let removed = self.entries.remove(handle).is_some();
        debug!(%handle, removed, "erase");
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, handle: &Handle) -> bool {
        self.entries.contains_key(handle)
    }

    /// Every live handle, in no particular order
    pub fn handles(&self) -> impl Iterator<Item = &Handle> {
        self.entries.keys()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Run `f` over borrowed ciphertexts without copying them
    pub fn inspect<const N: usize, R>(
        &self,
        handles: [&Handle; N],
        f: impl FnOnce([&C; N]) -> R,
    ) -> FacadeResult<R> {
        let refs = self.lend(&handles, None)?;
        Ok(f(refs))
    }

    /// Mutate the ciphertext under `target` in place with `operands` lent
    /// by reference.
    ///
    /// Every handle is resolved before anything moves, so a missing handle
    /// leaves the registry untouched. The target is taken out of the map for
    /// the duration of `op` and put back whatever `op` returns, including when
    /// it panics. An operand naming the target itself sees a snapshot taken
    /// before `op` runs.
    pub fn update<const N: usize, R>(
        &mut self,
        target: &Handle,
        operands: [&Handle; N],
        op: impl FnOnce(&mut C, [&C; N]) -> FacadeResult<R>,
    ) -> FacadeResult<R> {
        self.get(target)?;
        for handle in operands {
            self.get(handle)?;
        }

        let mut value = self
            .entries
            .remove(target)
            .ok_or_else(|| not_found(target))?;
        let snapshot = operands
            .iter()
            .any(|handle| *handle == target)
            .then(|| value.clone());

        let outcome = match self.lend(&operands, snapshot.as_ref().map(|s| (target, s))) {
            Ok(refs) => panic::catch_unwind(AssertUnwindSafe(|| op(&mut value, refs))),
            Err(e) => Ok(Err(e)),
        };
        self.entries.insert(target.clone(), value);
        match outcome {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    fn lend<'a, const N: usize>(
        &'a self,
        handles: &[&Handle; N],
        substitute: Option<(&Handle, &'a C)>,
    ) -> FacadeResult<[&'a C; N]> {
        let mut refs = Vec::with_capacity(N);
        for &handle in handles {
            let found = match substitute {
                Some((replaced, value)) if replaced == handle => Some(value),
                _ => self.entries.get(handle),
            };
            refs.push(found.ok_or_else(|| not_found(handle))?);
        }
        // one entry per handle, so the length is always N
        refs.try_into().map_err(|_| match handles.first() {
            Some(handle) => not_found(handle),
            None => FacadeError::NotReady,
        })
    }
}

impl<C: Clone> Default for CiphertextRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CiphertextRegistry<Vec<u64>> {
        CiphertextRegistry::new()
    }

    #[test]
    fn test_store_retrieve() {
        let mut reg = registry();
        let h = reg.store(vec![1, 2, 3]);
        assert_eq!(reg.retrieve(&h).unwrap(), vec![1, 2, 3]);
        assert_eq!(reg.len(), 1);
        assert!(reg.contains(&h));
        assert!(!reg.is_empty());
    }

    #[test]
    fn test_unknown_handle() {
        let reg = registry();
        let missing = Handle::from("missing");
        match reg.retrieve(&missing) {
            Err(FacadeError::HandleNotFound { handle }) => assert_eq!(handle, missing),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_alias_is_independent() {
        let mut reg = registry();
        let h = reg.store(vec![1]);
        let copy = reg.alias(&h).unwrap();
        assert_ne!(h, copy);

        reg.update(&h, [], |ct, []| {
            ct[0] = 9;
            Ok(())
        })
        .unwrap();
        assert_eq!(reg.retrieve(&h).unwrap(), vec![9]);
        assert_eq!(reg.retrieve(&copy).unwrap(), vec![1]);
    }

    #[test]
    fn test_replace_and_erase() {
        let mut reg = registry();
        let h = reg.store(vec![1]);
        let unknown = Handle::from("nope");

        assert!(reg.replace(&h, vec![2]));
        assert_eq!(reg.retrieve(&h).unwrap(), vec![2]);
        assert!(!reg.replace(&unknown, vec![3]));
        assert!(!reg.contains(&unknown));
        assert_eq!(reg.len(), 1);

        assert!(!reg.erase(&unknown));
        assert_eq!(reg.len(), 1);
        assert!(reg.erase(&h));
        assert!(reg.is_empty());
        assert!(reg.retrieve(&h).is_err());
        assert!(!reg.erase(&h));
    }

    #[test]
    fn test_update_with_self_operand() {
        let mut reg = registry();
        let h = reg.store(vec![3, 4]);
        reg.update(&h, [&h], |ct, [other]| {
            for (a, b) in ct.iter_mut().zip(other) {
                *a += *b;
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(reg.retrieve(&h).unwrap(), vec![6, 8]);
    }

    #[test]
    fn test_update_failure_leaves_registry_untouched() {
        let mut reg = registry();
        let h = reg.store(vec![1]);
        let missing = Handle::from("missing");

        let err = reg
            .update(&h, [&missing], |ct, _| {
                ct[0] = 100;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, FacadeError::HandleNotFound { .. }));
        assert_eq!(reg.retrieve(&h).unwrap(), vec![1]);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_update_reinserts_on_operation_error() {
        let mut reg = registry();
        let h = reg.store(vec![1]);
        let result: FacadeResult<()> = reg.update(&h, [], |_, []| Err(FacadeError::NotReady));
        assert!(matches!(result, Err(FacadeError::NotReady)));
        assert!(reg.contains(&h));
    }

    #[test]
    fn test_update_keeps_target_when_operation_panics() {
        let mut reg = registry();
        let h = reg.store(vec![5]);
        let other = reg.store(vec![6]);

        let unwound = panic::catch_unwind(AssertUnwindSafe(|| {
            reg.update(&h, [&other], |_, _| -> FacadeResult<()> {
                panic!("engine failure")
            })
        }));
        assert!(unwound.is_err());
        assert!(reg.contains(&h));
        assert_eq!(reg.retrieve(&h).unwrap(), vec![5]);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_inspect_and_handles() {
        let mut reg = registry();
        let a = reg.store(vec![1]);
        let b = reg.store(vec![2]);
        let sum = reg.inspect([&a, &b], |[x, y]| x[0] + y[0]).unwrap();
        assert_eq!(sum, 3);

        let mut handles: Vec<_> = reg.handles().cloned().collect();
        handles.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(handles, expected);

        reg.clear();
        assert!(reg.is_empty());
    }

    #[test]
    fn test_many_stores_yield_distinct_handles() {
        let mut reg = registry();
        for i in 0..5_000u64 {
            reg.store(vec![i]);
        }
        assert_eq!(reg.len(), 5_000);
    }
}
