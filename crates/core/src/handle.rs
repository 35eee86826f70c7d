//! Opaque ciphertext handles

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Short string naming a stored ciphertext
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Handle {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Handle(s.to_string()))
    }
}

impl From<String> for Handle {
    fn from(s: String) -> Self {
        Handle(s)
    }
}

impl From<&str> for Handle {
    fn from(s: &str) -> Self {
        Handle(s.to_string())
    }
}

impl AsRef<str> for Handle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Issues handles as a random 64-bit prefix followed by a 64-bit counter,
/// both in lowercase hex.
///
/// Handles from one generator never repeat; two generators share a handle
/// only if their prefixes collide.
#[derive(Debug)]
pub struct HandleGenerator {
    prefix: u64,
    counter: u64,
}

impl HandleGenerator {
    pub fn new() -> Self {
        Self::with_prefix(rand::random())
    }

    pub fn with_prefix(prefix: u64) -> Self {
        Self { prefix, counter: 0 }
    }

    pub fn next_handle(&mut self) -> Handle {
        let handle = Handle(format!("{:016x}{:016x}", self.prefix, self.counter));
        self.counter = self.counter.wrapping_add(1);
        handle
    }
}

impl Default for HandleGenerator {
    fn default() -> Self {
        Self::new()
    }
}
