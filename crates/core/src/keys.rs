//! Key pair and capability traits
//!
//! The public key is a view the engine derives from the secret key, so a
//! [`KeyPair`] is built from its secret half only.

use hefacade_engine::HeEngine;

/// Public-key capability: encryption and evaluation
pub trait Encryptor<E: HeEngine> {
    fn public_key(&self) -> &E::PublicKey;
}

/// Secret-key capability: decryption, on top of everything [`Encryptor`] offers
pub trait Decryptor<E: HeEngine>: Encryptor<E> {
    fn secret_key(&self) -> &E::SecretKey;
}

pub struct KeyPair<E: HeEngine> {
    secret: E::SecretKey,
    public: E::PublicKey,
}

impl<E: HeEngine> KeyPair<E> {
    /// Take ownership of a secret key and derive its public view
    pub fn from_secret(engine: &E, secret: E::SecretKey) -> Self {
        let public = engine.public_key(&secret);
        Self { secret, public }
    }
}

impl<E: HeEngine> Encryptor<E> for KeyPair<E> {
    fn public_key(&self) -> &E::PublicKey {
        &self.public
    }
}

impl<E: HeEngine> Decryptor<E> for KeyPair<E> {
    fn secret_key(&self) -> &E::SecretKey {
        &self.secret
    }
}
