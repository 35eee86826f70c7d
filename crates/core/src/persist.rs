//! Persisted environment layout
//!
//! Three newline-terminated UTF-8 lines:
//! 1. JSON header: engine id, ring descriptor and resolved parameters
//! 2. base64 of the engine's context record
//! 3. base64 of the engine's secret-key record
//!
//! Files are written to a sibling temporary file and renamed into place.
//! Restored environments always encode with the intrinsic slot polynomial.

use crate::environment::Environment;
use crate::error::PersistenceError;
use crate::keys::KeyPair;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hefacade_engine::{EngineId, HeEngine, SlotPolynomial};
use hefacade_params::{ContextBase, ResolvedParameters};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{info, instrument, warn};
use zeroize::Zeroizing;

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    engine: EngineId,
    base: ContextBase,
    parameters: ResolvedParameters,
}

/// Write `environment` to `path`, replacing any existing file atomically
#[instrument(skip_all, fields(path = %path.display()))]
pub fn save<E: HeEngine>(
    engine: &E,
    environment: &Environment<E>,
    path: &Path,
) -> Result<(), PersistenceError> {
    let header = Header {
        engine: engine.id(),
        base: engine.context_base(environment.context()),
        parameters: environment.parameters().clone(),
    };
    let header =
        serde_json::to_string(&header).map_err(|e| PersistenceError::malformed("header", e))?;
    let context = STANDARD.encode(engine.write_context(environment.context())?);
    let secret_record = engine.write_secret_key(environment.decryptor().secret_key())?;
    let secret = Zeroizing::new(STANDARD.encode(secret_record.as_slice()));

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(|e| PersistenceError::io(dir, e))?;
    let written = writeln!(file, "{header}")
        .and_then(|_| writeln!(file, "{context}"))
        .and_then(|_| writeln!(file, "{}", secret.as_str()))
        .and_then(|_| file.as_file().sync_all());
    written.map_err(|e| PersistenceError::io(path, e))?;
    file.persist(path)
        .map_err(|e| PersistenceError::io(path, e.error))?;

    info!("persisted environment");
    Ok(())
}

/// Read an environment written by [`save`]
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load<E: HeEngine>(engine: &E, path: &Path) -> Result<Environment<E>, PersistenceError> {
    let text = Zeroizing::new(
        std::fs::read_to_string(path).map_err(|e| PersistenceError::io(path, e))?,
    );
    let mut lines = text.lines();
    let header_line = lines.next().ok_or(PersistenceError::MissingLine("header"))?;
    let context_line = lines.next().ok_or(PersistenceError::MissingLine("context"))?;
    let secret_line = lines.next().ok_or(PersistenceError::MissingLine("secret key"))?;

    let header: Header =
        serde_json::from_str(header_line).map_err(|e| PersistenceError::malformed("header", e))?;
    if header.engine != engine.id() {
        return Err(PersistenceError::EngineMismatch {
            expected: engine.id(),
            found: header.engine,
        });
    }
    if header.parameters.context_base() != header.base {
        return Err(PersistenceError::malformed(
            "header",
            "ring descriptor disagrees with the recorded parameters",
        ));
    }

    let context_record = STANDARD
        .decode(context_line.trim())
        .map_err(|e| PersistenceError::malformed("context", e))?;
    let context = Arc::new(engine.read_context(&header.base, &context_record)?);

    let secret_record = Zeroizing::new(
        STANDARD
            .decode(secret_line.trim())
            .map_err(|e| PersistenceError::malformed("secret key", e))?,
    );
    let secret = engine.read_secret_key(&context, &secret_record)?;
    let keys = KeyPair::from_secret(engine, secret);
    let encoder = engine.build_encoder(&context, SlotPolynomial::Intrinsic)?;

    let mut parameters = header.parameters;
    if parameters.params.field_degree != 0 {
        warn!(
            field_degree = parameters.params.field_degree,
            "restored environment encodes with the intrinsic slot polynomial"
        );
        parameters.params.field_degree = 0;
    }

    info!(
        m = header.base.cyclotomic_index,
        slots = engine.slot_count(&encoder),
        "restored environment"
    );
    Ok(Environment::from_parts(parameters, context, keys, encoder))
}
