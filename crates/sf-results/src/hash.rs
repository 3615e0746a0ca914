//! Content-based hashing for run IDs.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::ResultsResult;

/// SHA-256 over the JSON form of a mission definition and the solver version.
pub fn compute_run_id<T: Serialize>(definition: &T, solver_version: &str) -> ResultsResult<String> {
    let mut hasher = Sha256::new();

    let definition_json = serde_json::to_string(definition)?;
    hasher.update(definition_json.as_bytes());
    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    Ok(format!("{:x}", result))
}

/// SHA-256 of raw bytes, hex encoded.
pub fn digest_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
