use crate::engine::{Engine, EngineConfig};
use tempfile::TempDir;

/// A fresh, loaded, empty engine backed by a scratch temp directory. The
/// `TempDir` guard is returned alongside so it isn't dropped (and the
/// directory deleted) out from under the test.
pub fn fresh_engine() -> (Engine, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::new(EngineConfig::new(dir.path().to_path_buf()));
    engine.load().unwrap();
    (engine, dir)
}
