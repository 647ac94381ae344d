//! Writes backend output to disk.
//!
//! Structs are rendered and written one at a time. An artifact is skipped
//! only when it carries the backend's current stamp and is provably newer
//! than every schema file its contents depend on; whenever that cannot be
//! established the artifact is regenerated.

use crate::backend::{Backend, EmitContext};
use crate::error::EmitError;
use lcm_core::{FingerprintEngine, Schema, StructDef, TypeName};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

/// What one [`Emitter::emit`] call did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitReport {
    /// Per-struct artifacts rendered and written
    pub written: Vec<PathBuf>,
    /// Per-struct artifacts left alone by the incremental gate
    pub skipped: Vec<PathBuf>,
    /// Index files whose content changed
    pub index_written: Vec<PathBuf>,
    /// Index files already up to date
    pub index_unchanged: Vec<PathBuf>,
}

impl EmitReport {
    pub fn merge(&mut self, other: EmitReport) {
        self.written.extend(other.written);
        self.skipped.extend(other.skipped);
        self.index_written.extend(other.index_written);
        self.index_unchanged.extend(other.index_unchanged);
    }

    /// Number of files written, per-struct and index
    pub fn files_written(&self) -> usize {
        self.written.len() + self.index_written.len()
    }
}

/// Drives backends over one schema
pub struct Emitter<'a> {
    schema: &'a Schema,
    fingerprints: FingerprintEngine<'a>,
    incremental: bool,
}

impl<'a> Emitter<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            fingerprints: FingerprintEngine::new(schema),
            incremental: true,
        }
    }

    /// Enable or disable the timestamp gate
    pub fn incremental(mut self, enabled: bool) -> Self {
        self.incremental = enabled;
        self
    }

    pub fn fingerprints(&self) -> &FingerprintEngine<'a> {
        &self.fingerprints
    }

    /// Render every struct through `backend` and write the results.
    ///
    /// Stops at the first error; files written before it are left in place.
    pub fn emit(&self, backend: &dyn Backend) -> Result<EmitReport, EmitError> {
        let ctx = EmitContext {
            schema: self.schema,
            fingerprints: &self.fingerprints,
        };
        let output = backend.output_directory();
        let stamp = backend.stamp();
        let mut report = EmitReport::default();

        for def in self.schema.structs() {
            let Some(relative) = backend.artifact_path(def) else {
                continue;
            };
            let path = output.join(relative);

            if self.incremental && self.is_fresh(def, &path, &stamp) {
                info!(backend = backend.name(), artifact = %path.display(), "Up to date, skipping");
                report.skipped.push(path);
                continue;
            }

            debug!(backend = backend.name(), name = %def.name(), "Rendering struct");
            let code = backend.render_struct(def, &ctx)?;
            write_file(&path, &code)?;
            info!(backend = backend.name(), artifact = %path.display(), "Wrote artifact");
            report.written.push(path);
        }

        for index in backend.index_files(&ctx)? {
            let path = output.join(&index.path);
            let unchanged = fs::read_to_string(&path).is_ok_and(|existing| existing == index.contents);
            if unchanged {
                debug!(backend = backend.name(), artifact = %path.display(), "Index unchanged");
                report.index_unchanged.push(path);
            } else {
                write_file(&path, &index.contents)?;
                info!(backend = backend.name(), artifact = %path.display(), "Wrote index");
                report.index_written.push(path);
            }
        }

        Ok(report)
    }

    /// Whether `artifact` was rendered with the current stamp and is newer
    /// than the sources of `def` and everything it references
    fn is_fresh(&self, def: &StructDef, artifact: &Path, stamp: &str) -> bool {
        if !has_stamp(artifact, stamp) {
            debug!(artifact = %artifact.display(), "Stamp missing or changed");
            return false;
        }
        match dependency_sources(self.schema, def) {
            Some(sources) => sources.iter().all(|source| is_up_to_date(artifact, source)),
            None => false,
        }
    }
}

/// Source files of `def` and of every struct reachable from it.
///
/// `None` if any of them has no recorded source.
fn dependency_sources<'s>(schema: &'s Schema, def: &'s StructDef) -> Option<Vec<&'s Path>> {
    let mut sources = Vec::new();
    let mut seen: HashSet<&TypeName> = HashSet::new();
    let mut pending = vec![def];
    seen.insert(def.name());

    while let Some(current) = pending.pop() {
        let source = current.source()?;
        if !sources.contains(&source) {
            sources.push(source);
        }
        for name in current.referenced_structs() {
            if seen.insert(name) {
                pending.push(schema.get(name)?);
            }
        }
    }
    Some(sources)
}

/// Lines of an artifact header searched for the stamp
const STAMP_LINES: usize = 4;

/// Whether the header of `artifact` contains `stamp` as a whole line
pub fn has_stamp(artifact: &Path, stamp: &str) -> bool {
    fs::read_to_string(artifact)
        .is_ok_and(|contents| contents.lines().take(STAMP_LINES).any(|line| line == stamp))
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

/// True only if both files exist, both timestamps are readable, and
/// `artifact` is strictly newer than `source`
pub fn is_up_to_date(artifact: &Path, source: &Path) -> bool {
    match (modified(artifact), modified(source)) {
        (Some(artifact), Some(source)) => artifact > source,
        _ => false,
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), EmitError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| EmitError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| EmitError::io(path, e))
}
