//! Command handlers, one module per subcommand.

pub mod check;
pub mod completions;
pub mod config;
pub mod init;
pub mod render;

use std::path::Path;
use std::sync::Arc;

use cfgtar_adapters::{StandardFunctions, SystemEnvironment, TextTemplateRenderer};
use cfgtar_core::{
    application::{ArchivePipeline, HostEnvironment},
    domain::{SchemaValidator, Value},
};

use crate::error::{CliError, CliResult};

/// Read and parse a JSON document named on the command line.
pub(crate) fn read_json(path: &Path) -> CliResult<Value> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CliError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => CliError::IoError {
            message: format!("reading {}: {e}", path.display()),
            source: e,
        },
    })?;
    Value::from_json_slice(&bytes).map_err(|e| CliError::InvalidJson {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// The production pipeline: built-in validators, the text renderer and
/// the standard function set, all asking the real host.
pub(crate) fn system_pipeline() -> ArchivePipeline {
    let env: Arc<dyn HostEnvironment> = Arc::new(SystemEnvironment::new());
    ArchivePipeline::new(
        SchemaValidator::with_builtins(env.clone()),
        Box::new(TextTemplateRenderer::new()),
        Box::new(StandardFunctions::new(env)),
    )
}

/// Validate `config` against the schema at `schema`.
pub(crate) fn validate_file(
    pipeline: &ArchivePipeline,
    schema: &Path,
    config: &Value,
) -> CliResult<Value> {
    let schema = read_json(schema)?;
    pipeline
        .validator()
        .validate(&schema, config)
        .map_err(|failure| CliError::Core(failure.into()))
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn read_json_distinguishes_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(read_json(&missing), Err(CliError::FileNotFound { .. })));

        let bad = dir.path().join("bad.json");
        std::fs::File::create(&bad).unwrap().write_all(b"{oops").unwrap();
        assert!(matches!(read_json(&bad), Err(CliError::InvalidJson { .. })));
    }
}
