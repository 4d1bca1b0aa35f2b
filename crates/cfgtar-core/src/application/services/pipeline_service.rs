//! Archive Pipeline - main application orchestrator.
//!
//! One forward pass over an entry stream:
//! 1. Schema markers are validated against the configuration in effect for
//!    their directory and installed as that directory's override
//! 2. Every other entry is rendered against the configuration in effect for
//!    its directory and written to the sink
//!
//! Without a sink the same work runs and the output is discarded, which is
//! how validation-only runs work.

use tracing::{debug, info, instrument};

use crate::{
    application::{
        ApplicationError,
        ports::{EntrySink, EntrySource, TemplateFunctions, TemplateRenderer},
        services::CancellationToken,
    },
    domain::{ArchiveEntry, Delimiters, OverrideRegistry, SchemaValidator, Value},
    error::CfgtarResult,
};

/// Default base name of schema marker entries.
pub const SCHEMA_MARKER: &str = "._config-schema.json";

/// Per-run knobs.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub schema_marker: String,
    pub delimiters: Delimiters,
    pub cancel: CancellationToken,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            schema_marker: SCHEMA_MARKER.to_owned(),
            delimiters: Delimiters::default(),
            cancel: CancellationToken::new(),
        }
    }
}

impl PipelineOptions {
    pub fn with_schema_marker(mut self, name: impl Into<String>) -> Self {
        self.schema_marker = name.into();
        self
    }

    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// What a run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Entries emitted (or that would have been, in a dry run).
    pub entries_rendered: usize,
    pub schemas_installed: usize,
    /// Total content bytes of emitted entries.
    pub bytes_written: u64,
}

/// The archive rendering service.
pub struct ArchivePipeline {
    validator: SchemaValidator,
    renderer: Box<dyn TemplateRenderer>,
    functions: Box<dyn TemplateFunctions>,
}

impl ArchivePipeline {
    /// Create a pipeline with the given validator and adapters.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use cfgtar_core::application::ArchivePipeline;
    ///
    /// let pipeline = ArchivePipeline::new(
    ///     validator, // SchemaValidator
    ///     renderer,  // Box<dyn TemplateRenderer>
    ///     functions, // Box<dyn TemplateFunctions>
    /// );
    /// ```
    pub fn new(
        validator: SchemaValidator,
        renderer: Box<dyn TemplateRenderer>,
        functions: Box<dyn TemplateFunctions>,
    ) -> Self {
        Self {
            validator,
            renderer,
            functions,
        }
    }

    pub fn validator(&self) -> &SchemaValidator {
        &self.validator
    }

    /// Process every entry of `source`.
    ///
    /// `initial` is the configuration used wherever no schema marker has
    /// installed an override. With `sink = None` nothing is written.
    #[instrument(
        skip_all,
        fields(marker = %options.schema_marker, dry_run = sink.is_none())
    )]
    pub fn run(
        &self,
        source: &mut dyn EntrySource,
        mut sink: Option<&mut dyn EntrySink>,
        initial: Value,
        options: &PipelineOptions,
    ) -> CfgtarResult<RunSummary> {
        let mut registry = OverrideRegistry::new(initial);
        let mut summary = RunSummary::default();

        loop {
            options.cancel.check()?;
            let Some(entry) = source.next_entry()? else {
                break;
            };

            if entry.is_regular() && entry.base_name() == options.schema_marker {
                self.install_schema(&entry, &mut registry)?;
                summary.schemas_installed += 1;
                continue;
            }

            let rendered = self.render_entry(entry, &registry, &options.delimiters)?;
            summary.entries_rendered += 1;
            summary.bytes_written += rendered.size();
            if let Some(sink) = sink.as_deref_mut() {
                sink.write_entry(&rendered)?;
            }
        }

        if let Some(sink) = sink {
            sink.finish()?;
        }

        info!(
            entries = summary.entries_rendered,
            schemas = summary.schemas_installed,
            bytes = summary.bytes_written,
            "Archive processed"
        );
        Ok(summary)
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    fn install_schema(
        &self,
        entry: &ArchiveEntry,
        registry: &mut OverrideRegistry,
    ) -> CfgtarResult<()> {
        let schema =
            Value::from_json_slice(&entry.content).map_err(|e| ApplicationError::SchemaParse {
                entry: entry.path.clone(),
                reason: e.to_string(),
            })?;

        let segments = entry.directory_segments();
        let normalized = self
            .validator
            .validate(&schema, registry.get(&segments))
            .map_err(|failure| ApplicationError::SchemaValidation {
                entry: entry.path.clone(),
                failure,
            })?;

        debug!(entry = %entry.path, dir = ?segments, "Schema installed");
        registry.add(&segments, normalized);
        Ok(())
    }

    fn render_entry(
        &self,
        entry: ArchiveEntry,
        registry: &OverrideRegistry,
        delimiters: &Delimiters,
    ) -> CfgtarResult<ArchiveEntry> {
        if !entry.is_regular() {
            debug!(entry = %entry.path, kind = %entry.kind, "Passed through");
            return Ok(entry);
        }

        let left = delimiters.left();
        let text = match std::str::from_utf8(&entry.content) {
            Ok(text) if !text.contains(left) => return Ok(entry),
            Ok(text) => text,
            Err(_) if !contains_bytes(&entry.content, left.as_bytes()) => return Ok(entry),
            Err(_) => {
                return Err(ApplicationError::RenderFailed {
                    entry: entry.path.clone(),
                    reason: "content is not valid UTF-8".into(),
                }
                .into());
            }
        };

        let data = registry.get(&entry.directory_segments());
        let rendered = self
            .renderer
            .render(text, data, delimiters, self.functions.as_ref())
            .map_err(|e| ApplicationError::RenderFailed {
                entry: entry.path.clone(),
                reason: e.to_string(),
            })?;

        debug!(entry = %entry.path, bytes = rendered.len(), "Rendered");
        Ok(ArchiveEntry {
            content: rendered.into_bytes(),
            ..entry
        })
    }
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}
