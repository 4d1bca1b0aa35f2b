//! `cfgtar render`: stream a template archive through the pipeline.
//!
//! Without a selector the archive is rendered once against the
//! configuration. With `--selector KEY` it is rendered once per string in
//! `config[KEY]`; each run sees `config[KEY] = {"Pos": i, "Value": v}` and
//! writes `TARGET/<v>.tar`.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use cfgtar_adapters::{TarEntrySink, TarEntrySource};
use cfgtar_core::{
    application::{ArchivePipeline, PipelineOptions, RunSummary},
    domain::{Delimiters, Mapping, Value},
};

use crate::{
    cli::RenderArgs,
    commands::{read_json, system_pipeline, validate_file},
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Where one run writes its archive.
#[derive(Debug, Clone, PartialEq)]
enum Destination {
    Discard,
    Stdout,
    File(PathBuf),
}

/// One pipeline run: the initial configuration and its destination.
#[derive(Debug)]
struct Job {
    initial: Value,
    destination: Destination,
}

#[instrument(skip_all)]
pub fn execute(args: RenderArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let options = pipeline_options(&args, &config)?;
    let pipeline = system_pipeline();

    let (schema, config_path) = args.schema_and_config();
    let mut initial = read_json(config_path)?;
    if let Some(schema) = schema {
        initial = validate_file(&pipeline, schema, &initial)?;
        debug!(schema = %schema.display(), "Configuration validated");
    }

    let jobs = match (&args.selector, &args.target) {
        (Some(key), Some(target)) => selector_jobs(&initial, key, target)?,
        _ => vec![Job {
            initial,
            destination: args.output.clone().map_or(Destination::Stdout, Destination::File),
        }],
    };

    if args.dry_run || args.validate_first {
        for job in &jobs {
            run_once(&pipeline, args.input.as_deref(), &Destination::Discard, &job.initial, &options)?;
        }
        output.info(&format!("Dry run passed ({} run(s))", jobs.len()))?;
    }

    if !args.dry_run || args.validate_first {
        for job in &jobs {
            let summary =
                run_once(&pipeline, args.input.as_deref(), &job.destination, &job.initial, &options)?;
            if let Destination::File(path) = &job.destination {
                output.success(&format!(
                    "Wrote {} ({} entries, {} bytes)",
                    path.display(),
                    summary.entries_rendered,
                    summary.bytes_written
                ))?;
            }
        }
    }

    Ok(())
}

fn pipeline_options(args: &RenderArgs, config: &AppConfig) -> CliResult<PipelineOptions> {
    let raw = args.delimiters.as_deref().unwrap_or(&config.render.delimiters);
    let delimiters: Delimiters = raw.parse().map_err(|e| CliError::InvalidInput {
        message: format!("invalid delimiters '{raw}'"),
        source: Some(Box::new(e)),
    })?;
    let marker = args
        .schema_name
        .clone()
        .unwrap_or_else(|| config.render.schema_marker.clone());
    if marker.is_empty() || marker.contains('/') {
        return Err(CliError::InvalidInput {
            message: format!("schema name '{marker}' must be a plain file name"),
            source: None,
        });
    }

    Ok(PipelineOptions::default()
        .with_delimiters(delimiters)
        .with_schema_marker(marker))
}

/// One job per selector value, in list order.
fn selector_jobs(initial: &Value, key: &str, target: &Path) -> CliResult<Vec<Job>> {
    let values = initial
        .get(key)
        .ok_or_else(|| CliError::SelectorNotFound { key: key.to_owned() })?
        .as_sequence()
        .ok_or_else(|| CliError::SelectorNotStrings { key: key.to_owned() })?;

    values
        .iter()
        .enumerate()
        .map(|(pos, value)| {
            let name = value
                .as_str()
                .ok_or_else(|| CliError::SelectorNotStrings { key: key.to_owned() })?;
            Ok(Job {
                initial: with_selection(initial, key, pos, name),
                destination: Destination::File(target.join(format!("{name}.tar"))),
            })
        })
        .collect()
}

/// Replace `config[key]` with `{"Pos": pos, "Value": value}`.
fn with_selection(initial: &Value, key: &str, pos: usize, value: &str) -> Value {
    let mut selected = initial.clone();
    if let Some(map) = selected.as_mapping_mut() {
        let mut entry = Mapping::new();
        entry.insert("Pos".into(), Value::Int(pos as i64));
        entry.insert("Value".into(), Value::from(value));
        map.insert(key.to_owned(), Value::Mapping(entry));
    }
    selected
}

fn open_input(input: Option<&Path>) -> CliResult<Box<dyn Read>> {
    Ok(match input {
        Some(path) => {
            let file = File::open(path).map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => CliError::FileNotFound {
                    path: path.to_path_buf(),
                },
                _ => CliError::IoError {
                    message: format!("opening {}: {e}", path.display()),
                    source: e,
                },
            })?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    })
}

#[instrument(skip(pipeline, initial, options))]
fn run_once(
    pipeline: &ArchivePipeline,
    input: Option<&Path>,
    destination: &Destination,
    initial: &Value,
    options: &PipelineOptions,
) -> CliResult<RunSummary> {
    let mut archive = tar::Archive::new(open_input(input)?);
    let mut source = TarEntrySource::new(&mut archive)?;
    let initial = initial.clone();

    let summary = match destination {
        Destination::Discard => pipeline.run(&mut source, None, initial, options)?,
        Destination::Stdout => {
            let mut sink = TarEntrySink::new(io::stdout().lock());
            let summary = pipeline.run(&mut source, Some(&mut sink), initial, options)?;
            sink.into_inner()?;
            summary
        }
        Destination::File(path) => {
            let file = File::create(path)
                .with_cli_context(|| format!("creating {}", path.display()))?;
            let mut sink = TarEntrySink::new(BufWriter::new(file));
            let summary = pipeline.run(&mut source, Some(&mut sink), initial, options)?;
            let file = sink
                .into_inner()?
                .into_inner()
                .map_err(|e| e.into_error())
                .with_cli_context(|| format!("writing {}", path.display()))?;
            file.sync_all()
                .with_cli_context(|| format!("syncing {}", path.display()))?;
            summary
        }
    };

    info!(
        entries = summary.entries_rendered,
        schemas = summary.schemas_installed,
        bytes = summary.bytes_written,
        "Render finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(text: &str) -> Value {
        Value::from_json_str(text).unwrap()
    }

    #[test]
    fn selector_builds_one_job_per_value() {
        let config = json(r#"{"hosts":["web","db"],"domain":"example.org"}"#);
        let jobs = selector_jobs(&config, "hosts", Path::new("out")).unwrap();

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].destination, Destination::File(PathBuf::from("out/db.tar")));
        assert_eq!(
            jobs[1].initial,
            json(r#"{"hosts":{"Pos":1,"Value":"db"},"domain":"example.org"}"#)
        );
    }

    #[test]
    fn selector_errors() {
        let config = json(r#"{"hosts":["web",3],"name":"x"}"#);
        assert!(matches!(
            selector_jobs(&config, "missing", Path::new(".")),
            Err(CliError::SelectorNotFound { .. })
        ));
        assert!(matches!(
            selector_jobs(&config, "name", Path::new(".")),
            Err(CliError::SelectorNotStrings { .. })
        ));
        assert!(matches!(
            selector_jobs(&config, "hosts", Path::new(".")),
            Err(CliError::SelectorNotStrings { .. })
        ));
    }

    #[test]
    fn options_fall_back_to_config() {
        let args = RenderArgs {
            files: vec![PathBuf::from("c.json")],
            input: None,
            output: None,
            dry_run: false,
            validate_first: false,
            delimiters: None,
            schema_name: Some("schema.json".into()),
            selector: None,
            target: None,
        };
        let options = pipeline_options(&args, &AppConfig::default()).unwrap();
        assert_eq!(options.delimiters, Delimiters::default());
        assert_eq!(options.schema_marker, "schema.json");

        let bad = RenderArgs {
            delimiters: Some("{{".into()),
            ..args
        };
        assert!(matches!(
            pipeline_options(&bad, &AppConfig::default()),
            Err(CliError::InvalidInput { .. })
        ));
    }
}
