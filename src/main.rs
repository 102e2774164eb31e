use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use yamlstamp::batch::{BatchApplier, KeyValueBatch};
use yamlstamp::config::Config;
use yamlstamp::document::node::Tag;
use yamlstamp::fieldpath::FieldSpec;
use yamlstamp::file::loader::{load_yaml_file, load_yaml_from_stdin};
use yamlstamp::file::saver::{save_yaml_file, serialize_documents};
use yamlstamp::setter::Setter;

/// yamlstamp - stamp key/value pairs into YAML documents
#[derive(Parser)]
#[command(name = "yamlstamp")]
#[command(version)]
#[command(about = "Stamp key/value pairs into fields of YAML documents", long_about = None)]
struct Cli {
    /// YAML file to read (omit to read from stdin)
    file: Option<PathBuf>,

    /// Entry to write, may be repeated
    #[arg(short, long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value, required = true)]
    set: Vec<(String, String)>,

    /// Path to write the entries under, may be repeated (default: from config)
    #[arg(short, long = "path", value_name = "SPEC")]
    paths: Vec<String>,

    /// Type tag of the written values
    #[arg(short, long, default_value = "str")]
    tag: Tag,

    /// Only write into fields that already exist
    #[arg(long)]
    no_create: bool,

    /// Write the result to this file instead of stdout
    #[arg(short, long, conflicts_with = "in_place")]
    output: Option<PathBuf>,

    /// Overwrite the input file
    #[arg(short, long, requires = "file")]
    in_place: bool,

    /// Configuration file (default: ~/.config/yamlstamp/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report every entry written on stderr
    #[arg(long)]
    audit: bool,
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    let mut specs = if cli.paths.is_empty() {
        config.parsed_field_specs()?
    } else {
        cli.paths
            .iter()
            .map(|path| FieldSpec::parse(path).with_context(|| format!("Invalid --path {}", path)))
            .collect::<Result<Vec<_>>>()?
    };
    if cli.no_create {
        for spec in &mut specs {
            spec.create = None;
        }
    }

    let mut batch = KeyValueBatch::new(cli.tag.clone());
    batch.extend(cli.set.iter().cloned());

    let mut docs = match &cli.file {
        Some(path) => load_yaml_file(path)?,
        None if io::stdin().is_terminal() => bail!("No input file given and stdin is a terminal"),
        None => load_yaml_from_stdin()?,
    };

    let mut audit = Vec::new();
    {
        let setter = Setter::new()
            .with_quote_style(config.quote_style)
            .on_entry_set(|event| {
                log::info!("set {}={} ({})", event.key, event.value, event.tag);
                audit.push(format!(
                    "{}={} {} on {} with {} entries",
                    event.key,
                    event.value,
                    event.tag,
                    event.node.kind(),
                    event.node.as_mapping().map_or(0, |m| m.len())
                ));
            });
        let mut applier = BatchApplier::new(&batch, &specs).with_setter(setter);
        if !cli.no_create {
            applier = applier.with_default_create(config.create_kind);
        }
        applier.apply(&mut docs).context("Failed to apply entries")?;
    }

    if cli.audit {
        let mut stderr = io::stderr().lock();
        for line in &audit {
            writeln!(stderr, "{}", line)?;
        }
        writeln!(stderr, "{} entries written", audit.len())?;
    }

    if cli.in_place {
        if let Some(path) = &cli.file {
            save_yaml_file(path, &docs, &config)?;
        }
    } else if let Some(path) = &cli.output {
        save_yaml_file(path, &docs, &config)?;
    } else {
        let mut stdout = io::stdout().lock();
        stdout.write_all(serialize_documents(&docs, config.indent_size).as_bytes())?;
        stdout.flush()?;
    }

    Ok(())
}
