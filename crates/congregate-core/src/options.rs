//! Command-line handling. Arguments the job understands are parsed with clap; everything else
//! is kept verbatim as engine options.

use std::ffi::OsString;
use std::num::NonZeroUsize;

use clap::Parser;

use crate::error::{CongregateError, Result};
use crate::pipeline::{PipelineOptions, DEFAULT_INPUT};
use crate::sink::{SinkOptions, DEFAULT_SHARD_NAME_TEMPLATE};

const VALUE_FLAGS: &[&str] = &["--input", "--output", "--num-shards", "--shard-name-template"];
const SWITCHES: &[&str] = &["-h", "--help", "-V", "--version"];

#[derive(Parser, Debug, Clone)]
#[command(
    name = "congregate",
    author,
    version,
    about = "Merge header-prefixed CSV shards into one output with a single header",
    long_about = None
)]
pub struct JobArgs {
    /// Input file or pattern to process. Use a wildcard (*) to process multiple files
    #[arg(long, default_value = DEFAULT_INPUT, allow_hyphen_values = true)]
    pub input: String,

    /// Output path prefix to write results to
    #[arg(long, allow_hyphen_values = true)]
    pub output: String,

    /// Number of output shards, each starting with the header line
    #[arg(long, default_value = "1")]
    pub num_shards: NonZeroUsize,

    /// Shard naming template; runs of S and N become the shard index and count
    #[arg(long, default_value = DEFAULT_SHARD_NAME_TEMPLATE, allow_hyphen_values = true)]
    pub shard_name_template: String,
}

/// Parses a full argv (program name first) into pipeline options.
///
/// Unknown arguments are not an error: they are collected, in order, into [`EngineOptions`].
pub fn parse_args<I, T>(argv: I) -> std::result::Result<PipelineOptions, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let argv: Vec<String> = argv
        .into_iter()
        .map(|arg| arg.into().to_string_lossy().into_owned())
        .collect();
    let (known, engine) = split_known_args(&argv);
    let args = JobArgs::try_parse_from(known)?;

    Ok(PipelineOptions {
        input: args.input,
        output: args.output,
        sink: SinkOptions {
            num_shards: args.num_shards.get(),
            shard_name_template: args.shard_name_template,
            ..SinkOptions::default()
        },
        engine: EngineOptions::new(engine),
    })
}

/// Partitions `argv` into the arguments [`JobArgs`] knows (program name included) and the rest.
pub fn split_known_args(argv: &[String]) -> (Vec<String>, Vec<String>) {
    let mut known = Vec::new();
    let mut engine = Vec::new();
    let mut args = argv.iter();

    if let Some(program) = args.next() {
        known.push(program.clone());
    }

    while let Some(arg) = args.next() {
        let name = arg.split_once('=').map_or(arg.as_str(), |(name, _)| name);

        if SWITCHES.contains(&arg.as_str()) {
            known.push(arg.clone());
        } else if VALUE_FLAGS.contains(&name) {
            known.push(arg.clone());
            if !arg.contains('=') {
                if let Some(value) = args.as_slice().first() {
                    if !value.starts_with("--") {
                        known.push(value.clone());
                        args.next();
                    }
                }
            }
        } else {
            engine.push(arg.clone());
        }
    }

    (known, engine)
}

/// Runner-level arguments, kept exactly as given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    args: Vec<String>,
}

impl EngineOptions {
    pub fn new(args: Vec<String>) -> Self {
        Self { args }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Value of `--name value` or `--name=value`; a bare `--name` reads as `"true"`.
    /// The last occurrence wins.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries()
            .into_iter()
            .rev()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// Every `--name` with its value, in order.
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let mut entries = Vec::new();
        let mut idx = 0;
        while idx < self.args.len() {
            let arg = &self.args[idx];
            idx += 1;
            let Some(flag) = arg.strip_prefix("--") else {
                continue;
            };
            if let Some((name, value)) = flag.split_once('=') {
                entries.push((name, value));
                continue;
            }
            match self.args.get(idx) {
                Some(next) if !next.starts_with("--") => {
                    entries.push((flag, next.as_str()));
                    idx += 1;
                }
                _ => entries.push((flag, "true")),
            }
        }
        entries
    }

    pub fn runner(&self) -> Option<&str> {
        self.get("runner")
    }

    /// Whether the requested runner is the in-process one (or none was requested).
    pub fn is_direct_runner(&self) -> bool {
        self.runner().map_or(true, |runner| {
            runner.eq_ignore_ascii_case("DirectRunner") || runner.eq_ignore_ascii_case("direct")
        })
    }

    /// Worker count from `--direct_num_workers`, defaulting to the available parallelism.
    pub fn workers(&self) -> Result<usize> {
        match self.get("direct_num_workers") {
            Some(raw) => raw
                .parse::<NonZeroUsize>()
                .map(NonZeroUsize::get)
                .map_err(|err| CongregateError::EngineOption {
                    name: "direct_num_workers".into(),
                    message: format!("'{raw}' is not a positive integer ({err})"),
                }),
            None => Ok(std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)),
        }
    }
}
