use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Base type whose concrete implementations are generated.
    #[arg(long, value_name = "NAME", default_value = "BaseEvent")]
    pub base: String,

    /// Only keep types whose name ends with this suffix. Can be provided multiple times.
    #[arg(long, value_name = "SUFFIX")]
    pub name_suffix: Vec<String>,

    /// Drop a type by exact name. Can be provided multiple times.
    #[arg(long, value_name = "NAME")]
    pub exclude: Vec<String>,

    /// Seed for the value generator (reproducible values, except timestamps).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Locale for generated words; unknown locales fall back to "en".
    #[arg(long, value_name = "LOCALE")]
    pub locale: Option<String>,

    /// Read a JSON scan configuration; explicit flags take precedence.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit the generated instances as a JSON array instead of a summary.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// With `--json`, write single-line JSON.
    #[arg(long, default_value_t = false, requires = "json", conflicts_with = "indent")]
    pub compact: bool,

    /// With `--json`, indentation width in spaces.
    #[arg(long, value_name = "N", requires = "json")]
    pub indent: Option<usize>,

    /// Print the scan report (candidates, skipped types, field counters) as JSON.
    #[arg(long, default_value_t = false)]
    pub report: bool,

    /// List the registered types and exit.
    #[arg(long, default_value_t = false)]
    pub list_types: bool,

    /// Write the output to a file instead of stdout.
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

impl Args {
    /// Whether any candidate filter rule was requested.
    pub fn has_filter_rules(&self) -> bool {
        !self.name_suffix.is_empty() || !self.exclude.is_empty()
    }
}
