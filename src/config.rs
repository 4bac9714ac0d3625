//! Command-line options, the optional config file, and build metadata.
//!
//! Precedence, lowest first: built-in defaults, the config file (with the `config` feature),
//! `RZF_DEFAULT_COMMAND`, then command-line flags.

use crate::app::AppOptions;
use crate::error::{Result, RzfError};
use crate::matcher::{CaseMode, FuzzyAlgorithm, MatcherOptions, PatternOptions};
use crate::render::ui::ColorTheme;
use crate::session::SessionOptions;
use crate::source::{Delimiter, SourceSpec};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::path::PathBuf;

/// Generator used when stdin is a terminal and no command is configured.
pub const DEFAULT_COMMAND: &str =
    "find . -mindepth 1 -path '*/.*' -prune -o -type f -print 2> /dev/null | cut -b3-";

/// Environment variable naming the generator command.
pub const DEFAULT_COMMAND_ENV: &str = "RZF_DEFAULT_COMMAND";

/// Immutable build metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub revision: &'static str,
}

impl BuildInfo {
    pub const fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            revision: match option_env!("RZF_REVISION") {
                Some(revision) => revision,
                None => "devel",
            },
        }
    }

    /// `version (revision)`, as printed by `--version`.
    pub fn describe(&self) -> String {
        format!("{} ({})", self.version, self.revision)
    }
}

/// Everything the binary needs to know to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub query: String,
    pub pattern: PatternOptions,
    pub algorithm: FuzzyAlgorithm,
    pub multi: bool,
    /// Non-interactive mode: rank against this query and print
    pub filter: Option<String>,
    pub select_1: bool,
    pub exit_0: bool,
    pub print_query: bool,
    pub read0: bool,
    pub print0: bool,
    pub input: Option<PathBuf>,
    /// Scan threads; `None` uses every available core
    pub threads: Option<usize>,
    pub theme: String,
    /// Generator used when stdin is a terminal
    pub default_command: Option<String>,
    pub show_version: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            query: String::new(),
            pattern: PatternOptions::default(),
            algorithm: FuzzyAlgorithm::default(),
            multi: false,
            filter: None,
            select_1: false,
            exit_0: false,
            print_query: false,
            read0: false,
            print0: false,
            input: None,
            threads: None,
            theme: "default".to_string(),
            default_command: None,
            show_version: false,
        }
    }
}

/// Rewrite `+i` into a long flag clap understands.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if arg == "+i" {
                OsString::from("--case-sensitive")
            } else {
                arg
            }
        })
        .collect()
}

impl Options {
    /// The clap command definition.
    pub fn command() -> Command {
        Command::new("rzf")
            .about("An interactive terminal fuzzy finder")
            .long_about(
                "rzf reads candidate lines from stdin, a file, or a generator command and lets \
                 you narrow them down with a fuzzy query. The selection is printed to stdout.",
            )
            .disable_version_flag(true)
            .arg(
                Arg::new("query")
                    .short('q')
                    .long("query")
                    .value_name("STR")
                    .help("Start with the given query"),
            )
            .arg(
                Arg::new("exact")
                    .short('e')
                    .long("exact")
                    .action(ArgAction::SetTrue)
                    .help("Match terms as substrings instead of fuzzy subsequences"),
            )
            .arg(
                Arg::new("extended")
                    .short('x')
                    .long("extended")
                    .action(ArgAction::SetTrue)
                    .overrides_with("no-extended")
                    .help("Enable the extended search syntax (default)"),
            )
            .arg(
                Arg::new("no-extended")
                    .long("no-extended")
                    .action(ArgAction::SetTrue)
                    .overrides_with("extended")
                    .help("Treat the whole query as a single fuzzy term"),
            )
            .arg(
                Arg::new("ignore-case")
                    .short('i')
                    .long("ignore-case")
                    .action(ArgAction::SetTrue)
                    .overrides_with("case-sensitive")
                    .help("Case-insensitive match (default is smart case)"),
            )
            .arg(
                Arg::new("case-sensitive")
                    .long("case-sensitive")
                    .action(ArgAction::SetTrue)
                    .overrides_with("ignore-case")
                    .help("Case-sensitive match (also `+i`)"),
            )
            .arg(
                Arg::new("algo")
                    .long("algo")
                    .value_name("TYPE")
                    .value_parser(["v1", "v2", "greedy", "optimal"])
                    .help("Fuzzy matching algorithm: v1 (greedy) or v2 (optimal)"),
            )
            .arg(
                Arg::new("multi")
                    .short('m')
                    .long("multi")
                    .action(ArgAction::SetTrue)
                    .help("Enable multi-select with Tab/Shift-Tab"),
            )
            .arg(
                Arg::new("filter")
                    .short('f')
                    .long("filter")
                    .value_name("STR")
                    .help("Filter mode: print matches for the query and exit"),
            )
            .arg(
                Arg::new("select-1")
                    .short('1')
                    .long("select-1")
                    .action(ArgAction::SetTrue)
                    .help("Automatically select the only match"),
            )
            .arg(
                Arg::new("exit-0")
                    .short('0')
                    .long("exit-0")
                    .action(ArgAction::SetTrue)
                    .help("Exit immediately when there is no match"),
            )
            .arg(
                Arg::new("print-query")
                    .long("print-query")
                    .action(ArgAction::SetTrue)
                    .help("Print the query as the first line"),
            )
            .arg(
                Arg::new("read0")
                    .long("read0")
                    .action(ArgAction::SetTrue)
                    .help("Read input delimited by NUL instead of newline"),
            )
            .arg(
                Arg::new("print0")
                    .long("print0")
                    .action(ArgAction::SetTrue)
                    .help("Print output delimited by NUL instead of newline"),
            )
            .arg(
                Arg::new("input")
                    .long("input")
                    .value_name("FILE")
                    .value_parser(clap::value_parser!(PathBuf))
                    .help("Read candidates from FILE (gzip, bzip2, xz and zstd are decompressed)"),
            )
            .arg(
                Arg::new("threads")
                    .long("threads")
                    .value_name("N")
                    .value_parser(clap::value_parser!(usize))
                    .help("Number of matching threads (default: all cores)"),
            )
            .arg(
                Arg::new("theme")
                    .long("theme")
                    .value_name("NAME")
                    .help("Color theme: default, monochrome, high-contrast"),
            )
            .arg(
                Arg::new("version")
                    .long("version")
                    .action(ArgAction::SetTrue)
                    .help("Print version information"),
            )
    }

    /// Defaults before command-line flags: config file, then `RZF_DEFAULT_COMMAND`.
    pub fn load_defaults() -> Result<Self> {
        let mut options = Self::default();

        #[cfg(feature = "config")]
        file::FileConfig::load()?.apply(&mut options)?;

        if let Some(command) = std::env::var(DEFAULT_COMMAND_ENV)
            .ok()
            .filter(|command| !command.trim().is_empty())
        {
            options.default_command = Some(command);
        }
        Ok(options)
    }

    /// Parse `args` (including the program name) on top of `defaults`.
    pub fn parse_from<I, T>(args: I, defaults: Self) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let matches = Self::command()
            .try_get_matches_from(normalize_args(args))
            .map_err(|e| RzfError::invalid_argument(e.to_string()))?;
        Self::from_matches(&matches, defaults)
    }

    /// Overlay parsed command-line flags on `defaults`.
    pub fn from_matches(matches: &ArgMatches, defaults: Self) -> Result<Self> {
        let mut options = defaults;

        if let Some(query) = matches.get_one::<String>("query") {
            options.query = query.clone();
        }
        if matches.get_flag("exact") {
            options.pattern.exact = true;
        }
        if matches.get_flag("extended") {
            options.pattern.extended = true;
        }
        if matches.get_flag("no-extended") {
            options.pattern.extended = false;
        }
        if matches.get_flag("ignore-case") {
            options.pattern.case = CaseMode::Ignore;
        }
        if matches.get_flag("case-sensitive") {
            options.pattern.case = CaseMode::Respect;
        }
        if let Some(algo) = matches.get_one::<String>("algo") {
            options.algorithm = parse_algorithm(algo)?;
        }

        options.multi |= matches.get_flag("multi");
        options.select_1 |= matches.get_flag("select-1");
        options.exit_0 |= matches.get_flag("exit-0");
        options.print_query |= matches.get_flag("print-query");
        options.read0 |= matches.get_flag("read0");
        options.print0 |= matches.get_flag("print0");
        options.show_version = matches.get_flag("version");

        if let Some(filter) = matches.get_one::<String>("filter") {
            options.filter = Some(filter.clone());
        }
        if let Some(input) = matches.get_one::<PathBuf>("input") {
            options.input = Some(input.clone());
        }
        if let Some(&threads) = matches.get_one::<usize>("threads") {
            options.threads = Some(threads);
        }
        if let Some(theme) = matches.get_one::<String>("theme") {
            options.theme = theme.clone();
        }

        options.validate()?;
        Ok(options)
    }

    fn validate(&self) -> Result<()> {
        if self.threads == Some(0) {
            return Err(RzfError::invalid_argument("--threads must be at least 1"));
        }
        ColorTheme::from_name(&self.theme)?;
        Ok(())
    }

    /// Pick the input: `--input`, else stdin when it is piped, else the generator command.
    pub fn source_spec(&self, stdin_is_terminal: bool) -> SourceSpec {
        if let Some(ref path) = self.input {
            return SourceSpec::File(path.clone());
        }
        if !stdin_is_terminal {
            return SourceSpec::Stdin;
        }
        SourceSpec::Command(
            self.default_command
                .clone()
                .unwrap_or_else(|| DEFAULT_COMMAND.to_string()),
        )
    }

    pub fn delimiter(&self) -> Delimiter {
        if self.read0 {
            Delimiter::Nul
        } else {
            Delimiter::Newline
        }
    }

    /// Byte written after every output line.
    pub fn output_terminator(&self) -> u8 {
        if self.print0 {
            b'\0'
        } else {
            b'\n'
        }
    }

    pub fn matcher_options(&self) -> MatcherOptions {
        MatcherOptions {
            pattern: self.pattern,
            algorithm: self.algorithm,
        }
    }

    /// Session settings; in filter mode the filter string is the query.
    pub fn session_options(&self) -> SessionOptions {
        let mut session = SessionOptions {
            matcher: self.matcher_options(),
            initial_query: self.filter.clone().unwrap_or_else(|| self.query.clone()),
            ..SessionOptions::default()
        };
        if let Some(threads) = self.threads {
            session.threads = threads;
        }
        session
    }

    pub fn app_options(&self) -> AppOptions {
        AppOptions {
            multi: self.multi,
            select_1: self.select_1,
            exit_0: self.exit_0,
        }
    }
}

fn parse_algorithm(name: &str) -> Result<FuzzyAlgorithm> {
    FuzzyAlgorithm::from_name(name)
        .ok_or_else(|| RzfError::invalid_argument(format!("unknown algorithm `{name}`")))
}

#[cfg(feature = "config")]
fn parse_case(name: &str) -> Result<CaseMode> {
    match name {
        "smart" => Ok(CaseMode::Smart),
        "ignore" => Ok(CaseMode::Ignore),
        "respect" => Ok(CaseMode::Respect),
        other => Err(RzfError::config(format!("unknown case mode `{other}`"))),
    }
}

#[cfg(feature = "config")]
pub mod file {
    //! `config.toml` support.

    use super::{parse_algorithm, parse_case, Options};
    use crate::error::{Result, RzfError};
    use serde::Deserialize;
    use std::path::PathBuf;

    /// Environment variable overriding the config file location.
    pub const CONFIG_ENV: &str = "RZF_CONFIG";

    /// Settings accepted in `config.toml`. Every key is optional.
    #[derive(Debug, Default, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
    pub struct FileConfig {
        pub exact: Option<bool>,
        pub extended: Option<bool>,
        /// `smart`, `ignore` or `respect`
        pub case: Option<String>,
        pub algo: Option<String>,
        pub multi: Option<bool>,
        pub threads: Option<usize>,
        pub theme: Option<String>,
        pub default_command: Option<String>,
    }

    impl FileConfig {
        /// `$RZF_CONFIG`, else `<config dir>/rzf/config.toml`.
        pub fn path() -> Option<PathBuf> {
            if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|path| !path.is_empty()) {
                return Some(PathBuf::from(path));
            }
            dirs::config_dir().map(|dir| dir.join("rzf").join("config.toml"))
        }

        /// Load the config file; a missing file yields the defaults.
        pub fn load() -> Result<Self> {
            let Some(path) = Self::path() else {
                return Ok(Self::default());
            };
            match std::fs::read_to_string(&path) {
                Ok(contents) => {
                    log::debug!("loading config from {}", path.display());
                    Self::from_toml(&contents)
                        .map_err(|e| RzfError::config(format!("{}: {e}", path.display())))
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
                Err(e) => Err(RzfError::config(format!(
                    "failed to read {}: {e}",
                    path.display()
                ))),
            }
        }

        pub fn from_toml(contents: &str) -> Result<Self> {
            toml::from_str(contents).map_err(|e| RzfError::config(e.to_string()))
        }

        pub fn apply(&self, options: &mut Options) -> Result<()> {
            if let Some(exact) = self.exact {
                options.pattern.exact = exact;
            }
            if let Some(extended) = self.extended {
                options.pattern.extended = extended;
            }
            if let Some(ref case) = self.case {
                options.pattern.case = parse_case(case)?;
            }
            if let Some(ref algo) = self.algo {
                options.algorithm =
                    parse_algorithm(algo).map_err(|e| RzfError::config(e.to_string()))?;
            }
            if let Some(multi) = self.multi {
                options.multi = multi;
            }
            if let Some(threads) = self.threads {
                options.threads = Some(threads);
            }
            if let Some(ref theme) = self.theme {
                options.theme = theme.clone();
            }
            if let Some(ref command) = self.default_command {
                options.default_command = Some(command.clone());
            }
            Ok(())
        }
    }

}
