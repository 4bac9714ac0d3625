//! rzf - Interactive Terminal Fuzzy Finder
//!
//! Reads candidate lines, lets the user pick with a fuzzy query, and prints the choice.

use anyhow::{Context, Result};
use rzf::app::{run_filter, Application, Outcome};
use rzf::config::{normalize_args, BuildInfo, Options};
use rzf::render::ui::{ColorTheme, TerminalUI};
use rzf::session::SessionController;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::process::ExitCode;

const EXIT_SELECTED: u8 = 0;
const EXIT_NO_MATCH: u8 = 1;
const EXIT_ERROR: u8 = 2;
const EXIT_ABORTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    // The TUI owns the terminal, so logging stays off unless RZF_LOG asks for it.
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("RZF_LOG", "off")).init();

    // Exits with status 2 on bad arguments.
    let matches = Options::command().get_matches_from(normalize_args(std::env::args_os()));

    let options = match Options::load_defaults().and_then(|d| Options::from_matches(&matches, d)) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("rzf: {err}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if options.show_version {
        println!("{}", BuildInfo::current().describe());
        return ExitCode::SUCCESS;
    }

    match run(options).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("rzf: {err:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn run(options: Options) -> Result<u8> {
    let terminator = options.output_terminator();
    let spec = options.source_spec(io::stdin().is_terminal());
    let source = spec
        .open(options.delimiter())
        .await
        .context("failed to open input")?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if let Some(ref query) = options.filter {
        if options.print_query {
            write_line(&mut out, query, terminator)?;
        }
        let report = run_filter(source, options.session_options(), &mut out, terminator).await?;
        return Ok(if report.matched > 0 {
            EXIT_SELECTED
        } else {
            EXIT_NO_MATCH
        });
    }

    let theme = ColorTheme::from_name(&options.theme)?;
    let ui = Box::new(TerminalUI::with_theme(theme)?);
    let session = SessionController::start(source, options.session_options());
    let outcome = Application::new(session, ui, options.app_options())
        .run()
        .await?;

    let code = match outcome {
        Outcome::Selected { query, lines } => {
            if options.print_query {
                write_line(&mut out, &query, terminator)?;
            }
            for line in &lines {
                write_line(&mut out, line, terminator)?;
            }
            EXIT_SELECTED
        }
        Outcome::NoMatch { query } => {
            if options.print_query {
                write_line(&mut out, &query, terminator)?;
            }
            EXIT_NO_MATCH
        }
        Outcome::Aborted => EXIT_ABORTED,
    };
    out.flush().context("failed to write output")?;
    Ok(code)
}

fn write_line(out: &mut impl Write, line: &str, terminator: u8) -> Result<()> {
    out.write_all(line.as_bytes())
        .and_then(|_| out.write_all(&[terminator]))
        .context("failed to write output")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert!(!rzf::VERSION.is_empty());
    }

    #[test]
    fn test_write_line_uses_terminator() {
        let mut out = Vec::new();
        write_line(&mut out, "a", b'\0').unwrap();
        write_line(&mut out, "b", b'\n').unwrap();
        assert_eq!(out, b"a\0b\n");
    }
}
