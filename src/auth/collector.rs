//! Interactive collector backed by browser exports.
//!
//! The user signs in to NotebookLM in their browser, exports the session
//! cookies as DevTools JSON and saves the page source. Paths can be given up
//! front or typed in when prompted.

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::extract::parse_cookie_export;
use super::lifecycle::{AuthCollector, CollectError, CollectedAuth};

/// Page the user must be signed in to.
pub const DEFAULT_TARGET_URL: &str = "https://notebooklm.google.com/";

/// Where one collector input comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportSource {
    /// Read from this file.
    File(PathBuf),
    /// Ask for a path on the interactive input.
    Prompt,
}

/// [`AuthCollector`] that reads a cookie export and saved page markup.
pub struct ExportCollector<R, W> {
    cookies: ExportSource,
    html: ExportSource,
    target_url: String,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ExportCollector<R, W> {
    /// Creates a collector; prompts are written to `output` and answered on `input`.
    pub fn new(cookies: ExportSource, html: ExportSource, input: R, output: W) -> Self {
        Self {
            cookies,
            html,
            target_url: DEFAULT_TARGET_URL.to_string(),
            input,
            output,
        }
    }

    /// Overrides the page named in the login instructions.
    #[must_use]
    pub fn with_target_url(mut self, target_url: impl Into<String>) -> Self {
        self.target_url = target_url.into();
        self
    }

    fn print_instructions(&mut self) -> Result<(), CollectError> {
        writeln!(self.output, "NotebookLM browser login")?;
        writeln!(
            self.output,
            "1. Open {} in Chrome and sign in.",
            self.target_url
        )?;
        writeln!(
            self.output,
            "2. Export the site cookies as JSON (DevTools `Network.getAllCookies` or a cookie export extension)."
        )?;
        writeln!(
            self.output,
            "3. Save the signed-in page source (view-source, then save) to a file."
        )?;
        self.output.flush()?;
        Ok(())
    }

    fn resolve(&mut self, source: &ExportSource, label: &str) -> Result<PathBuf, CollectError> {
        match source {
            ExportSource::File(path) => Ok(path.clone()),
            ExportSource::Prompt => {
                write!(self.output, "Path to {label}: ")?;
                self.output.flush()?;

                let mut line = String::new();
                self.input.read_line(&mut line)?;
                let answer = line.trim();
                if answer.is_empty() {
                    return Err(CollectError::Aborted(format!("no {label} path provided")));
                }
                Ok(PathBuf::from(answer))
            }
        }
    }

    fn needs_prompt(&self) -> bool {
        self.cookies == ExportSource::Prompt || self.html == ExportSource::Prompt
    }
}

fn read_file(path: &Path) -> Result<String, CollectError> {
    fs::read_to_string(path).map_err(|source| CollectError::Read {
        path: path.to_path_buf(),
        source,
    })
}

impl<R: BufRead, W: Write> AuthCollector for ExportCollector<R, W> {
    fn collect(&mut self) -> Result<CollectedAuth, CollectError> {
        if self.needs_prompt() {
            self.print_instructions()?;
        }

        let cookies_source = self.cookies.clone();
        let cookies_path = self.resolve(&cookies_source, "cookie export JSON")?;
        let cookies = parse_cookie_export(&read_file(&cookies_path)?)?;
        debug!(path = %cookies_path.display(), entries = cookies.len(), "read cookie export");

        let html_source = self.html.clone();
        let html_path = self.resolve(&html_source, "saved page HTML")?;
        let html = read_file(&html_path)?;
        debug!(path = %html_path.display(), bytes = html.len(), "read page markup");

        info!(cookies = cookies.len(), "Collected browser session export");
        Ok(CollectedAuth { cookies, html })
    }
}
