//! Logging setup.
//!
//! Everything written by the `tracing` subscriber passes through a
//! redacting writer so Telegram bot tokens and the backend secret never end
//! up in logs (teloxide and reqwest errors like to include request URLs).

use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting sensitive data
pub struct RedactionPatterns {
    token_url: Regex,
    token_bare: Regex,
    token_prefixed: Regex,
    bot_token_env: Regex,
    bot_token_header: Regex,
}

impl RedactionPatterns {
    /// Compiles all patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token_url: Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)")?,
            token_bare: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            token_prefixed: Regex::new(r"(bot[0-9]{8,10}:)[A-Za-z0-9_-]+")?,
            bot_token_env: Regex::new(r"BOT_TOKEN=[^\s&]+")?,
            bot_token_header: Regex::new(r#"(?i)("?x-bot-token"?\s*[:=]\s*"?)[^"\s,}]+"#)?,
        })
    }

    /// Masks every secret found in `input`.
    #[must_use]
    pub fn redact(&self, input: &str) -> String {
        let output = self
            .token_url
            .replace_all(input, "$1[TELEGRAM_TOKEN]$3");
        let output = self.token_bare.replace_all(&output, "[TELEGRAM_TOKEN]");
        let output = self
            .token_prefixed
            .replace_all(&output, "$1[TELEGRAM_TOKEN]");
        let output = self
            .bot_token_env
            .replace_all(&output, "BOT_TOKEN=[MASKED]");
        self.bot_token_header
            .replace_all(&output, "${1}[MASKED]")
            .into_owned()
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        self.inner
            .write_all(self.patterns.redact(&s).as_bytes())?;
        // Report the original length; the redacted text may differ in size
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: (self.make_inner)(),
            patterns: self.patterns.clone(),
        }
    }
}

/// Installs the global subscriber: `RUST_LOG` filter (default `info`),
/// formatted output to stderr through the redacting writer.
pub fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter {
        make_inner: io::stderr,
        patterns,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}
