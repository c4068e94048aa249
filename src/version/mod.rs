//! Version-tag normalization and defensive parsing of `openclaw` CLI output.
//!
//! Everything in this module is pure and total: no I/O, no panics on
//! arbitrary input. The `openclaw update status` table has no schema
//! anywhere, so [`parse_openclaw_update_status`] treats it as a fuzzily
//! parsed external contract: keyword matching with empty-string and `false`
//! defaults when nothing recognizable is present. The exact sample rows we
//! have observed are pinned in the tests below; do not tighten the grammar
//! beyond them.
//!
//! Tag conventions differ per target and are preserved deliberately: panel
//! tags always carry a leading `v` ([`normalize_tag`]), bot tags never do
//! ([`strip_leading_v`], the `openclaw` CLI convention).

use regex::Regex;
use std::sync::OnceLock;

use crate::core::{Result, UpdateError};

/// `YYYY.M.P[-suffix]`, the date-shaped scheme both products release under.
const DATE_VERSION: &str = r"\d{4}\.\d{1,3}\.\d{1,3}(?:-[0-9A-Za-z.]+)?";

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern"))
}

/// Remove one leading `v`/`V` from a tag. Idempotent.
pub fn strip_leading_v(text: &str) -> &str {
    text.strip_prefix(['v', 'V']).unwrap_or(text)
}

/// Ensure exactly one leading `v`. Empty input yields empty output.
pub fn normalize_tag(text: &str) -> String {
    let stripped = strip_leading_v(text.trim());
    if stripped.is_empty() {
        String::new()
    } else {
        format!("v{stripped}")
    }
}

/// Validate an `owner/repo` string, or fall back to a default.
///
/// Empty input returns `fallback`; non-empty input that does not match the
/// `owner/repo` shape is rejected with a validation error before any
/// network call can be made with it.
pub fn normalize_repo(text: &str, fallback: &str) -> Result<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = regex(&RE, r"^[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+$");

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(fallback.to_string());
    }
    if !re.is_match(trimmed) {
        return Err(UpdateError::validation(format!(
            "invalid release repo {trimmed:?}: expected owner/repo"
        )));
    }
    Ok(trimmed.to_string())
}

/// Extract a version from free text, best effort.
///
/// Prefers a date-shaped `YYYY.M.P[-suffix]` token anywhere in the text,
/// then falls back to the first whitespace-delimited token with any leading
/// `v` stripped. Returns the empty string when there is nothing to find;
/// callers must tolerate empty.
pub fn parse_version_from_text(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = regex(&RE, &format!(r"v?({DATE_VERSION})"));

    if let Some(caps) = re.captures(text) {
        return caps[1].to_string();
    }
    text.split_whitespace()
        .next()
        .map(|token| strip_leading_v(token).to_string())
        .unwrap_or_default()
}

/// Structured view of the `openclaw update status` table.
///
/// Every field defaults to empty/`false` when the corresponding row or
/// keyword is absent; nothing in here is trustworthy enough to panic over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUpdateStatus {
    /// Raw content of the `Install` row, if one was found.
    pub install_raw: String,
    /// Raw content of the `Update` row, if one was found.
    pub update_raw: String,
    /// `"source"` for git/checkout installs, `"global"` otherwise.
    pub install_method: String,
    /// `"openclaw-update"` for source installs, `"package-manager"` otherwise.
    pub strategy: String,
    /// Newest version mentioned by the CLI, empty when none was found.
    pub latest_tag: String,
    /// True only when an "available" keyword is present and no
    /// "up to date" keyword is.
    pub update_available: bool,
}

fn table_row<'t>(raw: &'t str, label: &'static OnceLock<Regex>, pattern: &str) -> &'t str {
    regex(label, pattern)
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().trim_end_matches(['│', '|']).trim())
        .unwrap_or("")
}

/// Pull the newest-version token out of one chunk of CLI text.
///
/// Tries, in order: an `npm update <version>` token, a `latest:` label, an
/// `available ... <version>` phrase, then any bare date-shaped version.
fn extract_latest(text: &str) -> String {
    static NPM: OnceLock<Regex> = OnceLock::new();
    static LATEST: OnceLock<Regex> = OnceLock::new();
    static AVAILABLE: OnceLock<Regex> = OnceLock::new();
    static BARE: OnceLock<Regex> = OnceLock::new();

    let candidates: [&Regex; 4] = [
        regex(&NPM, &format!(r"(?i)npm\s+update\s+v?({DATE_VERSION})")),
        regex(&LATEST, &format!(r"(?i)latest:\s*v?({DATE_VERSION})")),
        regex(&AVAILABLE, &format!(r"(?i)available\b[^\n]*?v?({DATE_VERSION})")),
        regex(&BARE, &format!(r"v?({DATE_VERSION})")),
    ];

    for re in candidates {
        if let Some(caps) = re.captures(text) {
            return caps[1].to_string();
        }
    }
    String::new()
}

/// Scrape the pipe-delimited `openclaw update status` table.
///
/// The CLI's exact column widths and spacing are not guaranteed, so rows
/// are located by label keyword rather than by position, and both `│`
/// (box drawing) and `|` (ASCII) delimiters are accepted.
pub fn parse_openclaw_update_status(raw: &str) -> ParsedUpdateStatus {
    static INSTALL_ROW: OnceLock<Regex> = OnceLock::new();
    static UPDATE_ROW: OnceLock<Regex> = OnceLock::new();
    static SOURCE_KEYWORDS: OnceLock<Regex> = OnceLock::new();
    static AVAILABLE: OnceLock<Regex> = OnceLock::new();
    static UP_TO_DATE: OnceLock<Regex> = OnceLock::new();

    let install_raw =
        table_row(raw, &INSTALL_ROW, r"(?im)^[^\r\n]*?\binstall\b\s*[│|:]\s*([^\r\n]+)$");
    let update_raw =
        table_row(raw, &UPDATE_ROW, r"(?im)^[^\r\n]*?\bupdate\b\s*[│|:]\s*([^\r\n]+)$");

    let source_install = regex(
        &SOURCE_KEYWORDS,
        r"(?i)\b(git|source|checkout|workspace|repo)\b",
    )
    .is_match(install_raw);
    let install_method = if source_install { "source" } else { "global" };
    let strategy = if source_install {
        "openclaw-update"
    } else {
        "package-manager"
    };

    let latest_tag = {
        let from_row = extract_latest(update_raw);
        if from_row.is_empty() {
            extract_latest(raw)
        } else {
            from_row
        }
    };

    let update_available = regex(&AVAILABLE, r"(?i)\bavailable\b").is_match(raw)
        && !regex(&UP_TO_DATE, r"(?i)\bup[ -]?to[ -]?date\b").is_match(raw);

    ParsedUpdateStatus {
        install_raw: install_raw.to_string(),
        update_raw: update_raw.to_string(),
        install_method: install_method.to_string(),
        strategy: strategy.to_string(),
        latest_tag,
        update_available,
    }
}
