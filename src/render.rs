//! HTML rendering of the display tables.

use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use crate::error::WatchError;
use crate::fs_abstraction::FileSystem;
use crate::table::{DisplayRow, DisplayTable};

/// Timestamp format of the Date column
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const STYLE: &str = "\
body { font-family: Arial; }
table { border-collapse: collapse; margin-top: 10px; margin-bottom: 20px; }
th, td { border: 1px solid #333; padding: 6px 10px; text-align: center; }
th { background: #eee; }
.low { background-color: #d4edda; }
.medium { background-color: #fff3cd; }
.high { background-color: #f8d7da; }
.blocked { background-color: #f5c6cb; font-weight: bold; }
";

const HEADER_ROW: &str = "<tr><th>Date</th><th>IP</th><th>Frontend</th>\
<th>Current connections</th><th>Total connections</th></tr>";

/// Escape text for HTML element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Flag image for a country label, nothing for an empty label.
fn flag_html(label: &str) -> String {
    if label.is_empty() {
        return String::new();
    }
    let code = escape_html(&label.to_ascii_lowercase());
    format!(
        "<img src=\"https://flagcdn.com/16x12/{code}.png\" alt=\"{code}\" title=\"{upper}\"> ",
        code = code,
        upper = code.to_ascii_uppercase()
    )
}

fn render_row(out: &mut String, row: &DisplayRow) {
    let _ = writeln!(
        out,
        "<tr class=\"{}\"><td>{}</td><td>{}{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        row.severity.css_class(),
        row.timestamp.format(DATE_FORMAT),
        flag_html(&row.label),
        escape_html(&row.address),
        escape_html(&row.frontend),
        row.current_connections,
        row.cumulative_connections,
    );
}

fn render_table(out: &mut String, table: &DisplayTable) {
    let _ = writeln!(out, "<table id=\"{}\">", table.kind());
    out.push_str(HEADER_ROW);
    out.push('\n');
    for row in table.rows() {
        render_row(out, row);
    }
    out.push_str("</table>\n");
}

/// Render the whole status page.
pub fn render_document(allowed: &DisplayTable, blocked: &DisplayTable, refresh: Duration) -> String {
    let mut out = String::with_capacity(4096 + 256 * (allowed.len() + blocked.len()));

    out.push_str("<html>\n<head><title>Connection statistics</title>\n");
    let _ = writeln!(
        out,
        "<meta http-equiv='refresh' content='{}'>",
        refresh.as_secs().max(1)
    );
    out.push_str("<style>\n");
    out.push_str(STYLE);
    out.push_str("</style>\n</head>\n<body>\n<h1>Connection statistics</h1>\n\n");

    out.push_str("<h2>Allowed active connections</h2>\n");
    render_table(&mut out, allowed);

    out.push_str("\n<h2>Blocked connection attempts</h2>\n");
    render_table(&mut out, blocked);

    out.push_str("</body>\n</html>\n");
    out
}

/// Atomically replace the page at `path`.
pub fn publish(fs: &dyn FileSystem, path: &Path, document: &str) -> Result<(), WatchError> {
    fs.write_atomic(path, document.as_bytes())
        .map_err(|e| WatchError::Render {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}
