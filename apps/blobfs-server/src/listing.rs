//! HTML rendering of directory listings.

use std::fmt::Write;

use blobfs_core::FileInfo;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters escaped in a relative href built from an entry name.
const HREF: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Render `entries` as a minimal HTML page of relative links. Directories
/// get a trailing `/`.
pub fn render(entries: &[FileInfo]) -> String {
    let mut html = String::from(
        "<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n",
    );
    for entry in entries {
        let mut name = entry.name().to_owned();
        if entry.is_dir() {
            name.push('/');
        }
        // A leading "./" keeps names containing ':' from parsing as a scheme.
        let href = utf8_percent_encode(&name, HREF);
        let _ = writeln!(html, "<a href=\"./{href}\">{}</a>", escape_html(&name));
    }
    html.push_str("</pre>\n");
    html
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use blobfs_store::Attributes;
    use chrono::Utc;

    use super::*;

    fn blob(key: &str) -> FileInfo {
        FileInfo::blob(
            key,
            Attributes {
                size: 1,
                mod_time: Utc::now(),
                md5: None,
                content_type: None,
            },
        )
    }

    #[test]
    fn test_should_link_files_and_directories() {
        let html = render(&[blob("bar"), FileInfo::directory("biz/"), blob("foo")]);
        assert!(html.starts_with("<!doctype html>"));
        assert!(html.contains("<a href=\"./bar\">bar</a>\n"));
        assert!(html.contains("<a href=\"./biz/\">biz/</a>\n"));
        assert!(html.contains("<a href=\"./foo\">foo</a>\n"));
        assert!(html.ends_with("</pre>\n"));
    }

    #[test]
    fn test_should_escape_names() {
        let html = render(&[blob("a b<c>.txt")]);
        assert!(html.contains("href=\"./a%20b%3Cc%3E.txt\""));
        assert!(html.contains(">a b&lt;c&gt;.txt</a>"));
    }

    #[test]
    fn test_should_render_empty_listing() {
        assert_eq!(
            render(&[]),
            "<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n</pre>\n"
        );
    }
}
