//! Album input: newline-delimited JSON, one album per line.

use anyhow::{Context, Result};
use picflow_core::album::Album;
use std::path::Path;

/// Parse every non-blank line of `text` as an album. Lines starting with `#` are skipped.
pub fn parse_albums(text: &str) -> Result<Vec<Album>> {
    let mut albums = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let album: Album =
            serde_json::from_str(line).with_context(|| format!("album on line {}", idx + 1))?;
        albums.push(album);
    }
    Ok(albums)
}

pub async fn load_albums(path: &Path) -> Result<Vec<Album>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read albums: {}", path.display()))?;
    parse_albums(&text).with_context(|| format!("parse albums: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lines_and_skips_blanks_and_comments() {
        let text = r#"
# forum scan 2024-05-01
{"id":"0001","tag":"forum","urls":["https://img.example.com/1.jpg"]}

{"id":"0002","tag":"forum","title":"two","headers":{"Referer":"https://forum.example.com/"}}
"#;
        let albums = parse_albums(text).unwrap();
        assert_eq!(albums.len(), 2);
        assert_eq!(albums[0].urls.len(), 1);
        assert_eq!(albums[1].title, "two");
        assert_eq!(
            albums[1].headers.get("Referer").map(String::as_str),
            Some("https://forum.example.com/")
        );
        assert!(!albums[0].is_retry);
    }

    #[test]
    fn reports_bad_line_number() {
        let text = "{\"id\":\"1\",\"tag\":\"t\"}\n{\"id\":2}\n";
        let err = parse_albums(text).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }
}
