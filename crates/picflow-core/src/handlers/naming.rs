//! On-disk names for saved albums.

use crate::album::Album;

/// Sanitizes a path component for Linux.
///
/// - Replaces NUL, `/`, `\`, whitespace and control characters with `_`
/// - Collapses consecutive underscores
/// - Trims leading/trailing dots and underscores
/// - Limits length to 255 bytes (Linux NAME_MAX)
pub fn sanitize_component(name: &str) -> String {
    const NAME_MAX: usize = 255;

    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;
    for c in name.chars() {
        let c = if c == '\0' || c == '/' || c == '\\' || c.is_control() || c.is_whitespace() {
            '_'
        } else {
            c
        };
        if c == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    if trimmed.len() <= NAME_MAX {
        return trimmed.to_string();
    }
    let mut take = NAME_MAX;
    while take > 0 && !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    trimmed[..take].to_string()
}

/// Directory name for an album: `<id>_<title>`, or just the id.
pub fn album_dir_name(album: &Album) -> String {
    let raw = if album.title.trim().is_empty() {
        album.id.clone()
    } else {
        format!("{}_{}", album.id, album.title)
    };
    match sanitize_component(&raw) {
        s if s.is_empty() => "album".to_string(),
        s => s,
    }
}

/// File name for the `index`-th picture: last URL path segment, or `NNN.bin`.
/// Prefixed with the index so two pictures sharing a name do not collide.
pub fn picture_file_name(url: &str, index: usize) -> String {
    let segment = url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segs| segs.next_back().map(str::to_string))
        })
        .map(|s| sanitize_component(&s))
        .filter(|s| !s.is_empty());
    match segment {
        Some(name) => format!("{:03}_{}", index + 1, name),
        None => format!("{:03}.bin", index + 1),
    }
}
