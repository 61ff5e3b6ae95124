use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Display width in terminal cells. Titles are sanitized, so no tab handling.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate to at most `max_cells` terminal cells, ending in `…` when cut.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    if max_cells == 0 {
        return String::new();
    }
    let budget = max_cells - 1;
    let mut used = 0;
    let mut out = String::new();
    for g in s.graphemes(true) {
        let w = display_width(g);
        if used + w > budget {
            break;
        }
        used += w;
        out.push_str(g);
    }
    out.push('\u{2026}');
    out
}

/// Byte offset of the grapheme after the one starting at `offset`,
/// or None at the end of the string.
pub fn next_grapheme_boundary(s: &str, offset: usize) -> Option<usize> {
    let rest = s.get(offset..).filter(|r| !r.is_empty())?;
    let len = rest.graphemes(true).next().map_or(rest.len(), str::len);
    Some(offset + len)
}

/// Byte offset of the grapheme ending at `offset`, or None at the start.
pub fn prev_grapheme_boundary(s: &str, offset: usize) -> Option<usize> {
    let head = s.get(..offset).filter(|h| !h.is_empty())?;
    let len = head.graphemes(true).next_back().map_or(head.len(), str::len);
    Some(offset - len)
}

/// Terminal column of a byte offset.
pub fn byte_offset_to_display_col(s: &str, offset: usize) -> usize {
    display_width(&s[..offset.min(s.len())])
}

fn is_blank(g: &str) -> bool {
    g.chars().all(char::is_whitespace)
}

/// Start of the word left of `offset` (whitespace-delimited).
pub fn word_boundary_left(s: &str, offset: usize) -> usize {
    let graphemes: Vec<(usize, &str)> = s[..offset.min(s.len())].grapheme_indices(true).collect();
    let mut idx = graphemes.len();
    while idx > 0 && is_blank(graphemes[idx - 1].1) {
        idx -= 1;
    }
    while idx > 0 && !is_blank(graphemes[idx - 1].1) {
        idx -= 1;
    }
    graphemes.get(idx).map_or(0, |(i, _)| *i)
}

/// Start of the next word right of `offset` (or the end of the string).
pub fn word_boundary_right(s: &str, offset: usize) -> usize {
    if offset >= s.len() {
        return s.len();
    }
    let mut graphemes = s[offset..].grapheme_indices(true).peekable();
    while graphemes.next_if(|(_, g)| !is_blank(g)).is_some() {}
    while graphemes.next_if(|(_, g)| is_blank(g)).is_some() {}
    graphemes.peek().map_or(s.len(), |(i, _)| offset + i)
}
