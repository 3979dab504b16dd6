//! Index arithmetic for the "N words" and "paragraph" jumps.
//!
//! These are pure functions; `ReaderSession` pauses playback and then seeks
//! to whatever they return. The forward ceiling is the last word
//! (`len - 1`), so a jump never lands on the past-the-end position.

/// Default number of words moved by the word-jump controls.
pub const DEFAULT_WORD_STEP: usize = 10;

pub fn back_words(current: usize, n: usize) -> usize {
    current.saturating_sub(n)
}

pub fn forward_words(len: usize, current: usize, n: usize) -> usize {
    current.saturating_add(n).min(last_index(len))
}

/// Start of the current paragraph, or of the previous one when already
/// sitting on a paragraph start.
pub fn back_paragraph(boundaries: &[usize], current: usize) -> usize {
    // Number of boundaries <= current; the last of those owns `current`.
    let owners = boundaries.partition_point(|&start| start <= current);
    if owners == 0 {
        return 0;
    }
    let paragraph = owners - 1;
    let start = boundaries[paragraph];
    if current == start {
        if paragraph == 0 {
            0
        } else {
            boundaries[paragraph - 1]
        }
    } else {
        start
    }
}

/// Start of the next paragraph, or the last word when there is none.
pub fn forward_paragraph(len: usize, boundaries: &[usize], current: usize) -> usize {
    let next = boundaries.partition_point(|&start| start <= current);
    match boundaries.get(next) {
        Some(&start) if start < len => start,
        _ => last_index(len),
    }
}

/// Zero-based paragraph number containing `index`.
pub fn paragraph_of(boundaries: &[usize], index: usize) -> usize {
    boundaries
        .partition_point(|&start| start <= index)
        .saturating_sub(1)
}

fn last_index(len: usize) -> usize {
    len.saturating_sub(1)
}
