//! Recover the original text of a call expression from its module source.

/// Half-open byte range `[start, end)` into a module's source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRange {
    pub start: usize,
    pub end: usize,
}

impl SourceRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build a byte range from UTF-16 code unit offsets, as reported by
    /// JavaScript hosts (webpack expression ranges are string indices).
    ///
    /// Returns `None` if either offset lies past the end of `source` or
    /// points into the middle of a surrogate pair.
    pub fn from_utf16(source: &str, start: usize, end: usize) -> Option<Self> {
        let start = utf16_to_byte_offset(source, start)?;
        let end = utf16_to_byte_offset(source, end)?;
        Some(Self { start, end })
    }
}

fn utf16_to_byte_offset(source: &str, offset: usize) -> Option<usize> {
    let mut units = 0usize;
    for (byte_index, ch) in source.char_indices() {
        if units == offset {
            return Some(byte_index);
        }
        units += ch.len_utf16();
        if units > offset {
            return None;
        }
    }
    (units == offset).then_some(source.len())
}

/// Slice `range` out of `source`.
///
/// `None` when the module has no retained source text, or when the range is
/// inverted, out of bounds, or not on character boundaries. Callers skip the
/// call site in that case.
pub fn slice_source(source: Option<&str>, range: SourceRange) -> Option<&str> {
    source?.get(range.start..range.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_exact_substring() {
        let source = "const a = Drupal.t('Hello');";
        let range = SourceRange::new(10, 27);
        assert_eq!(slice_source(Some(source), range), Some("Drupal.t('Hello')"));
    }

    #[test]
    fn test_slice_without_source() {
        assert_eq!(slice_source(None, SourceRange::new(0, 3)), None);
    }

    #[test]
    fn test_slice_out_of_bounds() {
        assert_eq!(slice_source(Some("abc"), SourceRange::new(1, 10)), None);
    }

    #[test]
    fn test_slice_inverted_range() {
        assert_eq!(slice_source(Some("abcdef"), SourceRange::new(4, 2)), None);
    }

    #[test]
    fn test_slice_rejects_split_character() {
        // 'é' is two bytes, offset 1 falls inside it
        assert_eq!(slice_source(Some("é"), SourceRange::new(1, 2)), None);
    }

    #[test]
    fn test_from_utf16_ascii_matches_bytes() {
        let range = SourceRange::from_utf16("Drupal.t('x')", 0, 13).unwrap();
        assert_eq!(range, SourceRange::new(0, 13));
    }

    #[test]
    fn test_from_utf16_multibyte() {
        // "ü" is 1 UTF-16 unit and 2 bytes, "😀" is 2 units and 4 bytes
        let source = "ü😀Drupal.t('a')";
        let range = SourceRange::from_utf16(source, 3, 16).unwrap();
        assert_eq!(slice_source(Some(source), range), Some("Drupal.t('a')"));
    }

    #[test]
    fn test_from_utf16_inside_surrogate_pair() {
        assert_eq!(SourceRange::from_utf16("😀", 1, 2), None);
    }

    #[test]
    fn test_from_utf16_past_end() {
        assert_eq!(SourceRange::from_utf16("abc", 0, 4), None);
    }
}
