//! Small helpers shared by the library and the CLI.

pub mod date;
pub mod path;

/// Format count with noun, handling pluralization
///
/// `plural_count(1, "icon")` -> `"1 icon"`, `plural_count(3, "icon")` -> `"3 icons"`
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "icon"), "0 icons");
        assert_eq!(plural_count(1, "icon"), "1 icon");
        assert_eq!(plural_count(12, "file"), "12 files");
    }
}
