//! Code block extraction from model replies

use regex::Regex;
use std::sync::LazyLock;

static CODE_BLOCK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n(.*?)```").expect("code block pattern is valid")
});

/// Every fenced code block in `text`, in order of appearance, trimmed.
///
/// Empty blocks are skipped.
pub fn extract_code_blocks(text: &str) -> Vec<String> {
    CODE_BLOCK_PATTERN
        .captures_iter(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|code| !code.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_python_block() {
        let reply = "Here you go:\n```python\nprint('hi')\n```\nGood luck!";
        assert_eq!(extract_code_blocks(reply), vec!["print('hi')"]);
    }

    #[test]
    fn test_multiple_blocks_keep_order() {
        let reply = "```python\nfirst()\n```\ntext\n```\nsecond()\n```";
        assert_eq!(extract_code_blocks(reply), vec!["first()", "second()"]);
    }

    #[test]
    fn test_no_blocks() {
        assert!(extract_code_blocks("I cannot help with that").is_empty());
    }

    #[test]
    fn test_empty_block_skipped() {
        assert!(extract_code_blocks("```python\n\n```").is_empty());
    }
}
