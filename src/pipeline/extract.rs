//! Fenced code extraction. Only the first well-formed ```python block is
//! used; prose, other languages, and malformed fences are never executed.

const OPEN_TAG: &str = "```python";
const CLOSE_TAG: &str = "\n```";

/// Inner text of the first well-formed ```python fence, without the markers.
/// A well-formed fence is the open tag followed directly by a newline, closed
/// by ``` at the start of a later line. Malformed openings are skipped rather
/// than matched greedily across unrelated blocks.
pub fn extract_python_block(raw: &str) -> Option<&str> {
    let mut offset = 0;
    while let Some(pos) = raw[offset..].find(OPEN_TAG) {
        let tag_start = offset + pos;
        let body_start = tag_start + OPEN_TAG.len();
        let rest = &raw[body_start..];

        let body = rest
            .strip_prefix("\r\n")
            .or_else(|| rest.strip_prefix('\n'));

        match body {
            Some(body) => {
                if let Some(end) = body.find(CLOSE_TAG) {
                    return Some(&body[..end]);
                }
                // unterminated fence: nothing after this point can be valid
                return None;
            }
            None => {
                // not a fence opening (e.g. "```python3" or inline mention)
                offset = body_start;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_inner_text_only() {
        let raw = "Here is the code:\n```python\nresult = len(df)\n```\nHope that helps!";
        assert_eq!(extract_python_block(raw), Some("result = len(df)"));
    }

    #[test]
    fn multi_line_blocks_are_kept_whole() {
        let raw = "```python\nimport math\n\ntotal = df['a'].sum()\nresult = total\n```";
        assert_eq!(
            extract_python_block(raw),
            Some("import math\n\ntotal = df['a'].sum()\nresult = total")
        );
    }

    #[test]
    fn only_the_first_block_is_used() {
        let raw = "```python\nresult = 1\n```\ntext\n```python\nresult = 2\n```";
        assert_eq!(extract_python_block(raw), Some("result = 1"));
    }

    #[test]
    fn plain_prose_is_not_found() {
        assert_eq!(extract_python_block("The answer is 3."), None);
    }

    #[test]
    fn other_languages_are_not_found() {
        assert_eq!(extract_python_block("```json\n{\"a\": 1}\n```"), None);
    }

    #[test]
    fn malformed_opening_is_skipped() {
        let raw = "```python3 is great\n```python\nresult = 5\n```";
        assert_eq!(extract_python_block(raw), Some("result = 5"));
    }

    #[test]
    fn unterminated_fence_is_not_found() {
        assert_eq!(extract_python_block("```python\nresult = 1"), None);
    }

    #[test]
    fn crlf_fences_are_accepted() {
        let raw = "```python\r\nresult = 7\n```";
        assert_eq!(extract_python_block(raw), Some("result = 7"));
    }
}
