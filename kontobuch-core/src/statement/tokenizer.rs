//! Splitting statement text into tagged blocks

use tracing::{debug, warn};

/// Tag delimiter that opens a new block at the start of a line
const TAG_DELIMITER: char = ':';

/// One tagged field of a statement, e.g. tag `61` with its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementBlock {
    pub tag: String,
    pub payload: String,
}

impl StatementBlock {
    /// Split a block string (`:61:2301...`) into tag and payload
    ///
    /// A block without a closing delimiter gets an empty tag and is ignored
    /// by the parser.
    pub fn from_raw(raw: &str) -> Self {
        let body = raw.strip_prefix(TAG_DELIMITER).unwrap_or(raw);
        match body.split_once(TAG_DELIMITER) {
            Some((tag, payload)) => Self {
                tag: tag.to_string(),
                payload: payload.to_string(),
            },
            None => Self {
                tag: String::new(),
                payload: body.to_string(),
            },
        }
    }
}

/// Split statement text into block strings, each starting with its tag
///
/// Lines not starting with `:` continue the open block and are appended
/// without a separator, which rejoins payloads the bank wrapped across
/// lines. Whitespace-only lines are dropped without closing the block.
pub fn split_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Option<String> = None;

    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.starts_with(TAG_DELIMITER) {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            current = Some(line.to_string());
        } else if !line.trim().is_empty() {
            match current.as_mut() {
                Some(block) => block.push_str(line),
                None => warn!("Dropping statement text before the first tag"),
            }
        }
    }

    if let Some(block) = current {
        blocks.push(block);
    }

    debug!(blocks = blocks.len(), "Statement split into blocks");
    blocks
}

/// Split statement text into parsed [`StatementBlock`]s
pub fn tokenize(text: &str) -> Vec<StatementBlock> {
    split_blocks(text)
        .iter()
        .map(|raw| StatementBlock::from_raw(raw))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(split_blocks("").is_empty());
        assert!(split_blocks("\n  \n").is_empty());
    }

    #[test]
    fn test_continuation_lines_are_joined() {
        let text = ":20:REF1\n:86:166?00GUTSCHRIFT?20SVWZ+Inv\noice 123?32ACME\n:62F:C230131EUR130,00";
        let blocks = split_blocks(text);
        assert_eq!(
            blocks,
            vec![
                ":20:REF1",
                ":86:166?00GUTSCHRIFT?20SVWZ+Invoice 123?32ACME",
                ":62F:C230131EUR130,00",
            ]
        );
    }

    #[test]
    fn test_blank_lines_do_not_break_block() {
        let blocks = split_blocks(":86:166?20Part one\n   \n two");
        assert_eq!(blocks, vec![":86:166?20Part one two"]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let blocks = split_blocks(":20:REF1\r\n:25:12345678/DE00ACCOUNT\r\n");
        assert_eq!(blocks, vec![":20:REF1", ":25:12345678/DE00ACCOUNT"]);
    }

    #[test]
    fn test_text_before_first_tag_is_dropped() {
        let blocks = split_blocks("header line\n:20:REF1");
        assert_eq!(blocks, vec![":20:REF1"]);
    }

    #[test]
    fn test_block_tags() {
        let blocks = tokenize(":60F:C230101EUR100,00\n:61:2301010101C50,00NTRF\nno-tag");
        assert_eq!(blocks[0].tag, "60F");
        assert_eq!(blocks[0].payload, "C230101EUR100,00");
        assert_eq!(blocks[1].tag, "61");
        assert_eq!(blocks[1].payload, "2301010101C50,00NTRFno-tag");
    }

    #[test]
    fn test_block_without_closing_delimiter() {
        let block = StatementBlock::from_raw(":garbage");
        assert_eq!(block.tag, "");
        assert_eq!(block.payload, "garbage");
    }
}
