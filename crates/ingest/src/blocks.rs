/// Splits extracted document text into blocks.
///
/// A block is a run of non-blank lines; blank lines (including lines holding
/// only whitespace or page breaks) separate blocks. Blocks are trimmed and
/// empty ones dropped, so pages without extractable text yield nothing.
pub fn split_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        let cleaned = line.trim_matches('\u{c}');
        if cleaned.trim().is_empty() || line.contains('\u{c}') {
            flush(&mut blocks, &mut current);
            if cleaned.trim().is_empty() {
                continue;
            }
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(cleaned.trim_end());
    }
    flush(&mut blocks, &mut current);

    blocks
}

fn flush(blocks: &mut Vec<String>, current: &mut String) {
    let block = current.trim();
    if !block.is_empty() {
        blocks.push(block.to_string());
    }
    current.clear();
}
