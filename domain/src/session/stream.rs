//! Model reply stream.

/// One item from a reply stream.
///
/// A well-behaved stream is any number of `Delta`s followed by exactly one
/// `Completed` or `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Next piece of reply text.
    Delta(String),
    /// End of reply. Carries the whole text for transports that do not
    /// send deltas.
    Completed(String),
    /// The transport broke mid-reply.
    Error(String),
}

/// Cut `text` into pieces of `chunk_chars` characters (the last may be
/// shorter). A size of 0 is treated as 1.
pub fn chunk_text(text: &str, chunk_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut count = 0;
    for c in text.chars() {
        current.push(c);
        count += 1;
        if count == chunk_chars.max(1) {
            pieces.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}
