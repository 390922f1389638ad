pub fn format_span(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    let minutes = total / 60;
    let seconds = total % 60;

    if minutes == 0 {
        format!("{seconds}s")
    } else {
        format!("{minutes}m {seconds:02}s")
    }
}

/// Leading characters of a transaction hash, enough to tell nodes apart.
pub fn short_hash(hash: &str) -> &str {
    const SHORT_LEN: usize = 12;
    hash.char_indices()
        .nth(SHORT_LEN)
        .map(|(end, _)| &hash[..end])
        .unwrap_or(hash)
}
