/// Splits `items` into consecutive batches of at most `size` items.
/// A zero size is treated as one.
pub fn batches<T>(items: &[T], size: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(size.max(1))
}

/// Truncates to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_count_is_ceiling_and_order_preserved() {
        let items: Vec<u32> = (0..12).collect();
        let chunks: Vec<&[u32]> = batches(&items, 5).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], &[0, 1, 2, 3, 4]);
        assert_eq!(chunks[2], &[10, 11]);
        let flattened: Vec<u32> = chunks.concat();
        assert_eq!(flattened, items);
    }

    #[test]
    fn test_exact_multiple_and_empty() {
        let items = [1, 2, 3, 4];
        assert_eq!(batches(&items, 2).count(), 2);
        let empty: [u8; 0] = [];
        assert_eq!(batches(&empty, 5).count(), 0);
    }

    #[test]
    fn test_zero_size_means_one() {
        assert_eq!(batches(&[1, 2, 3], 0).count(), 3);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 10), "héllo");
        assert_eq!(truncate_chars("héllo", 2), "hé…");
    }
}
