use super::*;

fn config(chunk_size: usize, chunk_overlap: usize) -> ChunkingConfig {
    ChunkingConfig {
        chunk_size,
        chunk_overlap,
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn tail(text: &str, n: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    chars[chars.len() - n..].iter().collect()
}

fn head(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}

/// Deterministic mixed text with paragraphs, lines, long words and multibyte characters
fn generated_text(seed: u64, words: usize) -> String {
    let vocabulary = [
        "lowering",
        "dialect",
        "operation",
        "région",
        "пример",
        "affine",
        "supercalifragilisticexpialidocious",
        "a",
        "tensor",
        "🦀",
    ];
    let mut state = seed;
    let mut text = String::new();
    for _ in 0..words {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let word = vocabulary[(state >> 33) as usize % vocabulary.len()];
        text.push_str(word);
        text.push_str(match (state >> 20) % 17 {
            0 => "\n\n",
            1 | 2 => "\n",
            _ => " ",
        });
    }
    text
}

#[test]
fn default_config_values() {
    let config = ChunkingConfig::default();
    assert_eq!(config.chunk_size, 2000);
    assert_eq!(config.chunk_overlap, 50);
}

#[test]
fn empty_and_whitespace_text() {
    assert!(split_text("", &ChunkingConfig::default()).is_empty());
    assert!(split_text("  \n\n\t ", &ChunkingConfig::default()).is_empty());
}

#[test]
fn short_text_is_single_trimmed_chunk() {
    let chunks = split_text("\n  Hello world.  \n", &ChunkingConfig::default());
    assert_eq!(chunks, vec!["Hello world.".to_string()]);
}

#[test]
fn prefers_paragraph_boundaries() {
    let text = "First paragraph here.\n\nSecond paragraph\nwith a line break.";
    let chunks = split_text(text, &config(40, 0));

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0], "First paragraph here.\n\n");
    assert_eq!(chunks[1], "Second paragraph\nwith a line break.");
}

#[test]
fn falls_back_to_line_then_word_boundaries() {
    let by_line = split_text("alpha beta\ngamma delta epsilon", &config(15, 0));
    assert_eq!(by_line[0], "alpha beta\n");

    let by_word = split_text("alpha beta gamma delta epsilon", &config(12, 0));
    assert_eq!(by_word[0], "alpha beta ");
    assert!(by_word.iter().all(|c| char_len(c) <= 12));
}

#[test]
fn hard_cut_without_separators() {
    let text = "x".repeat(25);
    let chunks = split_text(&text, &config(10, 3));

    assert_eq!(chunks[0], "x".repeat(10));
    assert!(chunks.iter().all(|c| char_len(c) <= 10));
    let rebuilt_len: usize = chunks.iter().map(|c| char_len(c)).sum::<usize>() - 3 * (chunks.len() - 1);
    assert_eq!(rebuilt_len, 25);
}

#[test]
fn chunks_respect_size_and_overlap() {
    let cases = [(2000, 50), (200, 50), (97, 13), (40, 0), (16, 15), (5, 1)];

    for seed in 1..=6 {
        let text = generated_text(seed, 1500);
        for (size, overlap) in cases {
            let chunks = split_text(&text, &config(size, overlap));
            assert!(!chunks.is_empty());

            for chunk in &chunks {
                assert!(
                    char_len(chunk) <= size,
                    "chunk of {} chars exceeds {} (seed {})",
                    char_len(chunk),
                    size,
                    seed
                );
            }

            for pair in chunks.windows(2) {
                assert_eq!(
                    tail(&pair[0], overlap),
                    head(&pair[1], overlap),
                    "overlap mismatch for size {} overlap {} (seed {})",
                    size,
                    overlap,
                    seed
                );
                assert!(char_len(&pair[1]) > overlap);
            }
        }
    }
}

#[test]
fn chunks_cover_the_whole_text() {
    let text = generated_text(42, 800);
    let (size, overlap) = (120, 20);
    let chunks = split_text(&text, &config(size, overlap));

    let mut rebuilt = chunks[0].clone();
    for chunk in &chunks[1..] {
        rebuilt.extend(chunk.chars().skip(overlap));
    }
    assert_eq!(rebuilt, text.trim());
}

#[test]
fn overlap_larger_than_size_is_clamped() {
    let text = "abcdefghijklmnopqrstuvwxyz";
    let chunks = split_text(text, &config(4, 10));

    assert!(chunks.iter().all(|c| char_len(c) <= 4));
    for pair in chunks.windows(2) {
        assert_eq!(tail(&pair[0], 3), head(&pair[1], 3));
    }
}
