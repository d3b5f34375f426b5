//! Word-level utilities: suffix stemming, edit distance and phrase counting.

/// Reduce an ASCII word to a crude stem.
///
/// A small suffix stripper: the first matching rule wins and is only applied
/// when at least three characters remain. Non-ASCII words are returned as is.
pub fn stem(word: &str) -> String {
    if word.len() <= 3 || !word.is_ascii() {
        return word.to_string();
    }

    let mut stemmed = strip_suffix(word).unwrap_or_else(|| word.to_string());
    if stemmed.len() > 4 && stemmed.ends_with('e') {
        stemmed.pop();
    }
    stemmed
}

fn strip_suffix(word: &str) -> Option<String> {
    // (suffix, replacement, undouble, shortest allowed result)
    const RULES: &[(&str, &str, bool, usize)] = &[
        ("ies", "y", false, 3),
        ("sses", "ss", false, 3),
        ("ations", "", false, 3),
        ("ation", "", false, 3),
        ("tions", "t", false, 3),
        ("tion", "t", false, 3),
        ("ness", "", false, 3),
        ("ings", "", true, 3),
        ("ing", "", true, 3),
        ("ed", "", true, 3),
        ("ly", "", false, 4),
    ];

    for (suffix, replacement, undouble, min_len) in RULES {
        if let Some(base) = word.strip_suffix(suffix) {
            if base.len() + replacement.len() < *min_len {
                return None;
            }
            let mut out = format!("{base}{replacement}");
            if *undouble {
                undouble_consonant(&mut out);
            }
            return Some(out);
        }
    }

    if let Some(base) = word.strip_suffix("es") {
        if ["s", "x", "z", "ch", "sh"].iter().any(|e| base.ends_with(e)) {
            return (base.len() >= 3).then(|| base.to_string());
        }
    }

    if word.ends_with('s') && !["ss", "us", "is"].iter().any(|e| word.ends_with(e)) {
        let base = &word[..word.len() - 1];
        return (base.len() >= 3).then(|| base.to_string());
    }

    None
}

fn undouble_consonant(word: &mut String) {
    let bytes = word.as_bytes();
    let n = bytes.len();
    if n >= 4 {
        let last = bytes[n - 1];
        if last == bytes[n - 2] && !is_vowel(last) && !matches!(last, b'l' | b's' | b'z') {
            word.pop();
        }
    }
}

fn is_vowel(b: u8) -> bool {
    matches!(b, b'a' | b'e' | b'i' | b'o' | b'u')
}

/// Levenshtein distance over characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Edit similarity in `[0, 1]`: `1 - distance / longer_length`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

/// Count non-overlapping whole-word occurrences of `phrase` in `padded`.
///
/// `padded` must be normalised text wrapped in single spaces, `phrase` a
/// normalised phrase without padding.
pub fn count_phrase(padded: &str, phrase: &str) -> usize {
    if phrase.is_empty() {
        return 0;
    }
    let needle = format!(" {phrase} ");
    let mut count = 0;
    let mut offset = 0;
    while let Some(pos) = padded[offset..].find(&needle) {
        count += 1;
        // Step past the phrase but keep its trailing space as the next leading one.
        offset += pos + needle.len() - 1;
    }
    count
}

/// Total occurrences of every phrase in `phrases`.
pub fn count_phrases(padded: &str, phrases: &[String]) -> usize {
    phrases.iter().map(|p| count_phrase(padded, p)).sum()
}

/// `true` if any run of `min_run` identical characters occurs in `word`.
pub fn has_char_run(word: &str, min_run: usize) -> bool {
    let mut run = 0;
    let mut last = None;
    for c in word.chars() {
        if Some(c) == last {
            run += 1;
        } else {
            run = 1;
            last = Some(c);
        }
        if run >= min_run {
            return true;
        }
    }
    false
}
