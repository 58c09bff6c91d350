use rand::Rng;

/// Structural code symbols are drawn from `0..STRUCTURAL_ALPHABET`.
pub const STRUCTURAL_ALPHABET: u8 = 10;

const DEFAULT_CODE_LENGTH: std::ops::RangeInclusive<usize> = 4..=8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeEdit {
    Point,
    Insertion,
    Deletion,
}

/// Levenshtein distance between two codes.
pub fn edit_distance(a: &[u8], b: &[u8]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, &x) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, &y) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(x != y);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// `1 - distance / max_len`, in `[0, 1]`. Two empty codes are identical.
pub fn similarity(a: &[u8], b: &[u8]) -> f64 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - edit_distance(a, b) as f64 / longest as f64
}

pub fn random_code(rng: &mut impl Rng) -> Vec<u8> {
    let len = rng.gen_range(DEFAULT_CODE_LENGTH);
    (0..len)
        .map(|_| rng.gen_range(0..STRUCTURAL_ALPHABET))
        .collect()
}

/// Applies one edit to a copy of `code`. Deletion never empties a code; an empty code
/// can only grow.
pub fn apply_edit(code: &[u8], edit: CodeEdit, rng: &mut impl Rng) -> Vec<u8> {
    let mut derived = code.to_vec();
    match edit {
        CodeEdit::Point if !derived.is_empty() => {
            let pos = rng.gen_range(0..derived.len());
            let current = derived[pos];
            let shift = rng.gen_range(1..STRUCTURAL_ALPHABET);
            derived[pos] = (current + shift) % STRUCTURAL_ALPHABET;
        }
        CodeEdit::Deletion if derived.len() > 1 => {
            let pos = rng.gen_range(0..derived.len());
            derived.remove(pos);
        }
        _ => {
            let pos = rng.gen_range(0..=derived.len());
            derived.insert(pos, rng.gen_range(0..STRUCTURAL_ALPHABET));
        }
    }
    derived
}

/// Derives a related code through a randomly chosen point mutation, insertion or deletion.
pub fn derive_code(code: &[u8], rng: &mut impl Rng) -> Vec<u8> {
    let edit = match rng.gen_range(0..3) {
        0 => CodeEdit::Point,
        1 => CodeEdit::Insertion,
        _ => CodeEdit::Deletion,
    };
    apply_edit(code, edit, rng)
}
