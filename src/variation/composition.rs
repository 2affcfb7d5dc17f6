/// GC content of a sequence as a percentage, rounded to 2 decimals.
///
/// Counting is case-insensitive. An empty sequence has a GC content of `0.0`.
pub fn gc_content(sequence: &str) -> f64 {
    let mut total = 0usize;
    let mut gc = 0usize;
    for c in sequence.chars() {
        total += 1;
        if matches!(c, 'G' | 'g' | 'C' | 'c') {
            gc += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    let pct = gc as f64 / total as f64 * 100.0;
    // Exact ties go to the even neighbour.
    (pct * 100.0).round_ties_even() / 100.0
}
