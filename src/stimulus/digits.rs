use itertools::Itertools;
use rand::Rng;

/// `total` independent uniform decimal digits as one string.
pub fn generate_digits<R: Rng>(total: usize, rng: &mut R) -> String {
    (0..total)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Chunk a digit string into presentation groups. The last group may be
/// shorter when the total is not a multiple of the group size.
pub fn group_digits(digits: &str, per_group: usize) -> Vec<String> {
    let per_group = per_group.max(1);
    digits
        .chars()
        .chunks(per_group)
        .into_iter()
        .map(|chunk| chunk.collect())
        .collect()
}

/// One fresh group for the endless conversion drill.
pub fn endless_group<R: Rng>(per_group: usize, rng: &mut R) -> String {
    generate_digits(per_group.max(1), rng)
}
