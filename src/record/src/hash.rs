// Shard-key hash primitives. `shard_key_hash` is the routing contract the
// planner uses to translate equality-filter values into shard indices; any
// reimplementation on the ingest side must reproduce these functions
// byte-for-byte, so nothing here may depend on platform endianness, hash-map
// iteration order, or a non-deterministic hasher.

use std::collections::HashSet;

/// Polynomial string hash (`h = 31*h + byte`, seeded at 0) over raw UTF-8
/// bytes. This is the single hashing primitive every other function in this
/// module builds on, so it is the only place platform-independence has to
/// be argued for: it touches only `i32` wrapping arithmetic over `u8`s.
pub fn hash32(bytes: &[u8]) -> i32 {
    bytes
        .iter()
        .fold(0i32, |h, &b| h.wrapping_mul(31).wrapping_add(b as i32))
}

fn string_hash(s: &str) -> i32 {
    hash32(s.as_bytes())
}

/// `31 * h1 + h2`, the single combination step every rolling/combined hash
/// in the builder and the shard key is built from.
pub fn combine_hash(h1: i32, h2: i32) -> i32 {
    h1.wrapping_mul(31).wrapping_add(h2)
}

fn combined_hash(key: &str, value: &str) -> i32 {
    (31i32.wrapping_mul(string_hash(key))).wrapping_add(string_hash(value))
}

/// Sorts `pairs` in place by key UTF-8 byte order, then returns
/// `combinedHash(k, v)` for each pair in that sorted order.
pub fn sort_and_compute_hashes(pairs: &mut [(String, String)]) -> Vec<i32> {
    pairs.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
    pairs.iter().map(|(k, v)| combined_hash(k, v)).collect()
}

/// Folds, starting from 7, the hashes of every pair whose key is in
/// `include_keys`, in sorted order. Returns `None` if some key in
/// `include_keys` was never encountered.
pub fn combine_hash_including(
    sorted_pairs: &[(String, String)],
    hashes: &[i32],
    include_keys: &HashSet<String>,
) -> Option<i32> {
    let mut h = 7i32;
    let mut seen = HashSet::with_capacity(include_keys.len());
    for (pair, hash) in sorted_pairs.iter().zip(hashes) {
        if include_keys.contains(&pair.0) {
            h = combine_hash(h, *hash);
            seen.insert(pair.0.as_str());
        }
    }
    if seen.len() == include_keys.len() {
        Some(h)
    } else {
        None
    }
}

/// Folds, starting from 7, the hashes of every pair whose key is *not* in
/// `exclude_keys`, in sorted order.
pub fn combine_hash_excluding(
    sorted_pairs: &[(String, String)],
    hashes: &[i32],
    exclude_keys: &HashSet<String>,
) -> i32 {
    let mut h = 7i32;
    for (pair, hash) in sorted_pairs.iter().zip(hashes) {
        if !exclude_keys.contains(&pair.0) {
            h = combine_hash(h, *hash);
        }
    }
    h
}

/// The shard-key hash: the value the planner feeds to `shardMap.queryShards`
/// to translate a set of shard-key column/value pairs into shard indices.
/// Pure function of `(cols, vals)`, independent of input order.
///
/// Panics if `cols` and `vals` differ in length, or a column name repeats —
/// both are caller bugs (the planner only ever calls this with one value
/// per declared shard-key column).
pub fn shard_key_hash(cols: &[String], vals: &[String]) -> i32 {
    assert_eq!(cols.len(), vals.len(), "shard_key_hash: cols/vals length mismatch");
    let mut pairs: Vec<(String, String)> = cols
        .iter()
        .cloned()
        .zip(vals.iter().cloned())
        .collect();
    let hashes = sort_and_compute_hashes(&mut pairs);
    let include: HashSet<String> = cols.iter().cloned().collect();
    combine_hash_including(&pairs, &hashes, &include)
        .expect("shard_key_hash: duplicate shard-key column name")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_key_hash_is_deterministic() {
        let cols = vec!["ws".to_string(), "ns".to_string()];
        let vals = vec!["prod".to_string(), "payments".to_string()];
        let h1 = shard_key_hash(&cols, &vals);
        let h2 = shard_key_hash(&cols, &vals);
        assert_eq!(h1, h2);
    }

    #[test]
    fn shard_key_hash_matches_manual_combine() {
        let cols = vec!["ws".to_string(), "ns".to_string()];
        let vals = vec!["prod".to_string(), "payments".to_string()];
        let mut pairs = vec![
            ("ws".to_string(), "prod".to_string()),
            ("ns".to_string(), "payments".to_string()),
        ];
        let hashes = sort_and_compute_hashes(&mut pairs);
        let include: HashSet<String> = cols.iter().cloned().collect();
        let expected = combine_hash_including(&pairs, &hashes, &include).unwrap();
        assert_eq!(shard_key_hash(&cols, &vals), expected);
    }

    #[test]
    fn hash_is_commutative_under_input_order() {
        let a = shard_key_hash(
            &["ws".to_string(), "ns".to_string()],
            &["prod".to_string(), "payments".to_string()],
        );
        let b = shard_key_hash(
            &["ns".to_string(), "ws".to_string()],
            &["payments".to_string(), "prod".to_string()],
        );
        assert_eq!(a, b);
    }

    #[test]
    fn combine_hash_including_reports_missing_key() {
        let mut pairs = vec![("a".to_string(), "1".to_string())];
        let hashes = sort_and_compute_hashes(&mut pairs);
        let include: HashSet<String> = ["a".to_string(), "b".to_string()].into_iter().collect();
        assert_eq!(combine_hash_including(&pairs, &hashes, &include), None);
    }
}
