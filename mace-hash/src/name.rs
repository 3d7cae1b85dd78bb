/// Hash a target name to a stable 64-bit identifier.
///
/// Uses the djb2 variant `h[0] = 5381, h[i] = 33 * h[i-1] + c[i]`.
/// This is deterministic across platforms and Rust versions, unlike
/// [`std::hash::Hash`], which is exactly why target identity is not
/// implemented in terms of it.
pub fn hash_name(name: &str) -> u64
{
    let mut hash: u64 = 5381;
    for byte in name.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(byte as u64);
    }
    hash
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn matches_djb2_reference_values()
    {
        // h = 5381
        assert_eq!(hash_name(""), 5381);
        // h = 33 * 5381 + 'a' = 177573 + 97 = 177670
        assert_eq!(hash_name("a"), 177_670);
    }

    #[test]
    fn deterministic_across_calls()
    {
        assert_eq!(hash_name("tnecs"), hash_name("tnecs"));
    }

    #[test]
    fn distinguishes_different_names()
    {
        assert_ne!(hash_name("libA"), hash_name("libB"));
    }
}
