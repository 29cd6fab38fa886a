// Content hashing: SHA-256 digests as lower-case hex, the same format the
// storage service reports for stored files.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Read size used when streaming a file through the hasher.
pub const CHUNK_SIZE: usize = 4096;

pub fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Hash everything `reader` yields, `CHUNK_SIZE` bytes at a time.
pub fn calculate_hash_from_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn sha256_file(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    calculate_hash_from_reader(BufReader::new(file))
}

/// Lower-cased digest if `value` looks like a hex SHA-256, `None` otherwise.
pub fn normalize_hex_digest(value: &str) -> Option<String> {
    let value = value.trim();
    if value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(value.to_ascii_lowercase())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HELLO_WORLD: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_calculate_hash() {
        assert_eq!(calculate_hash(b"hello world"), HELLO_WORLD);
    }

    #[test]
    fn test_calculate_hash_empty() {
        assert_eq!(
            calculate_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_reader_matches_in_memory_across_chunks() {
        // Spans several chunks with a ragged tail.
        let data: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        let streamed = calculate_hash_from_reader(&data[..]).unwrap();
        assert_eq!(streamed, calculate_hash(&data));
    }

    #[test]
    fn test_sha256_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        assert_eq!(sha256_file(file.path()).unwrap(), HELLO_WORLD);
    }

    #[test]
    fn test_normalize_hex_digest() {
        assert_eq!(
            normalize_hex_digest(&HELLO_WORLD.to_uppercase()).as_deref(),
            Some(HELLO_WORLD)
        );
        assert_eq!(normalize_hex_digest("abc"), None);
        assert_eq!(normalize_hex_digest(&"z".repeat(64)), None);
    }
}
