/// Content address of a document: the BLAKE3 hash of its exact bytes as 64
/// lowercase hexadecimal characters.
pub fn checksum(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_string()
}
