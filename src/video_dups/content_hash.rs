use std::{
    fmt,
    fs::File,
    io::{ErrorKind, Read},
    path::Path,
};

use log::trace;
use serde::{Deserialize, Serialize};

use crate::{definitions::HASH_CHUNK_SIZE, Error};

/// A 256 bit digest of a file's entire contents. Two files with equal digests are treated as
/// byte-identical.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Serialize, Deserialize)]
pub struct ContentDigest([u8; blake3::OUT_LEN]);

impl ContentDigest {
    pub fn as_bytes(&self) -> &[u8; blake3::OUT_LEN] {
        &self.0
    }

    /// Lowercase hexadecimal. Sorting digests and sorting their hex strings give the same order.
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl From<blake3::Hash> for ContentDigest {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

/// Hash the full contents of the file at `src_path`, reading it in fixed size chunks.
///
/// # Errors
/// * The file cannot be opened or a read fails part way through.
pub fn hash_file(src_path: impl AsRef<Path>) -> Result<ContentDigest, Error> {
    let src_path = src_path.as_ref();
    let mut file = File::open(src_path).map_err(|e| Error::io(src_path, &e))?;
    let digest = hash_reader(&mut file).map_err(|e| Error::io(src_path, &e))?;

    trace!(target: "content_hash", "{}: {digest}", src_path.display());
    Ok(digest)
}

pub(crate) fn hash_reader(reader: &mut impl Read) -> std::io::Result<ContentDigest> {
    let mut hasher = blake3::Hasher::new();
    let mut chunk = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                hasher.update(&chunk[..n]);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(hasher.finalize().into())
}
