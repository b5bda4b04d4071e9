use super::{Checksum, ChecksumAlgorithm};
use sha2::{Digest, Sha256, Sha512};
use std::io::{self, Read};
use std::path::Path;
use tracing::trace;

/// Incrementally hashes content with the algorithm of an expected checksum.
pub enum ContentHasher {
    Sha256(Sha256),
    Sha512(Sha512),
}

impl ContentHasher {
    pub fn new(algorithm: ChecksumAlgorithm) -> Self {
        match algorithm {
            ChecksumAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            ChecksumAlgorithm::Sha512 => Self::Sha512(Sha512::new()),
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Sha256(sha) => sha.update(bytes),
            Self::Sha512(sha) => sha.update(bytes),
        }
    }

    pub fn finalize(self) -> Checksum {
        match self {
            Self::Sha256(sha) => {
                Checksum::from_digest(ChecksumAlgorithm::Sha256, sha.finalize().to_vec())
            }
            Self::Sha512(sha) => {
                Checksum::from_digest(ChecksumAlgorithm::Sha512, sha.finalize().to_vec())
            }
        }
    }
}

pub fn hash_reader(reader: &mut impl Read, algorithm: ChecksumAlgorithm) -> io::Result<Checksum> {
    let mut hasher = ContentHasher::new(algorithm);
    let mut buffer = [0u8; 64 * 1024];

    loop {
        let read = reader.read(&mut buffer)?;

        if read == 0 {
            break;
        }

        hasher.update(&buffer[..read]);
    }

    Ok(hasher.finalize())
}

pub fn hash_file_contents<P: AsRef<Path>>(
    path: P,
    algorithm: ChecksumAlgorithm,
) -> io::Result<Checksum> {
    let path = path.as_ref();

    trace!(file = ?path, algorithm = ?algorithm, "Calculating checksum");

    let mut file = std::fs::File::open(path)?;
    let hash = hash_reader(&mut file, algorithm)?;

    trace!(hash = %hash, "Calculated hash");

    Ok(hash)
}
