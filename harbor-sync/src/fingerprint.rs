//! Content fingerprints for change detection
//!
//! The fingerprint runs on every write event, so it has to be cheap.
//! The default uses file size, which is fast but cannot tell apart two
//! same-size edits; the blake3 variant reads the whole file and is
//! collision-safe.

use std::fs::File;
use std::io;
use std::path::Path;

/// An opaque value derived from file content (or size), compared to
/// detect local changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn from_size(size: u64) -> Self {
        Self(size.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Which fingerprint function to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FingerprintKind {
    /// File size. Cheap, not collision-safe.
    #[default]
    Size,
    /// blake3 content hash.
    Blake3,
}

#[derive(Debug, Clone, Copy)]
pub struct Fingerprinter {
    kind: FingerprintKind,
}

impl Fingerprinter {
    pub fn new(kind: FingerprintKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> FingerprintKind {
        self.kind
    }

    pub fn fingerprint(&self, path: &Path) -> io::Result<Fingerprint> {
        match self.kind {
            FingerprintKind::Size => {
                let metadata = std::fs::metadata(path)?;
                Ok(Fingerprint::from_size(metadata.len()))
            }
            FingerprintKind::Blake3 => {
                let mut file = File::open(path)?;
                let mut hasher = blake3::Hasher::new();
                io::copy(&mut file, &mut hasher)?;
                Ok(Fingerprint(hasher.finalize().to_hex().to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn size_fingerprint_tracks_length_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, b"0123456789").unwrap();

        let fp = Fingerprinter::new(FingerprintKind::Size);
        assert_eq!(fp.fingerprint(&path).unwrap(), Fingerprint::from_size(10));

        // Same length, different content: size mode cannot tell.
        fs::write(&path, b"abcdefghij").unwrap();
        assert_eq!(fp.fingerprint(&path).unwrap(), Fingerprint::from_size(10));
    }

    #[test]
    fn blake3_fingerprint_tracks_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, b"0123456789").unwrap();

        let fp = Fingerprinter::new(FingerprintKind::Blake3);
        let before = fp.fingerprint(&path).unwrap();

        fs::write(&path, b"abcdefghij").unwrap();
        let after = fp.fingerprint(&path).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let fp = Fingerprinter::new(FingerprintKind::Size);
        assert!(fp.fingerprint(Path::new("/nonexistent/nope")).is_err());
    }
}
