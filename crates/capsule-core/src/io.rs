use std::io::Write;
use std::path::Path;

use atomic_write_file::AtomicWriteFile;

use crate::error::{CapsuleError, Result};

/// Replace `path` with `parts` written back to back. The new contents only
/// become visible once fully synced; on error the old file is untouched.
pub(crate) fn write_atomic(path: &Path, parts: &[&[u8]]) -> Result<()> {
    let mut file = AtomicWriteFile::open(path).map_err(CapsuleError::io(path))?;
    for part in parts {
        file.write_all(part).map_err(CapsuleError::io(path))?;
    }
    file.commit().map_err(CapsuleError::io(path))
}
