use std::fs;
use std::path::{Path, PathBuf};

use occsense_core::fixtures::{FrameBuilder, SAMPLE_FRAME};

fn main() -> Result<(), String> {
    let root = PathBuf::from("tests/golden");
    write_frame(&root.join("sample").join("input.bin"), &SAMPLE_FRAME)?;
    write_frame(
        &root.join("mixed_strides").join("input.bin"),
        &mixed_strides(),
    )?;
    Ok(())
}

/// Padded records, an empty block, an unknown tag and a repeated `TEMP`.
fn mixed_strides() -> Vec<u8> {
    FrameBuilder::new()
        .sequence(0x2a)
        .status(0xc3)
        .code_level("op_occ_160301b")
        .temperature(6, &[(0x0100, 45), (0x0101, 47)])
        .frequency(4, &[])
        .raw_block(*b"FOOX", 3, 2, &[1, 2, 3, 4, 5, 6])
        .temperature(4, &[(0x0200, 51)])
        .power(16, &[(0x0300, 12, 123_456, 180)])
        .with_checksum()
        .build()
}

fn write_frame(path: &Path, frame: &[u8]) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("failed to create {}: {}", parent.display(), err))?;
    }
    fs::write(path, frame).map_err(|err| format!("failed to write {}: {}", path.display(), err))
}
