use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

const INES_MAGIC: u32 = 0x1A53_454E; // "NES\x1A", little-endian

const PRG_BANK_SIZE: usize = 16 * 1024;
const CHR_BANK_SIZE: usize = 8 * 1024;
const SRAM_SIZE: usize = 8 * 1024;
const TRAINER_SIZE: usize = 512;

/// Nametable mirroring arrangement. Mappers 1, 4 and 7 rewrite this at
/// runtime; the other supported mappers keep the header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    Single0,
    Single1,
    Four,
}

/// Which 0x400-byte nametable bank each quadrant of the $2000-$2FFF window
/// maps to, per mirroring mode.
const MIRROR_LOOKUP: [[u16; 4]; 5] = [
    [0, 0, 1, 1], // Horizontal
    [0, 1, 0, 1], // Vertical
    [0, 0, 0, 0], // Single0
    [1, 1, 1, 1], // Single1
    [0, 1, 2, 3], // Four
];

/// Maps a nametable address into the mirrored $2000-$2FFF space.
pub fn mirror_address(mode: Mirroring, addr: u16) -> u16 {
    let addr = (addr - 0x2000) % 0x1000;
    let table = addr / 0x0400;
    let offset = addr % 0x0400;
    0x2000 + MIRROR_LOOKUP[mode as usize][table as usize] * 0x0400 + offset
}

/// A parsed iNES image. Immutable after load except for CHR-RAM and SRAM.
pub struct Cartridge {
    pub prg: Vec<u8>,
    pub chr: Vec<u8>,
    pub sram: Vec<u8>,
    pub mapper_id: u8,
    pub mirroring: Mirroring,
    pub battery: bool,
    pub chr_is_ram: bool,
}

impl Cartridge {
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read ROM: {}", path.display()))?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 16 {
            bail!("ROM is too small to contain an iNES header");
        }
        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != INES_MAGIC {
            bail!("invalid iNES header magic, expected NES<EOF>");
        }

        let prg_banks = bytes[4] as usize;
        let chr_banks = bytes[5] as usize;
        let ctrl1 = bytes[6];
        let ctrl2 = bytes[7];
        // Byte 8 is the PRG-RAM size; the SRAM window here is a fixed 8 KiB.

        if prg_banks == 0 {
            bail!("ROM declares no PRG banks");
        }

        let mapper_id = (ctrl1 >> 4) | (ctrl2 & 0xF0);
        let mirroring = if (ctrl1 & 0x08) != 0 {
            Mirroring::Four
        } else if (ctrl1 & 0x01) != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        let battery = (ctrl1 & 0x02) != 0;

        let mut cursor = 16usize;
        if (ctrl1 & 0x04) != 0 {
            cursor += TRAINER_SIZE;
        }

        let prg_size = prg_banks * PRG_BANK_SIZE;
        if bytes.len() < cursor + prg_size {
            bail!(
                "ROM truncated: expected {} PRG bytes but file ended early",
                prg_size
            );
        }
        let prg = bytes[cursor..cursor + prg_size].to_vec();
        cursor += prg_size;

        let chr_size = chr_banks * CHR_BANK_SIZE;
        let (chr, chr_is_ram) = if chr_size == 0 {
            (vec![0; CHR_BANK_SIZE], true)
        } else {
            if bytes.len() < cursor + chr_size {
                bail!(
                    "ROM truncated: expected {} CHR bytes but file ended early",
                    chr_size
                );
            }
            (bytes[cursor..cursor + chr_size].to_vec(), false)
        };

        tracing::debug!(
            mapper_id,
            prg_banks,
            chr_banks,
            battery,
            ?mirroring,
            "parsed iNES image"
        );

        Ok(Self {
            prg,
            chr,
            sram: vec![0; SRAM_SIZE],
            mapper_id,
            mirroring,
            battery,
            chr_is_ram,
        })
    }
}
