use std::fmt;

/// The geometry of a disk, as supplied by the collaborator that probed the
/// device (or by the operator, when probing got it wrong).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Geometry {
    /// The number of heads (tracks per cylinder).
    pub heads: u32,
    /// The number of sectors per track.
    pub sectors: u32,
    /// The number of cylinders.
    pub cylinders: u32,
    /// The size of each sector, in bytes.
    pub sector_size: u32,
}

/// A possible error when validating a disk geometry.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error(display = "heads, sectors and cylinders must all be set")]
    Incomplete,
    #[error(display = "sector size {} is not one of 512, 1024 or 2048", _0)]
    UnsupportedSectorSize(u32),
}

impl Geometry {
    /// Ensures the geometry is usable for CHS arithmetic.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.heads == 0 || self.sectors == 0 || self.cylinders == 0 {
            return Err(GeometryError::Incomplete);
        }
        match self.sector_size {
            512 | 1024 | 2048 => Ok(()),
            other => Err(GeometryError::UnsupportedSectorSize(other)),
        }
    }

    /// The combined total number of sectors addressable through CHS.
    pub fn total_sectors(&self) -> u64 {
        u64::from(self.heads) * u64::from(self.sectors) * u64::from(self.cylinders)
    }

    /// Converts a linear sector address into cylinder/head/sector form.
    pub fn lba_to_chs(&self, lba: u64) -> Chs {
        let spc = u64::from(self.heads) * u64::from(self.sectors);
        let cylinder = lba / spc;
        let remainder = lba % spc;
        Chs {
            cylinder: cylinder as u32,
            head: (remainder / u64::from(self.sectors)) as u32,
            // Sectors count from 1.
            sector: (remainder % u64::from(self.sectors)) as u32 + 1,
        }
    }

    /// Converts a cylinder/head/sector address back into a linear sector.
    pub fn chs_to_lba(&self, chs: Chs) -> u64 {
        (u64::from(chs.cylinder) * u64::from(self.heads) + u64::from(chs.head))
            * u64::from(self.sectors)
            + u64::from(chs.sector) - 1
    }

    /// The CHS address to store for `lba` in a partition entry.
    ///
    /// In DOS-compatible mode, addresses beyond cylinder 1023 are clamped to
    /// the largest representable value rather than wrapped, so the CHS fields
    /// under-represent the true position on large disks. The LBA fields
    /// remain authoritative either way.
    pub fn chs_for(&self, lba: u64, dos_compatible: bool) -> Chs {
        let spc = u64::from(self.heads) * u64::from(self.sectors);
        let lba = if dos_compatible && lba / spc > 1023 {
            spc * 1024 - 1
        } else {
            lba
        };
        self.lba_to_chs(lba)
    }

    /// The lowest sector a partition may start on: a track boundary in
    /// DOS-compatible mode, anywhere past the table sector otherwise.
    pub fn sector_offset(&self, dos_compatible: bool) -> u64 {
        if dos_compatible {
            u64::from(self.sectors)
        } else {
            1
        }
    }
}

/// An unpacked cylinder/head/sector address.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Chs {
    pub cylinder: u32,
    pub head: u32,
    /// 1-based within the track.
    pub sector: u32,
}

impl fmt::Display for Chs {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "({}, {}, {})", self.cylinder, self.head, self.sector)
    }
}
