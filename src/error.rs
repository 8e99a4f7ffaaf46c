use mbr_types::GeometryError;
use std::{fmt, io, path::PathBuf};

/// Defines the errors that may arise while loading and editing a disklabel.
///
/// I/O failures abort the operation that hit them; every other variant is a
/// rejected request that leaves the in-memory label untouched.
#[rustfmt::skip]
#[derive(Debug, Fail)]
pub enum DiskError {
    #[fail(display = "unable to open device at {:?}: {}", device, why)]
    DeviceOpen { device: PathBuf, why: io::Error },
    #[fail(display = "unable to lock device at {:?}: {}", device, why)]
    DeviceLock { device: PathBuf, why: io::Error },
    #[fail(display = "unable to read sector {}: {}", lba, why)]
    SectorRead { lba: u64, why: io::Error },
    #[fail(display = "unable to write sector {}: {}", lba, why)]
    SectorWrite { lba: u64, why: io::Error },
    #[fail(display = "device does not contain a valid DOS partition table")]
    InvalidSignature,
    #[fail(display = "{}", why)]
    Geometry { why: GeometryError },
    #[fail(display = "partition {} not found on the label", slot)]
    PartitionNotFound { slot: usize },
    #[fail(display = "sector {} is outside the free space available", sector)]
    OutOfRange { sector: u64 },
    #[fail(display = "partition {} {}", slot, reason)]
    InvalidTransition { slot: usize, reason: &'static str },
    #[fail(display = "the maximum number of partitions has been created")]
    CapacityExceeded,
}

impl From<GeometryError> for DiskError {
    fn from(why: GeometryError) -> DiskError {
        DiskError::Geometry { why }
    }
}

/// A structural anomaly found while reading a label from disk.
///
/// These never fail the load: the store is left in a best-effort, usable
/// state and the warnings are kept on the label for the caller to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// A second primary extended partition was found and ignored.
    ExtraExtended { slot: usize },
    /// The primary extended partition has a zero start; the chain was not
    /// followed.
    BadPrimaryLink,
    /// An extended boot record held more than one link entry; the one at the
    /// lowest byte offset wins.
    ExtraLinkEntry { table: usize },
    /// An extended boot record held more than one data entry; the one at the
    /// lowest byte offset wins.
    ExtraDataEntry { table: usize },
    /// The chain reached the slot ceiling and was cut at the terminal link.
    ChainTruncated { parts: usize },
    /// An extended boot record was missing its signature; it will be
    /// corrected on the next write.
    InvalidFlag { table: usize, flag: u16 },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            LoadWarning::ExtraExtended { slot } => {
                write!(fmt, "ignoring extra extended partition {}", slot + 1)
            }
            LoadWarning::BadPrimaryLink => {
                write!(fmt, "bad offset in primary extended partition")
            }
            LoadWarning::ExtraLinkEntry { table } => {
                write!(fmt, "extra link pointer in partition table {}", table + 1)
            }
            LoadWarning::ExtraDataEntry { table } => {
                write!(fmt, "ignoring extra data in partition table {}", table + 1)
            }
            LoadWarning::ChainTruncated { parts } => {
                write!(fmt, "omitting partitions after {}", parts)
            }
            LoadWarning::InvalidFlag { table, flag } => write!(
                fmt,
                "invalid flag {:#06x} of partition table {} will be corrected by write",
                flag,
                table + 1
            ),
        }
    }
}
