//! A library backend for editing the classic DOS/MBR partition table.
//!
//! The boot sector and every chained extended boot record are held in memory
//! as owned sector buffers; mutations touch only those buffers and mark them
//! dirty, and a final [`DosLabel::flush`] writes them back byte-exact. The
//! caller owns the device handle and the probed [`Geometry`]; nothing here
//! probes, prompts or prints.

extern crate failure;
#[macro_use]
extern crate failure_derive;
extern crate itertools;
extern crate libc;
#[macro_use]
extern crate log;
extern crate mbr_types;

pub use mbr_types::{
    is_extended_type, partition_type_name, table_flag, valid_table_flag, write_table_flag, Chs,
    Geometry, GeometryError, PackedChs, PartitionEntry, ACTIVE_FLAG, DOS_EXTENDED, ENTRY_SIZE,
    LINUX_EXTENDED, MAXIMUM_PARTS, TABLE_OFFSET, WIN98_EXTENDED,
};

pub use self::device::{FileDevice, SectorDevice};
pub use self::error::{DiskError, LoadWarning};
pub use self::label::{DosLabel, PartitionInfo, SlotId};
pub use self::verify::VerifyFinding;

mod commit;
mod device;
mod error;
mod label;
mod ops;
mod verify;
