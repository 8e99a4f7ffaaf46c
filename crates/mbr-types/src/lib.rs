//! Types and byte-exact codecs for the classic DOS/MBR partition table.

#[macro_use]
extern crate err_derive;

mod entry;
mod geometry;
mod table;
mod types;

pub use self::{entry::*, geometry::*, table::*, types::*};
