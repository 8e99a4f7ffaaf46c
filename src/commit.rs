use crate::device::SectorDevice;
use crate::error::DiskError;
use crate::label::DosLabel;
use mbr_types::write_table_flag;

impl DosLabel {
    /// True while any buffer holds unwritten changes.
    pub fn is_dirty(&self) -> bool {
        self.boot_dirty || self.logical.iter().any(|slot| slot.dirty)
    }

    /// Writes every dirty buffer back to its absolute sector, boot sector
    /// first, stamping the table signature on the way out.
    ///
    /// Each buffer is written whole or the flush fails; buffers already
    /// written stay clean and the rest keep their dirty bit for a retry.
    /// There is no transactional guarantee across buffers: an interruption
    /// between two writes can leave the on-disk chain inconsistent, exactly
    /// as it always could. After a clean flush the OS is asked to re-read
    /// the table; that failing is logged and otherwise ignored.
    pub fn flush<D: SectorDevice>(&mut self, device: &mut D) -> Result<(), DiskError> {
        info!("writing the partition table");
        if self.boot_dirty {
            write_table_flag(&mut self.boot);
            device
                .write_sector(0, &self.boot)
                .map_err(|why| DiskError::SectorWrite { lba: 0, why })?;
            self.boot_dirty = false;
        }
        for slot in &mut self.logical {
            if slot.dirty {
                write_table_flag(&mut slot.buffer);
                device
                    .write_sector(slot.offset, &slot.buffer)
                    .map_err(|why| DiskError::SectorWrite { lba: slot.offset, why })?;
                slot.dirty = false;
            }
        }

        if let Err(why) = device.reread_partition_table() {
            warn!("table re-read failed ({}); the kernel may still use the old table", why);
        }
        Ok(())
    }
}
