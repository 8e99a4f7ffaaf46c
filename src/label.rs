use crate::device::SectorDevice;
use crate::error::{DiskError, LoadWarning};
use mbr_types::{table_flag, valid_table_flag, write_table_flag, Geometry, PartitionEntry, MAXIMUM_PARTS};

/// Identifies a slot on the label: one of the four entries in the boot
/// sector, or a logical partition by its position along the chain.
///
/// Flat slot numbers map 0-3 onto `Primary` and 4 onwards onto `Logical`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SlotId {
    Primary(usize),
    Logical(usize),
}

impl SlotId {
    pub fn from_index(index: usize) -> SlotId {
        if index < 4 {
            SlotId::Primary(index)
        } else {
            SlotId::Logical(index - 4)
        }
    }

    pub fn index(self) -> usize {
        match self {
            SlotId::Primary(slot) => slot,
            SlotId::Logical(pos) => 4 + pos,
        }
    }
}

/// A logical partition's extended boot record and its place in the chain.
///
/// The buffer holds a whole sector; the data entry's start is relative to
/// `offset`, while the link entry's start is relative to the chain anchor.
pub(crate) struct LogicalSlot {
    pub buffer: Vec<u8>,
    /// Absolute sector this buffer was read from and will be written to.
    pub offset: u64,
    pub dirty: bool,
    /// Index of the data entry among the four raw entries.
    pub data_index: usize,
    /// Index of the chain-link entry among the four raw entries.
    pub link_index: usize,
}

/// One occupied slot, with its coordinates made absolute.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PartitionInfo {
    pub slot: usize,
    pub entry: PartitionEntry,
    pub start_sector: u64,
    pub end_sector: u64,
}

/// In-memory model of a DOS disklabel: the boot sector plus the chain of
/// extended boot records, each an owned buffer with a dirty bit.
///
/// One `DosLabel` is one editing session. It is populated once, mutated in
/// place, and flushed explicitly; dropping it without flushing discards
/// every pending change.
pub struct DosLabel {
    pub(crate) geometry: Geometry,
    pub(crate) dos_compatible: bool,
    pub(crate) boot: Vec<u8>,
    pub(crate) boot_dirty: bool,
    pub(crate) logical: Vec<LogicalSlot>,
    /// Which primary slot is the extended container, while one exists.
    pub(crate) ext_index: Option<usize>,
    /// Absolute start of the extended container; link entries are relative
    /// to this. Zero while no container exists.
    pub(crate) extended_offset: u64,
    pub(crate) warnings: Vec<LoadWarning>,
}

impl DosLabel {
    /// Builds a new, empty label entirely in memory.
    ///
    /// Nothing touches the device until [`DosLabel::flush`]; the previous
    /// content of sector 0 is unrecoverable after that.
    pub fn create_empty(geometry: Geometry) -> Result<DosLabel, DiskError> {
        geometry.validate()?;
        info!("building a new DOS disklabel in memory");

        let mut boot = vec![0; geometry.sector_size as usize];
        write_table_flag(&mut boot);

        Ok(DosLabel {
            geometry,
            dos_compatible: true,
            boot,
            boot_dirty: true,
            logical: Vec::new(),
            ext_index: None,
            extended_offset: 0,
            warnings: Vec::new(),
        })
    }

    /// Reads the boot sector and walks the extended chain.
    ///
    /// A missing boot signature is recoverable: the caller may decide to
    /// build a fresh label with [`DosLabel::create_empty`] instead.
    /// Structural anomalies inside the chain are recorded as warnings and
    /// leave a best-effort, usable label; only device I/O is fatal.
    pub fn load<D: SectorDevice>(device: &mut D, geometry: Geometry) -> Result<DosLabel, DiskError> {
        geometry.validate()?;
        info!(
            "reading disklabel with geometry {}/{}/{}",
            geometry.heads, geometry.sectors, geometry.cylinders
        );

        let mut boot = vec![0; geometry.sector_size as usize];
        device
            .read_sector(0, &mut boot)
            .map_err(|why| DiskError::SectorRead { lba: 0, why })?;
        if !valid_table_flag(&boot) {
            return Err(DiskError::InvalidSignature);
        }

        let mut label = DosLabel {
            geometry,
            dos_compatible: true,
            boot,
            boot_dirty: false,
            logical: Vec::new(),
            ext_index: None,
            extended_offset: 0,
            warnings: Vec::new(),
        };

        for slot in 0..4 {
            let entry = PartitionEntry::read(&label.boot, slot);
            if entry.is_extended() {
                if label.ext_index.is_some() {
                    label.warn(LoadWarning::ExtraExtended { slot });
                } else {
                    label.ext_index = Some(slot);
                    label.read_extended(device, entry)?;
                }
            }
        }

        // Chained sectors read back without the signature are tolerated, but
        // flagged so the next write repairs them.
        for pos in 0..label.logical.len() {
            if !valid_table_flag(&label.logical[pos].buffer) {
                let flag = table_flag(&label.logical[pos].buffer);
                label.warn(LoadWarning::InvalidFlag { table: 4 + pos, flag });
                label.logical[pos].dirty = true;
            }
        }

        Ok(label)
    }

    /// Follows the chain of extended boot records from the primary anchor.
    fn read_extended<D: SectorDevice>(
        &mut self,
        device: &mut D,
        anchor: PartitionEntry,
    ) -> Result<(), DiskError> {
        let mut link = anchor;
        if link.start_sect == 0 {
            self.warn(LoadWarning::BadPrimaryLink);
            return Ok(());
        }

        while link.is_extended() {
            let parts = 4 + self.logical.len();
            if parts >= MAXIMUM_PARTS {
                // Cut the chain at the terminal link so nothing past the
                // ceiling stays reachable once the label is written.
                self.warn(LoadWarning::ChainTruncated { parts });
                if let Some(last) = self.logical.last_mut() {
                    PartitionEntry::clear(&mut last.buffer, last.link_index);
                    last.dirty = true;
                }
                return Ok(());
            }

            let offset = self.extended_offset + u64::from(link.start_sect);
            if self.extended_offset == 0 {
                self.extended_offset = u64::from(link.start_sect);
            }

            let mut buffer = vec![0; self.geometry.sector_size as usize];
            device
                .read_sector(offset, &mut buffer)
                .map_err(|why| DiskError::SectorRead { lba: offset, why })?;

            let mut data_index = None;
            let mut link_index = None;
            for i in 0..4 {
                let entry = PartitionEntry::read(&buffer, i);
                if entry.is_extended() {
                    if link_index.is_some() {
                        self.warn(LoadWarning::ExtraLinkEntry { table: parts });
                    } else {
                        link_index = Some(i);
                    }
                } else if !entry.is_empty() {
                    if data_index.is_some() {
                        self.warn(LoadWarning::ExtraDataEntry { table: parts });
                    } else {
                        data_index = Some(i);
                    }
                }
            }

            // A record with neither entry is a tolerated empty tail; fall
            // back to the first raw entries not claimed by the other role.
            let data_index = data_index.unwrap_or(if link_index == Some(0) { 1 } else { 0 });
            let link_index = link_index.unwrap_or(if data_index == 0 { 1 } else { 0 });

            link = PartitionEntry::read(&buffer, link_index);
            self.logical.push(LogicalSlot { buffer, offset, dirty: false, data_index, link_index });
        }

        Ok(())
    }

    fn warn(&mut self, warning: LoadWarning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Total slot count: the four primaries plus the chain.
    pub fn slots(&self) -> usize {
        4 + self.logical.len()
    }

    /// Structural anomalies recorded while the label was loaded.
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn dos_compatible(&self) -> bool {
        self.dos_compatible
    }

    /// Toggles DOS compatibility: with it on, new partitions start on track
    /// boundaries and CHS fields clamp at cylinder 1024.
    pub fn set_dos_compatible(&mut self, dos_compatible: bool) {
        self.dos_compatible = dos_compatible;
    }

    /// The primary slot holding the extended container, if one exists.
    pub fn extended_index(&self) -> Option<usize> {
        self.ext_index
    }

    /// The decoded entry at `slot`, if the slot exists.
    pub fn entry(&self, slot: usize) -> Option<PartitionEntry> {
        if slot < self.slots() {
            Some(self.read_entry(SlotId::from_index(slot)))
        } else {
            None
        }
    }

    /// Every occupied slot in order, with absolute start and end sectors.
    pub fn list(&self) -> Vec<PartitionInfo> {
        let mut parts = Vec::new();
        for slot in 0..self.slots() {
            let id = SlotId::from_index(slot);
            let entry = self.read_entry(id);
            if entry.is_empty() {
                continue;
            }
            let start_sector = u64::from(entry.start_sect) + self.slot_offset(id);
            let sectors = u64::from(entry.nr_sects);
            let end_sector = start_sector + sectors.saturating_sub(1);
            parts.push(PartitionInfo { slot, entry, start_sector, end_sector });
        }
        parts
    }

    /// The link entries threading the chain together: the primary anchor's
    /// own entry, then each record's pointer to its successor.
    pub fn chain_links(&self) -> Vec<(usize, PartitionEntry)> {
        let mut links = Vec::new();
        if let Some(ext) = self.ext_index {
            links.push((ext, self.read_entry(SlotId::Primary(ext))));
        }
        for pos in 0..self.logical.len() {
            links.push((4 + pos, self.link_entry(pos)));
        }
        links
    }

    pub(crate) fn slot_id(&self, slot: usize) -> Result<SlotId, DiskError> {
        if slot < self.slots() {
            Ok(SlotId::from_index(slot))
        } else {
            Err(DiskError::PartitionNotFound { slot })
        }
    }

    pub(crate) fn read_entry(&self, id: SlotId) -> PartitionEntry {
        match id {
            SlotId::Primary(slot) => PartitionEntry::read(&self.boot, slot),
            SlotId::Logical(pos) => {
                let slot = &self.logical[pos];
                PartitionEntry::read(&slot.buffer, slot.data_index)
            }
        }
    }

    pub(crate) fn write_entry(&mut self, id: SlotId, entry: &PartitionEntry) {
        match id {
            SlotId::Primary(slot) => {
                entry.write(&mut self.boot, slot);
                self.boot_dirty = true;
            }
            SlotId::Logical(pos) => {
                let slot = &mut self.logical[pos];
                entry.write(&mut slot.buffer, slot.data_index);
                slot.dirty = true;
            }
        }
    }

    pub(crate) fn clear_entry(&mut self, id: SlotId) {
        self.write_entry(id, &PartitionEntry::default());
    }

    pub(crate) fn link_entry(&self, pos: usize) -> PartitionEntry {
        let slot = &self.logical[pos];
        PartitionEntry::read(&slot.buffer, slot.link_index)
    }

    pub(crate) fn write_link_entry(&mut self, pos: usize, entry: &PartitionEntry) {
        let slot = &mut self.logical[pos];
        entry.write(&mut slot.buffer, slot.link_index);
        slot.dirty = true;
    }

    /// The sector a slot's start field is relative to: zero for primaries,
    /// the owning extended boot record for logicals.
    pub(crate) fn slot_offset(&self, id: SlotId) -> u64 {
        match id {
            SlotId::Primary(_) => 0,
            SlotId::Logical(pos) => self.logical[pos].offset,
        }
    }

    /// Absolute `[first, last]` extents of every data slot; empty and
    /// chain-link slots get an inverted sentinel interval.
    pub(crate) fn fill_bounds(&self) -> (Vec<u64>, Vec<u64>) {
        let slots = self.slots();
        let mut first = Vec::with_capacity(slots);
        let mut last = Vec::with_capacity(slots);
        for slot in 0..slots {
            let id = SlotId::from_index(slot);
            let entry = self.read_entry(id);
            if entry.is_empty() || entry.is_extended() {
                first.push(u64::MAX);
                last.push(0);
            } else {
                let start = u64::from(entry.start_sect) + self.slot_offset(id);
                first.push(start);
                last.push(start + u64::from(entry.nr_sects).saturating_sub(1));
            }
        }
        (first, last)
    }
}
