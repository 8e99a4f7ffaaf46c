use crate::error::DiskError;
use crate::label::{DosLabel, LogicalSlot, SlotId};
use mbr_types::{is_extended_type, PartitionEntry, ACTIVE_FLAG, DOS_EXTENDED, MAXIMUM_PARTS, PackedChs};

impl DosLabel {
    /// Creates a partition in an empty slot.
    ///
    /// The start defaults to the lowest free sector of the slot's region and
    /// the end to the rest of the largest free run; explicit values are
    /// honored only when the space is actually free. Creating a chain-link
    /// partition anchors the extended chain and allocates the (still empty)
    /// slot 4 at once.
    pub fn add_partition(
        &mut self,
        slot: usize,
        sys: u8,
        start: Option<u64>,
        end: Option<u64>,
    ) -> Result<(), DiskError> {
        let id = self.slot_id(slot)?;
        if sys == 0 {
            return Err(DiskError::InvalidTransition {
                slot,
                reason: "cannot be created as free space (type 0)",
            });
        }
        if !self.read_entry(id).is_empty() {
            return Err(DiskError::InvalidTransition {
                slot,
                reason: "is already defined; delete it before re-adding it",
            });
        }
        let logical_add = match id {
            SlotId::Primary(_) => false,
            SlotId::Logical(_) => true,
        };
        if is_extended_type(sys) {
            if logical_add {
                return Err(DiskError::InvalidTransition {
                    slot,
                    reason: "cannot hold a nested extended partition",
                });
            }
            if self.ext_index.is_some() {
                return Err(DiskError::InvalidTransition {
                    slot,
                    reason: "cannot be extended: an extended partition already exists",
                });
            }
        }

        info!("specifying to add partition {} with system id {:#04x}", slot + 1, sys);

        let slots = self.slots();
        let sector_offset = self.geometry.sector_offset(self.dos_compatible);
        let (mut first, mut last) = self.fill_bounds();
        let anchor = self.ext_index.map(|ext| {
            let entry = self.read_entry(SlotId::Primary(ext));
            (ext, u64::from(entry.start_sect) + u64::from(entry.nr_sects).saturating_sub(1))
        });

        let (floor, mut limit) = if logical_add {
            let (_, anchor_end) = anchor.ok_or(DiskError::InvalidTransition {
                slot,
                reason: "requires an extended partition",
            })?;
            (self.extended_offset + sector_offset, anchor_end)
        } else {
            if let Some((ext, anchor_end)) = anchor {
                // New primaries must clear the whole container, not just the
                // logicals currently inside it.
                first[ext] = self.extended_offset;
                last[ext] = anchor_end;
            }
            (sector_offset, self.geometry.total_sectors() - 1)
        };

        let offsets: Vec<u64> =
            (0..slots).map(|i| self.slot_offset(SlotId::from_index(i))).collect();
        let pad = if logical_add { sector_offset } else { 0 };
        // Push a candidate past every allocated interval and every record's
        // backing sector until it stops moving.
        let stabilize = |mut sector: u64| -> u64 {
            loop {
                let previous = sector;
                for i in 0..slots {
                    if sector == offsets[i] {
                        sector += sector_offset;
                    }
                    let last_padded = last[i] + pad;
                    if sector >= first[i] && sector <= last_padded {
                        sector = last_padded + 1;
                    }
                }
                if sector == previous {
                    break sector;
                }
            }
        };

        let mut start_sector = match start {
            Some(requested) => {
                if requested < floor || stabilize(requested) != requested {
                    return Err(DiskError::OutOfRange { sector: requested });
                }
                requested
            }
            None => stabilize(floor),
        };

        if let SlotId::Logical(pos) = id {
            if pos > 0 {
                let mut record = start_sector - sector_offset;
                if record == self.extended_offset {
                    record += 1;
                    if sector_offset == 1 {
                        start_sector += 1;
                    }
                }
                self.logical[pos].offset = record;
            }
        }

        for i in 0..slots {
            if start_sector < offsets[i] && limit >= offsets[i] {
                limit = offsets[i] - 1;
            }
            if start_sector < first[i] && limit >= first[i] {
                limit = first[i] - 1;
            }
        }
        if start_sector > limit {
            info!("no free sectors available");
            return Err(DiskError::OutOfRange { sector: start_sector });
        }

        let stop = match end {
            Some(requested) => {
                if requested < start_sector || requested > limit {
                    return Err(DiskError::OutOfRange { sector: requested });
                }
                requested
            }
            None => limit,
        };

        let offset = self.slot_offset(id);
        let entry = self.compose_entry(start_sector, stop, sys, offset);
        self.write_entry(id, &entry);

        if is_extended_type(sys) {
            if let SlotId::Primary(index) = id {
                self.ext_index = Some(index);
                self.extended_offset = start_sector;
                let buffer = vec![0; self.geometry.sector_size as usize];
                self.logical.push(LogicalSlot {
                    buffer,
                    offset: start_sector,
                    dirty: true,
                    data_index: 0,
                    link_index: 1,
                });
            }
        } else if let SlotId::Logical(pos) = id {
            if pos > 0 {
                // The predecessor's link must cover the new record.
                let record = self.logical[pos].offset;
                let link = self.compose_entry(record, stop, DOS_EXTENDED, self.extended_offset);
                self.write_link_entry(pos - 1, &link);
            }
        }

        Ok(())
    }

    /// Appends a logical partition at the tail of the chain, reusing the
    /// empty slot 4 when it is still unused. Returns the new slot number.
    pub fn add_logical(
        &mut self,
        sys: u8,
        start: Option<u64>,
        end: Option<u64>,
    ) -> Result<usize, DiskError> {
        if self.extended_offset == 0 {
            return Err(DiskError::InvalidTransition {
                slot: 4,
                reason: "requires an extended partition",
            });
        }
        if self.slots() >= MAXIMUM_PARTS {
            return Err(DiskError::CapacityExceeded);
        }

        let appended =
            self.logical.len() > 1 || !self.read_entry(SlotId::Logical(0)).is_empty();
        if appended {
            let buffer = vec![0; self.geometry.sector_size as usize];
            self.logical.push(LogicalSlot {
                buffer,
                offset: 0,
                dirty: false,
                data_index: 0,
                link_index: 1,
            });
        }

        let slot = self.slots() - 1;
        match self.add_partition(slot, sys, start, end) {
            Ok(()) => Ok(slot),
            Err(why) => {
                if appended {
                    self.logical.pop();
                }
                Err(why)
            }
        }
    }

    /// Deletes the partition at `slot`.
    ///
    /// Deleting the extended container abandons every logical partition with
    /// it. Deleting a logical partition splices the chain around the vacated
    /// record and shifts the higher slots down, so the chain stays a single
    /// unbroken sequence.
    pub fn delete(&mut self, slot: usize) -> Result<(), DiskError> {
        info!("specifying to delete partition {}", slot + 1);
        let id = self.slot_id(slot)?;
        match id {
            SlotId::Primary(index) => {
                let entry = self.read_entry(id);
                if entry.is_extended() && Some(index) == self.ext_index {
                    self.logical.clear();
                    self.ext_index = None;
                    self.extended_offset = 0;
                } else if entry.is_empty() {
                    return Err(DiskError::InvalidTransition { slot, reason: "does not exist yet" });
                }
                self.clear_entry(id);
            }
            SlotId::Logical(pos) => self.delete_logical(pos),
        }
        Ok(())
    }

    fn delete_logical(&mut self, pos: usize) {
        let link = self.link_entry(pos);
        if link.is_empty() && pos > 0 {
            // A trailing record with nothing behind it: drop it and cut the
            // predecessor's link.
            self.logical.pop();
            self.write_link_entry(pos - 1, &PartitionEntry::default());
            return;
        }
        if pos > 0 {
            // Splice the chain: the predecessor's link inherits this
            // record's link verbatim, CHS bytes included.
            let spliced = PartitionEntry {
                boot_ind: 0,
                start_chs: link.start_chs,
                sys_ind: DOS_EXTENDED,
                end_chs: link.end_chs,
                start_sect: link.start_sect,
                nr_sects: link.nr_sects,
            };
            self.write_link_entry(pos - 1, &spliced);
        } else if self.logical.len() > 1 {
            // The first record must stay on the chain anchor: relocate the
            // successor's buffer there and rebase its data entry.
            let delta = (self.logical[1].offset - self.extended_offset) as u32;
            let successor = SlotId::Logical(1);
            let mut entry = self.read_entry(successor);
            entry.start_sect += delta;
            self.write_entry(successor, &entry);
            self.logical[1].offset = self.extended_offset;
        }
        if self.logical.len() > 1 {
            self.logical.remove(pos);
        } else {
            // Only the lone slot 4 remains; clear it in place.
            self.clear_entry(SlotId::Logical(0));
        }
    }

    /// Moves the beginning of a partition's data area forward while its end
    /// stays fixed.
    pub fn move_begin(&mut self, slot: usize, new_start: u64) -> Result<(), DiskError> {
        let id = self.slot_id(slot)?;
        let entry = self.read_entry(id);
        if entry.is_empty() || entry.nr_sects == 0 || entry.is_extended() {
            return Err(DiskError::InvalidTransition { slot, reason: "has no data area" });
        }
        let offset = self.slot_offset(id);
        let first = u64::from(entry.start_sect) + offset;
        let last = first + u64::from(entry.nr_sects) - 1;
        if new_start < first || new_start > last {
            return Err(DiskError::OutOfRange { sector: new_start });
        }

        info!("specifying to move the beginning of partition {} to {}", slot + 1, new_start);
        let relative = new_start - offset;
        if relative != u64::from(entry.start_sect) {
            let mut entry = entry;
            entry.nr_sects = (u64::from(entry.nr_sects) + u64::from(entry.start_sect) - relative) as u32;
            entry.start_sect = relative as u32;
            // The packed CHS bytes stay as they were; verify() reports the
            // resulting physical/logical drift instead of hiding it.
            self.write_entry(id, &entry);
        }
        Ok(())
    }

    /// Changes a partition's system id.
    ///
    /// A change may not cross the boundary between chain-link and data
    /// types: the chain the loader walks would be corrupted. Delete and
    /// recreate instead.
    pub fn retype(&mut self, slot: usize, sys: u8) -> Result<(), DiskError> {
        let id = self.slot_id(slot)?;
        let mut entry = self.read_entry(id);
        if entry.is_empty() {
            return Err(DiskError::InvalidTransition { slot, reason: "does not exist yet" });
        }
        if sys == 0 {
            return Err(DiskError::InvalidTransition {
                slot,
                reason: "cannot become type 0 (free space); delete it instead",
            });
        }
        if is_extended_type(sys) != entry.is_extended() {
            return Err(DiskError::InvalidTransition {
                slot,
                reason: "cannot change between extended and non-extended; delete it first",
            });
        }

        info!("changing system id of partition {} to {:#04x}", slot + 1, sys);
        entry.sys_ind = sys;
        self.write_entry(id, &entry);
        Ok(())
    }

    /// Toggles the bootable flag on a partition; returns the new state.
    pub fn toggle_active(&mut self, slot: usize) -> Result<bool, DiskError> {
        let id = self.slot_id(slot)?;
        let mut entry = self.read_entry(id);
        if entry.is_extended() && !entry.is_active() {
            warn!("partition {} is an extended partition", slot + 1);
        }
        entry.boot_ind = if entry.is_active() { 0 } else { ACTIVE_FLAG };
        self.write_entry(id, &entry);
        Ok(entry.is_active())
    }

    /// Overrides the geometry for the rest of the session, keeping the
    /// sector size. Used when the probed values turn out to be wrong.
    pub fn set_geometry(&mut self, heads: u32, sectors: u32, cylinders: u32) -> Result<(), DiskError> {
        let geometry = mbr_types::Geometry { heads, sectors, cylinders, ..self.geometry };
        geometry.validate()?;
        info!("overriding geometry to {}/{}/{}", heads, sectors, cylinders);
        self.geometry = geometry;
        Ok(())
    }

    /// Builds an entry for `[start, stop]` with CHS fields derived from the
    /// current geometry and the LBA made relative to `offset`.
    fn compose_entry(&self, start: u64, stop: u64, sys: u8, offset: u64) -> PartitionEntry {
        PartitionEntry {
            boot_ind: 0,
            start_chs: PackedChs::pack(self.geometry.chs_for(start, self.dos_compatible)),
            sys_ind: sys,
            end_chs: PackedChs::pack(self.geometry.chs_for(stop, self.dos_compatible)),
            start_sect: (start - offset) as u32,
            nr_sects: (stop - start + 1) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::DosLabel;
    use mbr_types::{Chs, Geometry};

    // 16 heads * 63 sectors * 100 cylinders = 100800 sectors.
    const GEOMETRY: Geometry = Geometry { heads: 16, sectors: 63, cylinders: 100, sector_size: 512 };

    fn empty_label() -> DosLabel {
        DosLabel::create_empty(GEOMETRY).unwrap()
    }

    fn label_with_chain() -> DosLabel {
        let mut label = empty_label();
        label.add_partition(0, DOS_EXTENDED, Some(2048), None).unwrap();
        label
    }

    #[test]
    fn add_primary() {
        let geometry = Geometry { heads: 255, sectors: 63, cylinders: 13, sector_size: 512 };
        let mut label = DosLabel::create_empty(geometry).unwrap();
        label.add_partition(0, 0x83, Some(2048), Some(206_847)).unwrap();

        let parts = label.list();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].slot, 0);
        assert_eq!(parts[0].entry.nr_sects, 204_800);
        assert_eq!(parts[0].start_sector, 2048);
        assert_eq!(parts[0].end_sector, 206_847);
        assert_eq!(parts[0].entry.start_chs.unpack(), Chs { cylinder: 0, head: 32, sector: 33 });
    }

    #[test]
    fn add_rejects_occupied_slot() {
        let mut label = empty_label();
        label.add_partition(0, 0x83, None, Some(10_000)).unwrap();
        match label.add_partition(0, 0x83, None, None) {
            Err(DiskError::InvalidTransition { slot: 0, .. }) => (),
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
    }

    #[test]
    fn add_rejects_allocated_start() {
        let mut label = empty_label();
        label.add_partition(0, 0x83, Some(63), Some(10_000)).unwrap();
        match label.add_partition(1, 0x83, Some(5000), None) {
            Err(DiskError::OutOfRange { sector: 5000 }) => (),
            other => panic!("expected OutOfRange, got {:?}", other),
        }
        // Below the region floor is rejected as well.
        match label.add_partition(1, 0x83, Some(10), None) {
            Err(DiskError::OutOfRange { sector: 10 }) => (),
            other => panic!("expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn add_defaults_fill_the_free_run() {
        let mut label = empty_label();
        label.add_partition(0, 0x83, None, Some(10_000)).unwrap();
        label.add_partition(1, 0x83, None, None).unwrap();

        let parts = label.list();
        assert_eq!(parts[0].start_sector, 63);
        assert_eq!(parts[1].start_sector, 10_001);
        assert_eq!(parts[1].end_sector, 100_799);
    }

    #[test]
    fn one_sector_gap_boundary() {
        let geometry = Geometry { heads: 4, sectors: 16, cylinders: 10, sector_size: 512 };
        let mut label = DosLabel::create_empty(geometry).unwrap();
        label.add_partition(0, 0x83, Some(16), Some(600)).unwrap();
        label.add_partition(1, 0x83, Some(602), Some(639)).unwrap();

        // The lone free sector 601 is found and used whole.
        label.add_partition(2, 0x83, None, None).unwrap();
        let third = label.entry(2).unwrap();
        assert_eq!(third.start_sect, 601);
        assert_eq!(third.nr_sects, 1);

        // With no gap left, the next request is rejected without mutating.
        match label.add_partition(3, 0x83, None, None) {
            Err(DiskError::OutOfRange { .. }) => (),
            other => panic!("expected OutOfRange, got {:?}", other),
        }
        assert!(label.entry(3).unwrap().is_empty());
    }

    #[test]
    fn dos_clamp_past_cylinder_1024() {
        let geometry = Geometry { heads: 255, sectors: 63, cylinders: 2000, sector_size: 512 };
        let mut label = DosLabel::create_empty(geometry).unwrap();
        label.add_partition(0, 0x83, Some(63), Some(20_000_000)).unwrap();

        let entry = label.entry(0).unwrap();
        assert_eq!(entry.end_chs.unpack(), Chs { cylinder: 1023, head: 254, sector: 63 });
        // The LBA span is unaffected by the clamp.
        assert_eq!(entry.nr_sects, 19_999_938);
    }

    #[test]
    fn extended_allocates_slot_four() {
        let label = label_with_chain();
        assert_eq!(label.slots(), 5);
        assert_eq!(label.extended_index(), Some(0));
        assert_eq!(label.extended_offset, 2048);
        assert!(label.entry(4).unwrap().is_empty());
        assert!(label.logical[0].dirty);
    }

    #[test]
    fn second_extended_is_rejected() {
        let mut label = label_with_chain();
        match label.add_partition(1, 0x05, None, None) {
            Err(DiskError::InvalidTransition { slot: 1, .. }) => (),
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
    }

    #[test]
    fn logicals_chain_together() {
        let mut label = label_with_chain();
        assert_eq!(label.add_logical(0x83, None, Some(50_000)).unwrap(), 4);
        assert_eq!(label.add_logical(0x83, None, None).unwrap(), 5);

        let parts = label.list();
        assert_eq!(parts.len(), 3);
        assert_eq!((parts[1].start_sector, parts[1].end_sector), (2111, 50_000));
        assert_eq!((parts[2].start_sector, parts[2].end_sector), (50_064, 100_799));

        // The first record's link covers the second record and its data.
        let link = label.link_entry(0);
        assert_eq!(link.sys_ind, DOS_EXTENDED);
        assert_eq!(u64::from(link.start_sect) + label.extended_offset, 50_001);
        assert_eq!(link.nr_sects, 50_799);
    }

    #[test]
    fn add_logical_requires_chain() {
        let mut label = empty_label();
        match label.add_logical(0x83, None, None) {
            Err(DiskError::InvalidTransition { .. }) => (),
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
    }

    #[test]
    fn add_logical_rolls_back_when_full() {
        let mut label = label_with_chain();
        label.add_logical(0x83, None, None).unwrap();
        // The chain is full now; the appended record must not survive the
        // failed call.
        match label.add_logical(0x83, None, None) {
            Err(DiskError::OutOfRange { .. }) => (),
            other => panic!("expected OutOfRange, got {:?}", other),
        }
        assert_eq!(label.slots(), 5);
    }

    #[test]
    fn delete_first_logical_relocates_successor() {
        let mut label = label_with_chain();
        label.add_logical(0x83, None, Some(50_000)).unwrap();
        label.add_logical(0x83, None, None).unwrap();
        label.delete(4).unwrap();

        assert_eq!(label.slots(), 5);
        // The survivor kept its absolute position, rebased onto the anchor.
        assert_eq!(label.logical[0].offset, 2048);
        let parts = label.list();
        assert_eq!(parts.len(), 2);
        assert_eq!((parts[1].slot, parts[1].start_sector, parts[1].end_sector), (4, 50_064, 100_799));
        assert!(label.link_entry(0).is_empty());
    }

    #[test]
    fn delete_interior_logical_splices_chain() {
        let mut label = label_with_chain();
        label.add_logical(0x83, None, Some(20_000)).unwrap();
        label.add_logical(0x83, None, Some(40_000)).unwrap();
        label.add_logical(0x83, None, None).unwrap();
        let third_link = label.link_entry(1);

        label.delete(5).unwrap();

        assert_eq!(label.slots(), 6);
        let parts = label.list();
        assert_eq!(parts.len(), 3);
        assert_eq!((parts[1].start_sector, parts[1].end_sector), (2111, 20_000));
        assert_eq!((parts[2].start_sector, parts[2].end_sector), (40_064, 100_799));
        // The predecessor inherited the vacated record's link verbatim.
        let link = label.link_entry(0);
        assert_eq!(link.start_sect, third_link.start_sect);
        assert_eq!(link.nr_sects, third_link.nr_sects);
        assert_eq!(link.start_chs, third_link.start_chs);
    }

    #[test]
    fn delete_lone_logical_clears_in_place() {
        let mut label = label_with_chain();
        label.add_logical(0x83, None, None).unwrap();
        label.delete(4).unwrap();

        assert_eq!(label.slots(), 5);
        assert!(label.entry(4).unwrap().is_empty());
        assert_eq!(label.extended_index(), Some(0));
    }

    #[test]
    fn delete_container_abandons_chain() {
        let mut label = label_with_chain();
        label.add_logical(0x83, None, Some(50_000)).unwrap();
        label.add_logical(0x83, None, None).unwrap();
        label.delete(0).unwrap();

        assert_eq!(label.slots(), 4);
        assert_eq!(label.extended_index(), None);
        assert_eq!(label.extended_offset, 0);
        assert!(label.list().is_empty());
    }

    #[test]
    fn delete_empty_primary_is_rejected() {
        let mut label = empty_label();
        match label.delete(2) {
            Err(DiskError::InvalidTransition { slot: 2, .. }) => (),
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
    }

    #[test]
    fn capacity_ceiling() {
        let mut label = label_with_chain();
        for k in 0..(MAXIMUM_PARTS - 4) as u64 {
            let base = 2111 + k * 80;
            label.add_logical(0x83, Some(base), Some(base + 10)).unwrap();
        }
        assert_eq!(label.slots(), MAXIMUM_PARTS);
        match label.add_logical(0x83, None, None) {
            Err(DiskError::CapacityExceeded) => (),
            other => panic!("expected CapacityExceeded, got {:?}", other),
        }
    }

    #[test]
    fn move_begin_shrinks_from_the_front() {
        let mut label = empty_label();
        label.add_partition(0, 0x83, Some(63), Some(10_000)).unwrap();
        let before = label.entry(0).unwrap();

        label.move_begin(0, 1000).unwrap();
        let after = label.entry(0).unwrap();
        assert_eq!(after.start_sect, 1000);
        assert_eq!(after.nr_sects, 9001);
        // End stays fixed, CHS bytes untouched.
        assert_eq!(
            u64::from(after.start_sect) + u64::from(after.nr_sects),
            u64::from(before.start_sect) + u64::from(before.nr_sects)
        );
        assert_eq!(after.start_chs, before.start_chs);
    }

    #[test]
    fn move_begin_rejections() {
        let mut label = label_with_chain();
        match label.move_begin(0, 3000) {
            Err(DiskError::InvalidTransition { .. }) => (),
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
        label.add_logical(0x83, None, None).unwrap();
        match label.move_begin(4, 2048) {
            Err(DiskError::OutOfRange { .. }) => (),
            other => panic!("expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn move_begin_on_logical_is_relative_to_its_record() {
        let mut label = label_with_chain();
        label.add_logical(0x83, None, None).unwrap();
        label.move_begin(4, 3000).unwrap();

        let parts = label.list();
        assert_eq!(parts[1].start_sector, 3000);
        assert_eq!(parts[1].end_sector, 100_799);
    }

    #[test]
    fn retype_boundaries() {
        let mut label = label_with_chain();
        label.add_partition(1, 0x83, None, Some(1000)).unwrap();

        label.retype(1, 0x8e).unwrap();
        assert_eq!(label.entry(1).unwrap().sys_ind, 0x8e);
        // The container may switch among the chain-link ids.
        label.retype(0, 0x0f).unwrap();

        match label.retype(1, 0x05) {
            Err(DiskError::InvalidTransition { slot: 1, .. }) => (),
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
        match label.retype(0, 0x83) {
            Err(DiskError::InvalidTransition { slot: 0, .. }) => (),
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
        match label.retype(2, 0x83) {
            Err(DiskError::InvalidTransition { slot: 2, .. }) => (),
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
        match label.retype(1, 0) {
            Err(DiskError::InvalidTransition { slot: 1, .. }) => (),
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
    }

    #[test]
    fn toggle_active_flips_the_flag() {
        let mut label = empty_label();
        label.add_partition(0, 0x83, None, Some(1000)).unwrap();
        assert_eq!(label.toggle_active(0).unwrap(), true);
        assert!(label.entry(0).unwrap().is_active());
        assert_eq!(label.toggle_active(0).unwrap(), false);
        assert!(!label.entry(0).unwrap().is_active());
    }

    #[test]
    fn geometry_override() {
        let mut label = empty_label();
        label.set_geometry(255, 63, 50).unwrap();
        assert_eq!(label.geometry().heads, 255);
        assert_eq!(label.geometry().sector_size, 512);
        assert!(label.set_geometry(0, 63, 50).is_err());
    }

    #[test]
    fn track_alignment_respects_dos_mode() {
        let mut label = empty_label();
        label.set_dos_compatible(false);
        label.add_partition(0, 0x83, None, Some(1000)).unwrap();
        // Without DOS compatibility the floor is sector 1, not a track.
        assert_eq!(label.entry(0).unwrap().start_sect, 1);
    }
}
