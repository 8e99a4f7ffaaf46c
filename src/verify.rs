use crate::label::{DosLabel, SlotId};
use itertools::Itertools;
use mbr_types::{Chs, PartitionEntry};
use std::fmt;

/// A single advisory finding from [`DosLabel::verify`].
///
/// Findings are diagnostics for the caller to display; they never mutate the
/// label and never block a flush. Slot numbers render 1-based, the way
/// they are conventionally presented to operators.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum VerifyFinding {
    /// Stored and computed CHS disagree for the partition's first sector.
    MismatchedStart { slot: usize, stored: Chs, computed: Chs },
    /// Stored and computed CHS disagree for the partition's last sector.
    MismatchedEnd { slot: usize, stored: Chs, computed: Chs },
    /// The partition claims sector 0, which belongs to the boot record.
    ContainsSectorZero { slot: usize },
    HeadOutOfRange { slot: usize, head: u32, maximum: u32 },
    SectorOutOfRange { slot: usize, sector: u32, maximum: u32 },
    CylinderOutOfRange { slot: usize, cylinder: u32, maximum: u32 },
    /// The end CHS fields address a different sector than the LBA fields.
    EndDisagrees { slot: usize, stored: u64, computed: u64 },
    /// The partition does not end on a cylinder boundary.
    UnalignedEnd { slot: usize, stored: Chs },
    /// Two partitions' sector extents intersect.
    Overlap { slot: usize, other: usize },
    /// A logical slot holds no data partition.
    EmptyLogical { slot: usize },
    /// A logical partition leaks outside the extended container.
    OutsideExtended { slot: usize, container: usize },
    /// More sectors are allocated than the geometry provides.
    OverAllocated { total: u64, maximum: u64 },
    /// Sectors left unallocated by the current layout.
    Unallocated { sectors: u64 },
}

impl fmt::Display for VerifyFinding {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            VerifyFinding::MismatchedStart { slot, stored, computed } => write!(
                fmt,
                "partition {} has different physical/logical beginnings: phys={} logical={}",
                slot + 1,
                stored,
                computed
            ),
            VerifyFinding::MismatchedEnd { slot, stored, computed } => write!(
                fmt,
                "partition {} has different physical/logical endings: phys={} logical={}",
                slot + 1,
                stored,
                computed
            ),
            VerifyFinding::ContainsSectorZero { slot } => {
                write!(fmt, "partition {} contains sector 0", slot + 1)
            }
            VerifyFinding::HeadOutOfRange { slot, head, maximum } => write!(
                fmt,
                "partition {}: head {} greater than maximum {}",
                slot + 1,
                head,
                maximum
            ),
            VerifyFinding::SectorOutOfRange { slot, sector, maximum } => write!(
                fmt,
                "partition {}: sector {} greater than maximum {}",
                slot + 1,
                sector,
                maximum
            ),
            VerifyFinding::CylinderOutOfRange { slot, cylinder, maximum } => write!(
                fmt,
                "partition {}: cylinder {} greater than maximum {}",
                slot + 1,
                cylinder,
                maximum
            ),
            VerifyFinding::EndDisagrees { slot, stored, computed } => write!(
                fmt,
                "partition {}: previous sectors {} disagrees with total {}",
                slot + 1,
                stored,
                computed
            ),
            VerifyFinding::UnalignedEnd { slot, stored } => write!(
                fmt,
                "partition {} does not end on cylinder boundary: phys={}",
                slot + 1,
                stored
            ),
            VerifyFinding::Overlap { slot, other } => {
                write!(fmt, "partition {} overlaps partition {}", slot + 1, other + 1)
            }
            VerifyFinding::EmptyLogical { slot } => {
                write!(fmt, "logical partition {} is empty", slot + 1)
            }
            VerifyFinding::OutsideExtended { slot, container } => write!(
                fmt,
                "logical partition {} not entirely in partition {}",
                slot + 1,
                container + 1
            ),
            VerifyFinding::OverAllocated { total, maximum } => write!(
                fmt,
                "total allocated sectors {} greater than the maximum {}",
                total, maximum
            ),
            VerifyFinding::Unallocated { sectors } => {
                write!(fmt, "{} unallocated sectors", sectors)
            }
        }
    }
}

impl DosLabel {
    /// Cross-checks every occupied slot and the chain against the geometry.
    ///
    /// All findings are advisory: nothing is mutated and nothing is fixed.
    pub fn verify(&self) -> Vec<VerifyFinding> {
        let mut findings = Vec::new();
        let (first, last) = self.fill_bounds();
        let slots = self.slots();
        // Sector 0 is always spoken for.
        let mut total: u64 = 1;

        for slot in 0..slots {
            let entry = self.read_entry(SlotId::from_index(slot));
            if entry.is_empty() || entry.is_extended() {
                continue;
            }
            self.check_consistency(slot, &entry, &mut findings);
            self.check_end(slot, &entry, last[slot], &mut findings);
            total += last[slot] + 1 - first[slot];
        }

        // The sentinel bounds of empty and chain-link slots can never
        // satisfy either comparison, so no occupancy filter is needed.
        for (j, i) in (0..slots).tuple_combinations::<(usize, usize)>() {
            let intersects = (first[i] >= first[j] && first[i] <= last[j])
                || (last[i] <= last[j] && last[i] >= first[j]);
            if intersects {
                findings.push(VerifyFinding::Overlap { slot: j, other: i });
                total += first[i].max(first[j]);
                total -= last[i].min(last[j]);
            }
        }

        if self.extended_offset > 0 {
            if let Some(container) = self.ext_index {
                let anchor = self.read_entry(SlotId::Primary(container));
                let extended_last =
                    u64::from(anchor.start_sect) + u64::from(anchor.nr_sects).saturating_sub(1);
                for pos in 0..self.logical.len() {
                    let slot = 4 + pos;
                    // Each record occupies one sector of its own.
                    total += 1;
                    let entry = self.read_entry(SlotId::Logical(pos));
                    if entry.is_empty() {
                        if slot != 4 || slot + 1 < slots {
                            findings.push(VerifyFinding::EmptyLogical { slot });
                        }
                    } else if first[slot] < self.extended_offset || last[slot] > extended_last {
                        findings.push(VerifyFinding::OutsideExtended { slot, container });
                    }
                }
            }
        }

        let maximum = self.geometry.total_sectors();
        if total > maximum {
            findings.push(VerifyFinding::OverAllocated { total, maximum });
        } else if total < maximum {
            findings.push(VerifyFinding::Unallocated { sectors: maximum - total });
        }

        findings
    }

    /// Compares a primary entry's stored CHS against the CHS its LBA fields
    /// imply. Past 1024 cylinders the stored values are known-unreliable and
    /// only the cylinder-boundary check remains.
    fn check_consistency(&self, slot: usize, entry: &PartitionEntry, findings: &mut Vec<VerifyFinding>) {
        if slot >= 4 {
            return;
        }
        let geometry = self.geometry;
        let stored_start = entry.start_chs.unpack();
        let stored_end = entry.end_chs.unpack();
        let computed_start = geometry.lba_to_chs(u64::from(entry.start_sect));
        let computed_end = geometry
            .lba_to_chs(u64::from(entry.start_sect) + u64::from(entry.nr_sects).saturating_sub(1));

        if geometry.cylinders <= 1024 && stored_start != computed_start {
            findings.push(VerifyFinding::MismatchedStart {
                slot,
                stored: stored_start,
                computed: computed_start,
            });
        }
        if geometry.cylinders <= 1024 && stored_end != computed_end {
            findings.push(VerifyFinding::MismatchedEnd {
                slot,
                stored: stored_end,
                computed: computed_end,
            });
        }
        if stored_end.head != geometry.heads - 1 || stored_end.sector != geometry.sectors {
            findings.push(VerifyFinding::UnalignedEnd { slot, stored: stored_end });
        }
    }

    /// Sanity-checks an entry's end CHS against the geometry and against the
    /// absolute last sector its LBA fields claim.
    fn check_end(&self, slot: usize, entry: &PartitionEntry, last_sector: u64, findings: &mut Vec<VerifyFinding>) {
        let geometry = self.geometry;
        let end = entry.end_chs.unpack();
        // Wrapping on purpose: a raw sector byte of zero has always produced
        // an enormous value here, which the range check below then reports.
        let real_sector = u64::from(end.sector).wrapping_sub(1);
        let computed = u64::from(end.cylinder)
            .wrapping_mul(u64::from(geometry.sectors))
            .wrapping_add(real_sector)
            .wrapping_mul(u64::from(geometry.heads))
            .wrapping_add(u64::from(end.head));

        if computed == 0 {
            findings.push(VerifyFinding::ContainsSectorZero { slot });
        }
        if end.head >= geometry.heads {
            findings.push(VerifyFinding::HeadOutOfRange {
                slot,
                head: end.head,
                maximum: geometry.heads,
            });
        }
        if real_sector >= u64::from(geometry.sectors) {
            findings.push(VerifyFinding::SectorOutOfRange {
                slot,
                sector: end.sector,
                maximum: geometry.sectors,
            });
        }
        if end.cylinder >= geometry.cylinders {
            findings.push(VerifyFinding::CylinderOutOfRange {
                slot,
                cylinder: end.cylinder,
                maximum: geometry.cylinders,
            });
        }
        if geometry.cylinders <= 1024 && last_sector != computed {
            findings.push(VerifyFinding::EndDisagrees { slot, stored: last_sector, computed });
        }
    }
}
