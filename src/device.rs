use crate::error::DiskError;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Raw sector I/O on a seekable byte device.
///
/// The engine reads and writes whole sectors only, addressed by LBA; the
/// implementation decides how those map onto bytes. After a successful flush
/// the engine asks for a partition table re-read, which implementations may
/// treat as a no-op.
pub trait SectorDevice {
    /// Reads the sector at `lba` into `buf`, whose length is the sector size.
    fn read_sector(&mut self, lba: u64, buf: &mut [u8]) -> io::Result<()>;

    /// Writes `buf` as the sector at `lba`; partial writes are failures.
    fn write_sector(&mut self, lba: u64, buf: &[u8]) -> io::Result<()>;

    /// Asks the OS to re-read the device's partition table. Best-effort.
    fn reread_partition_table(&mut self) -> io::Result<()>;
}

/// A block device or disk image accessed through a file handle.
///
/// The handle holds an exclusive advisory lock for as long as it is open, so
/// a second editor on the same node is refused rather than silently raced.
pub struct FileDevice {
    file: File,
    path: PathBuf,
    sector_size: u64,
}

impl FileDevice {
    pub fn open<P: AsRef<Path>>(path: P, sector_size: u64) -> Result<FileDevice, DiskError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|why| DiskError::DeviceOpen { device: path.clone(), why })?;
        flock_exclusive(&file).map_err(|why| DiskError::DeviceLock { device: path.clone(), why })?;
        debug!("opened and locked {:?}", path);
        Ok(FileDevice { file, path, sector_size })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn flock_exclusive(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    if unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

impl SectorDevice for FileDevice {
    fn read_sector(&mut self, lba: u64, buf: &mut [u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(lba * self.sector_size))?;
        self.file.read_exact(buf)
    }

    fn write_sector(&mut self, lba: u64, buf: &[u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(lba * self.sector_size))?;
        self.file.write_all(buf)
    }

    #[cfg(target_os = "linux")]
    fn reread_partition_table(&mut self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        // BLKRRPART; only block devices accept it.
        const BLKRRPART: libc::c_ulong = 0x125f;

        self.file.sync_all()?;
        if unsafe { libc::ioctl(self.file.as_raw_fd(), BLKRRPART) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    fn reread_partition_table(&mut self) -> io::Result<()> {
        self.file.sync_all()
    }
}

/// An in-memory device for exercising the engine without real media.
#[cfg(test)]
pub(crate) struct MemDevice {
    pub bytes: Vec<u8>,
    pub sector_size: usize,
    pub reread_requests: usize,
}

#[cfg(test)]
impl MemDevice {
    pub fn new(sectors: usize, sector_size: usize) -> MemDevice {
        MemDevice { bytes: vec![0; sectors * sector_size], sector_size, reread_requests: 0 }
    }

    fn range(&self, lba: u64, len: usize) -> io::Result<std::ops::Range<usize>> {
        let start = lba as usize * self.sector_size;
        if start + len > self.bytes.len() {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "sector out of range"));
        }
        Ok(start..start + len)
    }
}

#[cfg(test)]
impl SectorDevice for MemDevice {
    fn read_sector(&mut self, lba: u64, buf: &mut [u8]) -> io::Result<()> {
        let range = self.range(lba, buf.len())?;
        buf.copy_from_slice(&self.bytes[range]);
        Ok(())
    }

    fn write_sector(&mut self, lba: u64, buf: &[u8]) -> io::Result<()> {
        let range = self.range(lba, buf.len())?;
        self.bytes[range].copy_from_slice(buf);
        Ok(())
    }

    fn reread_partition_table(&mut self) -> io::Result<()> {
        self.reread_requests += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn scratch(dir: &TempDir, sectors: u64, sector_size: u64) -> PathBuf {
        let path = dir.path().join("disk.img");
        let file = File::create(&path).unwrap();
        file.set_len(sectors * sector_size).unwrap();
        path
    }

    #[test]
    fn sector_io() {
        let dir = TempDir::new("doslabel").unwrap();
        let path = scratch(&dir, 16, 512);

        let mut device = FileDevice::open(&path, 512).unwrap();
        let mut sector = vec![0xabu8; 512];
        device.write_sector(3, &sector).unwrap();
        sector.iter_mut().for_each(|b| *b = 0);
        device.read_sector(3, &mut sector).unwrap();
        assert!(sector.iter().all(|&b| b == 0xab));

        device.read_sector(2, &mut sector).unwrap();
        assert!(sector.iter().all(|&b| b == 0));
    }

    #[test]
    fn second_open_is_refused() {
        let dir = TempDir::new("doslabel").unwrap();
        let path = scratch(&dir, 16, 512);

        let _device = FileDevice::open(&path, 512).unwrap();
        match FileDevice::open(&path, 512) {
            Err(DiskError::DeviceLock { .. }) => (),
            other => panic!("expected a lock failure, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn lock_released_on_drop() {
        let dir = TempDir::new("doslabel").unwrap();
        let path = scratch(&dir, 16, 512);

        drop(FileDevice::open(&path, 512).unwrap());
        assert!(FileDevice::open(&path, 512).is_ok());
    }
}
