use crate::common::constants::PAGE_SIZE;
use crate::common::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A page number within one file. Page 0 is always the resource's header.
pub type PageId = i32;

/// The external collaborator named in spec §4.4/§6: a named byte file
/// divided into `PAGE_SIZE`-byte blocks. The buffer pool is this type's only
/// caller; no other layer touches a page file directly except to create or
/// destroy it.
#[derive(Debug)]
pub struct DiskManager {
    file_name: PathBuf,
    file: File,
    total_num_pages: i32,
    cur_page_pos: i32,
}

impl DiskManager {
    /// `createPageFile`: initializes a new file with one zero-filled block.
    /// Fails if the file already exists.
    pub fn create(name: impl AsRef<Path>) -> Result<()> {
        let name = name.as_ref();
        if name.exists() {
            return Err(Error::InvalidArgument(format!(
                "page file already exists: {}",
                name.display()
            )));
        }
        let mut file = File::create(name)?;
        file.write_all(&[0u8; PAGE_SIZE])?;
        file.sync_all()?;
        Ok(())
    }

    /// `openPageFile`: opens an existing file and populates
    /// `{fileName, totalNumPages, curPagePos}`.
    pub fn open(name: impl AsRef<Path>) -> Result<Self> {
        let name = name.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(name)
            .map_err(|_| Error::FileNotFound(name.display().to_string()))?;
        let len = file.metadata()?.len();
        if len as usize % PAGE_SIZE != 0 {
            return Err(Error::IoFailure(format!(
                "page file {} has a size not a multiple of PAGE_SIZE",
                name.display()
            )));
        }
        Ok(DiskManager {
            file_name: name.to_path_buf(),
            file,
            total_num_pages: (len as usize / PAGE_SIZE) as i32,
            cur_page_pos: 0,
        })
    }

    /// `destroyPageFile`: removes the file this manager can no longer serve
    /// reads/writes against. Caller must have closed (dropped) the manager.
    pub fn destroy(name: impl AsRef<Path>) -> Result<()> {
        std::fs::remove_file(name.as_ref())
            .map_err(|_| Error::FileNotFound(name.as_ref().display().to_string()))
    }

    pub fn file_name(&self) -> &Path {
        &self.file_name
    }

    pub fn total_num_pages(&self) -> i32 {
        self.total_num_pages
    }

    fn check_page_num(&self, page_num: PageId) -> Result<()> {
        if page_num < 0 || page_num >= self.total_num_pages {
            Err(Error::NoSuchPage(page_num))
        } else {
            Ok(())
        }
    }

    /// `readBlock`: reads the `PAGE_SIZE` bytes of `page_num` into `buf`.
    pub fn read_block(&mut self, page_num: PageId, buf: &mut [u8; PAGE_SIZE]) -> Result<()> {
        self.check_page_num(page_num)?;
        self.file
            .seek(SeekFrom::Start((page_num as u64) * PAGE_SIZE as u64))?;
        self.file.read_exact(buf)?;
        self.cur_page_pos = page_num;
        Ok(())
    }

    /// `writeBlock`: overwrites the `PAGE_SIZE` bytes of `page_num` with `buf`.
    pub fn write_block(&mut self, page_num: PageId, buf: &[u8; PAGE_SIZE]) -> Result<()> {
        self.check_page_num(page_num)?;
        self.file
            .seek(SeekFrom::Start((page_num as u64) * PAGE_SIZE as u64))?;
        self.file
            .write_all(buf)
            .map_err(|e| Error::WriteFailed(e.to_string()))?;
        self.cur_page_pos = page_num;
        Ok(())
    }

    /// `appendEmptyBlock`: grows the file by one zero-filled block, returning
    /// its page number.
    pub fn append_empty_block(&mut self) -> Result<PageId> {
        let new_page = self.total_num_pages;
        self.file.seek(SeekFrom::End(0))?;
        self.file
            .write_all(&[0u8; PAGE_SIZE])
            .map_err(|e| Error::WriteFailed(e.to_string()))?;
        self.total_num_pages += 1;
        Ok(new_page)
    }

    /// `ensureCapacity`: appends empty blocks until `totalNumPages >= n`.
    pub fn ensure_capacity(&mut self, n: i32) -> Result<()> {
        while self.total_num_pages < n {
            self.append_empty_block()?;
        }
        Ok(())
    }

    pub fn current_page(&self) -> PageId {
        self.cur_page_pos
    }

    pub fn first_page(&self) -> PageId {
        0
    }

    pub fn last_page(&self) -> PageId {
        self.total_num_pages - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_open_starts_with_one_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.page");
        DiskManager::create(&path).unwrap();
        let dm = DiskManager::open(&path).unwrap();
        assert_eq!(dm.total_num_pages(), 1);
    }

    #[test]
    fn create_refuses_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dup.page");
        DiskManager::create(&path).unwrap();
        assert!(DiskManager::create(&path).is_err());
    }

    #[test]
    fn write_then_read_round_trips_a_block() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rw.page");
        DiskManager::create(&path).unwrap();
        let mut dm = DiskManager::open(&path).unwrap();
        let mut out = [0xCDu8; PAGE_SIZE];
        dm.write_block(0, &out).unwrap();
        let mut back = [0u8; PAGE_SIZE];
        dm.read_block(0, &mut back).unwrap();
        assert_eq!(back, out);
        out[0] = 1;
        assert_ne!(back, out);
    }

    #[test]
    fn append_empty_block_grows_total_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grow.page");
        DiskManager::create(&path).unwrap();
        let mut dm = DiskManager::open(&path).unwrap();
        let page = dm.append_empty_block().unwrap();
        assert_eq!(page, 1);
        assert_eq!(dm.total_num_pages(), 2);
    }

    #[test]
    fn out_of_range_page_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("range.page");
        DiskManager::create(&path).unwrap();
        let mut dm = DiskManager::open(&path).unwrap();
        let mut buf = [0u8; PAGE_SIZE];
        assert_eq!(dm.read_block(5, &mut buf).unwrap_err(), Error::NoSuchPage(5));
    }
}
