use crate::common::constants::PAGE_SIZE;
use crate::common::{Error, Result};
use crate::storage::buffer::{BufferPoolManager, ReplacementPolicy};
use crate::storage::disk::{DiskManager, PageId};
use crate::storage::page::RecordId;
use crate::storage::tuple::{Record, TOMBSTONE_DEAD, TOMBSTONE_LIVE};
use crate::types::{Attribute, DataType, Schema};
use log::debug;
use std::path::Path;

const DATA_START_PAGE: PageId = 1;

/// A named, schema-backed table bound to its own dedicated buffer pool
/// (spec §3 "Table"). Page 0 holds the serialized schema and bookkeeping
/// metadata; pages `1..K` hold fixed-size slotted tuple data.
pub struct Table {
    name: String,
    schema: Schema,
    pool: BufferPoolManager,
    tuple_count: i32,
    first_free_page: PageId,
    record_size: usize,
    slots_per_page: usize,
}

impl Table {
    fn header_bytes(schema: &Schema, tuple_count: i32, first_free_page: PageId) -> Vec<u8> {
        let mut buf = Vec::with_capacity(PAGE_SIZE);
        buf.extend_from_slice(&tuple_count.to_le_bytes());
        buf.extend_from_slice(&first_free_page.to_le_bytes());
        buf.extend_from_slice(&(schema.num_attributes() as i32).to_le_bytes());
        buf.extend_from_slice(&(schema.key_size() as i32).to_le_bytes());
        for attr in schema.attributes() {
            let name_bytes = attr.name.as_bytes();
            buf.extend_from_slice(&(name_bytes.len() as i32).to_le_bytes());
            buf.extend_from_slice(name_bytes);
            buf.extend_from_slice(&attr.data_type.as_i32().to_le_bytes());
            buf.extend_from_slice(&(attr.type_length as i32).to_le_bytes());
        }
        for &k in schema.key_attrs() {
            buf.extend_from_slice(&(k as i32).to_le_bytes());
        }
        if buf.len() > PAGE_SIZE {
            panic!("schema too large to fit in a single header page");
        }
        buf.resize(PAGE_SIZE, 0);
        buf
    }

    fn parse_header(buf: &[u8; PAGE_SIZE]) -> Result<(Schema, i32, i32)> {
        let mut off = 0;
        let read_i32 = |buf: &[u8], off: &mut usize| -> i32 {
            let v = i32::from_le_bytes(buf[*off..*off + 4].try_into().unwrap());
            *off += 4;
            v
        };
        let tuple_count = read_i32(buf, &mut off);
        let first_free_page = read_i32(buf, &mut off);
        let num_attr = read_i32(buf, &mut off);
        let key_size = read_i32(buf, &mut off);
        if num_attr < 0 || key_size < 0 {
            return Err(Error::InvalidArgument("corrupt table header".into()));
        }
        let mut attrs = Vec::with_capacity(num_attr as usize);
        for _ in 0..num_attr {
            let name_len = read_i32(buf, &mut off) as usize;
            let name = String::from_utf8_lossy(&buf[off..off + name_len]).into_owned();
            off += name_len;
            let data_type = DataType::from_i32(read_i32(buf, &mut off))?;
            let type_length = read_i32(buf, &mut off) as usize;
            attrs.push(Attribute {
                name,
                data_type,
                type_length,
            });
        }
        let mut key_attrs = Vec::with_capacity(key_size as usize);
        for _ in 0..key_size {
            key_attrs.push(read_i32(buf, &mut off) as usize);
        }
        Ok((Schema::new(attrs, key_attrs)?, tuple_count, first_free_page))
    }

    /// `createTable`: creates the backing page file, writes the schema
    /// header into page 0, and opens a dedicated buffer pool over it.
    pub fn create(
        name: impl AsRef<Path>,
        schema: Schema,
        pool_size: usize,
        policy: ReplacementPolicy,
    ) -> Result<Self> {
        let name = name.as_ref();
        if name.as_os_str().is_empty() {
            return Err(Error::InvalidArgument("table name is empty".into()));
        }
        DiskManager::create(name)?;
        let disk_manager = DiskManager::open(name)?;
        let mut pool = BufferPoolManager::init(disk_manager, pool_size, policy)?;

        let header = Self::header_bytes(&schema, 0, DATA_START_PAGE);
        {
            let handle = pool.pin(0)?;
            handle.write().unwrap().data_mut().copy_from_slice(&header);
            pool.mark_dirty(0)?;
            pool.unpin(0)?;
        }
        pool.force_flush()?;

        let record_size = schema.record_size();
        let slots_per_page = (PAGE_SIZE / record_size).max(1);

        Ok(Table {
            name: name.display().to_string(),
            schema,
            pool,
            tuple_count: 0,
            first_free_page: DATA_START_PAGE,
            record_size,
            slots_per_page,
        })
    }

    /// `openTable`: opens an existing table file and reconstructs its
    /// schema and metadata from the page-0 header.
    pub fn open(name: impl AsRef<Path>, pool_size: usize, policy: ReplacementPolicy) -> Result<Self> {
        let name = name.as_ref();
        let disk_manager = DiskManager::open(name)?;
        let mut pool = BufferPoolManager::init(disk_manager, pool_size, policy)?;

        let (schema, tuple_count, first_free_page) = {
            let handle = pool.pin(0)?;
            let parsed = Self::parse_header(handle.read().unwrap().data());
            pool.unpin(0)?;
            parsed?
        };

        let record_size = schema.record_size();
        let slots_per_page = (PAGE_SIZE / record_size).max(1);

        Ok(Table {
            name: name.display().to_string(),
            schema,
            pool,
            tuple_count,
            first_free_page,
            record_size,
            slots_per_page,
        })
    }

    /// `closeTable`: flushes all dirty pages and releases the buffer pool.
    pub fn close(self) -> Result<()> {
        self.pool.force_flush()?;
        self.pool.shutdown()
    }

    /// `deleteTable`: closes and removes the backing file. Callers must not
    /// reuse a `Table` they pass here.
    pub fn destroy(self) -> Result<()> {
        let name = self.name.clone();
        self.pool.shutdown()?;
        DiskManager::destroy(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn get_num_tuples(&self) -> i32 {
        self.tuple_count
    }

    fn write_header_counts(&mut self) -> Result<()> {
        let handle = self.pool.pin(0)?;
        {
            let mut page = handle.write().unwrap();
            let buf = page.data_mut();
            buf[0..4].copy_from_slice(&self.tuple_count.to_le_bytes());
            buf[4..8].copy_from_slice(&self.first_free_page.to_le_bytes());
        }
        self.pool.mark_dirty(0)?;
        self.pool.unpin(0)
    }

    fn slot_offset(&self, slot: i32) -> usize {
        slot as usize * self.record_size
    }

    /// `insert`: finds the first page at or after `firstFreePage` with a
    /// tombstoned or never-used slot, writing the record there and growing
    /// the file when every existing page from `firstFreePage` onward is
    /// full (spec §4.2 "Insert").
    pub fn insert(&mut self, record: &mut Record) -> Result<RecordId> {
        let mut page_num = self.first_free_page.max(DATA_START_PAGE);
        let rid = loop {
            if page_num >= self.pool.total_num_pages() {
                self.pool.append_page()?;
            }
            let handle = self.pool.pin(page_num)?;
            let found_slot = {
                let page = handle.read().unwrap();
                let data = page.data();
                (0..self.slots_per_page).find(|&s| {
                    let off = self.slot_offset(s as i32);
                    data[off] != TOMBSTONE_LIVE
                })
            };
            match found_slot {
                Some(slot) => {
                    {
                        let mut page = handle.write().unwrap();
                        let off = self.slot_offset(slot as i32);
                        let data = page.data_mut();
                        data[off] = TOMBSTONE_LIVE;
                        let mut payload = Vec::with_capacity(self.record_size);
                        record.pack_into(&self.schema, &mut payload)?;
                        // pack_into includes the tombstone byte; skip it here.
                        data[off + 1..off + self.record_size]
                            .copy_from_slice(&payload[1..]);
                    }
                    self.pool.mark_dirty(page_num)?;
                    self.pool.unpin(page_num)?;
                    break RecordId::new(page_num, slot as i32);
                }
                None => {
                    self.pool.unpin(page_num)?;
                    page_num += 1;
                }
            }
        };
        self.tuple_count += 1;
        record.set_rid(rid);
        self.write_header_counts()?;
        debug!("inserted record into {} at {}", self.name, rid);
        Ok(rid)
    }

    /// `delete`: tombstones the slot and lowers `firstFreePage` to the
    /// deleted RID's page if it is smaller.
    pub fn delete(&mut self, rid: RecordId) -> Result<()> {
        let handle = self.pool.pin(rid.page)?;
        let result = {
            let mut page = handle.write().unwrap();
            let off = self.slot_offset(rid.slot);
            let data = page.data_mut();
            if data[off] != TOMBSTONE_LIVE {
                Err(Error::NotFound)
            } else {
                data[off] = TOMBSTONE_DEAD;
                Ok(())
            }
        };
        if result.is_ok() {
            self.pool.mark_dirty(rid.page)?;
        }
        self.pool.unpin(rid.page)?;
        result?;
        self.tuple_count -= 1;
        self.first_free_page = self.first_free_page.min(rid.page);
        self.write_header_counts()
    }

    /// `update`: overwrites the payload bytes of a live slot in place. The
    /// record's RID never changes.
    pub fn update(&mut self, record: &Record) -> Result<()> {
        let rid = record
            .rid()
            .ok_or_else(|| Error::InvalidArgument("record has no RID to update".into()))?;
        let handle = self.pool.pin(rid.page)?;
        let result = (|| {
            let mut page = handle.write().unwrap();
            let off = self.slot_offset(rid.slot);
            if page.data()[off] != TOMBSTONE_LIVE {
                return Err(Error::NotFound);
            }
            let mut payload = Vec::with_capacity(self.record_size);
            record.pack_into(&self.schema, &mut payload)?;
            let data = page.data_mut();
            data[off + 1..off + self.record_size].copy_from_slice(&payload[1..]);
            Ok(())
        })();
        if result.is_ok() {
            self.pool.mark_dirty(rid.page)?;
        }
        self.pool.unpin(rid.page)?;
        result
    }

    /// `get`: reads a live slot's payload into a `Record` with its RID set.
    pub fn get(&mut self, rid: RecordId) -> Result<Record> {
        let handle = self.pool.pin(rid.page)?;
        let result = (|| {
            let page = handle.read().unwrap();
            let off = self.slot_offset(rid.slot);
            let data = page.data();
            if data[off] != TOMBSTONE_LIVE {
                return Err(Error::NotFound);
            }
            let mut rec = Record::unpack(&self.schema, &data[off + 1..off + self.record_size])?;
            rec.set_rid(rid);
            Ok(rec)
        })();
        self.pool.unpin(rid.page)?;
        result
    }

    pub(crate) fn pool(&mut self) -> &mut BufferPoolManager {
        &mut self.pool
    }

    pub(crate) fn record_size(&self) -> usize {
        self.record_size
    }

    pub(crate) fn slots_per_page(&self) -> usize {
        self.slots_per_page
    }
}
