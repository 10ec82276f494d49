use std::sync::Arc;

use crate::common::{DbError, PageId, RecordId, Result, TransactionId, PAGE_SIZE};
use crate::tuple::{Field, Tuple, TupleDesc};

/// Heap page layout:
///
/// +------------------+
/// | Header Bitmap    |  ceil(slots / 8) bytes, bit i set = slot i occupied
/// +------------------+
/// | Slot 0           |  tuple_size bytes each, packed after the header
/// | Slot 1           |
/// | ...              |
/// +------------------+
/// | Zero Padding     |
/// +------------------+
///
/// `slots = (PAGE_SIZE * 8) / (tuple_size * 8 + 1)`: each slot costs its
/// payload plus one header bit.
///
/// A page also remembers which transaction dirtied it (if any) and a
/// before-image: a byte snapshot taken at construction and re-captured at
/// every commit, used to roll back aborted modifications.
pub struct HeapPage {
    pid: PageId,
    desc: Arc<TupleDesc>,
    tuples: Vec<Option<Tuple>>,
    dirtier: Option<TransactionId>,
    before_image: Vec<u8>,
}

impl HeapPage {
    /// Number of tuple slots a page with the given schema holds.
    pub fn slot_count(desc: &TupleDesc) -> usize {
        (PAGE_SIZE * 8) / (desc.byte_size() * 8 + 1)
    }

    /// Size of the header bitmap in bytes.
    pub fn header_size(desc: &TupleDesc) -> usize {
        (Self::slot_count(desc) + 7) / 8
    }

    /// A zeroed page image; parses as a page with every slot empty.
    pub fn empty_page_data() -> Vec<u8> {
        vec![0u8; PAGE_SIZE]
    }

    /// Parses a page from its on-disk representation. Occupied slots are
    /// deserialized into tuples addressed as `(pid, slot)`; empty slots are
    /// skipped without allocating.
    ///
    /// # Panics
    /// Panics if `data` is not exactly PAGE_SIZE bytes.
    pub fn parse(pid: PageId, desc: Arc<TupleDesc>, data: &[u8]) -> Result<Self> {
        assert_eq!(data.len(), PAGE_SIZE, "Page buffer must be PAGE_SIZE bytes");

        let slot_count = Self::slot_count(&desc);
        let header_size = Self::header_size(&desc);
        let tuple_size = desc.byte_size();

        let mut tuples = Vec::with_capacity(slot_count);
        for slot in 0..slot_count {
            if data[slot / 8] & (1 << (slot % 8)) == 0 {
                tuples.push(None);
                continue;
            }

            let start = header_size + slot * tuple_size;
            let mut bytes = &data[start..start + tuple_size];
            let mut tuple = Tuple::new(desc.clone());
            for (i, ty) in desc.types().enumerate() {
                tuple.set_field(i, Field::read_from(ty, &mut bytes)?);
            }
            tuple.set_record_id(RecordId::new(pid, slot));
            tuples.push(Some(tuple));
        }

        Ok(Self {
            pid,
            desc,
            tuples,
            dirtier: None,
            before_image: data.to_vec(),
        })
    }

    /// Returns the page id.
    pub fn pid(&self) -> PageId {
        self.pid
    }

    /// Returns the schema of the tuples on this page.
    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    /// Returns the tuples in occupied slots, in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter().filter_map(|t| t.as_ref())
    }

    /// Counts the empty slots on this page.
    pub fn empty_slot_count(&self) -> usize {
        self.tuples.iter().filter(|t| t.is_none()).count()
    }

    /// Inserts a tuple into the lowest-index empty slot and stamps its
    /// record id. Fails with `PageFull` when no slot is empty and
    /// `SchemaMismatch` when the tuple's schema differs from the page's.
    pub fn insert_tuple(&mut self, mut t: Tuple) -> Result<RecordId> {
        if **t.desc() != *self.desc {
            return Err(DbError::SchemaMismatch);
        }

        let slot = self
            .tuples
            .iter()
            .position(|t| t.is_none())
            .ok_or(DbError::PageFull(self.pid))?;

        let rid = RecordId::new(self.pid, slot);
        t.set_record_id(rid);
        self.tuples[slot] = Some(t);
        Ok(rid)
    }

    /// Clears the slot addressed by the tuple's record id. Fails with
    /// `TupleNotOnPage` when the tuple addresses a different page or the
    /// slot is already empty.
    pub fn delete_tuple(&mut self, t: &Tuple) -> Result<()> {
        let rid = t.record_id().ok_or(DbError::TupleNotOnPage(None))?;
        if rid.page_id != self.pid || rid.slot >= self.tuples.len() {
            return Err(DbError::TupleNotOnPage(Some(rid)));
        }
        if self.tuples[rid.slot].is_none() {
            return Err(DbError::TupleNotOnPage(Some(rid)));
        }

        self.tuples[rid.slot] = None;
        Ok(())
    }

    /// Serializes the page: the inverse of `parse`. Empty slots and the
    /// trailing padding are zeroed, so the round-trip is exact.
    pub fn page_data(&self) -> Vec<u8> {
        let header_size = Self::header_size(&self.desc);
        let tuple_size = self.desc.byte_size();

        let mut data = vec![0u8; PAGE_SIZE];
        for (slot, tuple) in self.tuples.iter().enumerate() {
            let Some(tuple) = tuple else { continue };

            data[slot / 8] |= 1 << (slot % 8);

            let mut offset = header_size + slot * tuple_size;
            for (i, ty) in self.desc.types().enumerate() {
                if let Some(field) = tuple.field(i) {
                    let mut window = &mut data[offset..offset + ty.byte_len()];
                    // the window is sized from the schema, so the write
                    // cannot come up short
                    field.write_to(&mut window).expect("slot write");
                }
                offset += ty.byte_len();
            }
        }
        data
    }

    /// Returns which transaction dirtied this page, if any.
    pub fn dirtier(&self) -> Option<TransactionId> {
        self.dirtier
    }

    /// Marks the page dirty by `tid`, or clean.
    pub fn mark_dirty(&mut self, dirty: bool, tid: TransactionId) {
        self.dirtier = if dirty { Some(tid) } else { None };
    }

    /// Returns the byte snapshot taken at the last commit (or at load).
    pub fn before_image_data(&self) -> &[u8] {
        &self.before_image
    }

    /// Reconstructs the page as of its last commit.
    pub fn before_image(&self) -> Result<HeapPage> {
        Self::parse(self.pid, self.desc.clone(), &self.before_image)
    }

    /// Captures the current bytes as the new before-image. Called when the
    /// dirtying transaction commits.
    pub fn set_before_image(&mut self) {
        self.before_image = self.page_data();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::FieldType;

    fn int_desc() -> Arc<TupleDesc> {
        TupleDesc::named(vec![("a", FieldType::Int)]).into_arc()
    }

    fn int_tuple(desc: &Arc<TupleDesc>, v: i32) -> Tuple {
        Tuple::with_fields(desc.clone(), vec![Field::Int(v)])
    }

    #[test]
    fn test_slot_math() {
        let desc = int_desc();
        // 4-byte tuples: (4096 * 8) / 33 slots
        assert_eq!(HeapPage::slot_count(&desc), 992);
        assert_eq!(HeapPage::header_size(&desc), 124);

        let text_desc = TupleDesc::unnamed(vec![FieldType::Int, FieldType::Text]).into_arc();
        let tuple_bits = text_desc.byte_size() * 8 + 1;
        assert_eq!(
            HeapPage::slot_count(&text_desc),
            PAGE_SIZE * 8 / tuple_bits
        );
    }

    #[test]
    fn test_empty_page() {
        let desc = int_desc();
        let page = HeapPage::parse(PageId::new(1, 0), desc.clone(), &HeapPage::empty_page_data())
            .unwrap();

        assert_eq!(page.empty_slot_count(), HeapPage::slot_count(&desc));
        assert_eq!(page.iter().count(), 0);
        assert_eq!(page.dirtier(), None);
    }

    #[test]
    fn test_insert_fills_lowest_slot() {
        let desc = int_desc();
        let pid = PageId::new(1, 0);
        let mut page = HeapPage::parse(pid, desc.clone(), &HeapPage::empty_page_data()).unwrap();

        let rid0 = page.insert_tuple(int_tuple(&desc, 10)).unwrap();
        let rid1 = page.insert_tuple(int_tuple(&desc, 20)).unwrap();
        assert_eq!(rid0, RecordId::new(pid, 0));
        assert_eq!(rid1, RecordId::new(pid, 1));

        // deleting slot 0 makes it the lowest empty slot again
        let first = page.iter().next().unwrap().clone();
        page.delete_tuple(&first).unwrap();
        let rid2 = page.insert_tuple(int_tuple(&desc, 30)).unwrap();
        assert_eq!(rid2, RecordId::new(pid, 0));
    }

    #[test]
    fn test_insert_schema_mismatch() {
        let desc = int_desc();
        let mut page =
            HeapPage::parse(PageId::new(1, 0), desc, &HeapPage::empty_page_data()).unwrap();

        let other = TupleDesc::unnamed(vec![FieldType::Text]).into_arc();
        let t = Tuple::with_fields(other.clone(), vec![Field::text("x")]);
        assert!(matches!(page.insert_tuple(t), Err(DbError::SchemaMismatch)));
    }

    #[test]
    fn test_insert_into_full_page() {
        let desc = int_desc();
        let mut page =
            HeapPage::parse(PageId::new(1, 0), desc.clone(), &HeapPage::empty_page_data())
                .unwrap();

        for i in 0..HeapPage::slot_count(&desc) {
            page.insert_tuple(int_tuple(&desc, i as i32)).unwrap();
        }
        assert_eq!(page.empty_slot_count(), 0);
        assert!(matches!(
            page.insert_tuple(int_tuple(&desc, -1)),
            Err(DbError::PageFull(_))
        ));
    }

    #[test]
    fn test_delete_twice_fails() {
        let desc = int_desc();
        let mut page =
            HeapPage::parse(PageId::new(1, 0), desc.clone(), &HeapPage::empty_page_data())
                .unwrap();

        page.insert_tuple(int_tuple(&desc, 1)).unwrap();
        let stored = page.iter().next().unwrap().clone();

        page.delete_tuple(&stored).unwrap();
        assert!(matches!(
            page.delete_tuple(&stored),
            Err(DbError::TupleNotOnPage(_))
        ));
    }

    #[test]
    fn test_delete_wrong_page() {
        let desc = int_desc();
        let mut page =
            HeapPage::parse(PageId::new(1, 0), desc.clone(), &HeapPage::empty_page_data())
                .unwrap();
        page.insert_tuple(int_tuple(&desc, 1)).unwrap();

        let mut foreign = int_tuple(&desc, 1);
        foreign.set_record_id(RecordId::new(PageId::new(1, 9), 0));
        assert!(matches!(
            page.delete_tuple(&foreign),
            Err(DbError::TupleNotOnPage(_))
        ));

        let unstored = int_tuple(&desc, 1);
        assert!(matches!(
            page.delete_tuple(&unstored),
            Err(DbError::TupleNotOnPage(None))
        ));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let desc = TupleDesc::named(vec![("id", FieldType::Int), ("name", FieldType::Text)])
            .into_arc();
        let pid = PageId::new(3, 1);
        let mut page = HeapPage::parse(pid, desc.clone(), &HeapPage::empty_page_data()).unwrap();

        for (i, name) in ["alpha", "beta", "gamma"].iter().enumerate() {
            let t = Tuple::with_fields(
                desc.clone(),
                vec![Field::Int(i as i32), Field::text(*name)],
            );
            page.insert_tuple(t).unwrap();
        }
        // punch a hole so the bitmap has a gap
        let second = page.iter().nth(1).unwrap().clone();
        page.delete_tuple(&second).unwrap();

        let data = page.page_data();
        assert_eq!(data.len(), PAGE_SIZE);
        let reparsed = HeapPage::parse(pid, desc, &data).unwrap();

        assert_eq!(reparsed.empty_slot_count(), page.empty_slot_count());
        let original: Vec<_> = page.iter().cloned().collect();
        let recovered: Vec<_> = reparsed.iter().cloned().collect();
        assert_eq!(original, recovered);
        assert_eq!(reparsed.page_data(), data);
    }

    #[test]
    fn test_before_image_rollback() {
        let desc = int_desc();
        let pid = PageId::new(1, 0);
        let mut page = HeapPage::parse(pid, desc.clone(), &HeapPage::empty_page_data()).unwrap();

        page.insert_tuple(int_tuple(&desc, 1)).unwrap();
        page.set_before_image();
        page.insert_tuple(int_tuple(&desc, 2)).unwrap();

        let restored = page.before_image().unwrap();
        let values: Vec<_> = restored.iter().cloned().collect();
        assert_eq!(values, vec![int_tuple(&desc, 1)]);
    }

    #[test]
    fn test_dirty_tracking() {
        let desc = int_desc();
        let mut page =
            HeapPage::parse(PageId::new(1, 0), desc, &HeapPage::empty_page_data()).unwrap();

        let tid = TransactionId::new();
        assert_eq!(page.dirtier(), None);
        page.mark_dirty(true, tid);
        assert_eq!(page.dirtier(), Some(tid));
        page.mark_dirty(false, tid);
        assert_eq!(page.dirtier(), None);
    }
}
