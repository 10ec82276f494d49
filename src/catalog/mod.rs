use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::common::{DbError, Result};
use crate::storage::HeapFile;
use crate::tuple::{FieldType, TupleDesc};

struct TableEntry {
    file: Arc<HeapFile>,
    name: String,
    primary_key: String,
}

struct CatalogInner {
    name_to_id: HashMap<String, u32>,
    tables: HashMap<u32, TableEntry>,
}

/// The catalog tracks every table registered with the database: name to
/// table id, and table id to its heap file, name, and primary-key column.
/// Name collisions resolve to the most recent registration.
pub struct Catalog {
    inner: RwLock<CatalogInner>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CatalogInner {
                name_to_id: HashMap::new(),
                tables: HashMap::new(),
            }),
        }
    }

    /// Registers a table. The heap file's id becomes the table id.
    pub fn add_table(&self, file: Arc<HeapFile>, name: &str, primary_key: &str) {
        let id = file.table_id();
        let mut inner = self.inner.write();
        inner.name_to_id.insert(name.to_string(), id);
        inner.tables.insert(
            id,
            TableEntry {
                file,
                name: name.to_string(),
                primary_key: primary_key.to_string(),
            },
        );
    }

    /// Returns the id of the table with the given name.
    pub fn table_id(&self, name: &str) -> Result<u32> {
        self.inner
            .read()
            .name_to_id
            .get(name)
            .copied()
            .ok_or_else(|| DbError::NoSuchTableName(name.to_string()))
    }

    /// Returns the heap file backing the given table.
    pub fn table(&self, table_id: u32) -> Result<Arc<HeapFile>> {
        self.inner
            .read()
            .tables
            .get(&table_id)
            .map(|e| e.file.clone())
            .ok_or(DbError::NoSuchTable(table_id))
    }

    /// Returns the schema of the given table.
    pub fn tuple_desc(&self, table_id: u32) -> Result<Arc<TupleDesc>> {
        Ok(self.table(table_id)?.desc().clone())
    }

    /// Returns the name of the given table.
    pub fn table_name(&self, table_id: u32) -> Result<String> {
        self.inner
            .read()
            .tables
            .get(&table_id)
            .map(|e| e.name.clone())
            .ok_or(DbError::NoSuchTable(table_id))
    }

    /// Returns the primary-key column name of the given table.
    pub fn primary_key(&self, table_id: u32) -> Result<String> {
        self.inner
            .read()
            .tables
            .get(&table_id)
            .map(|e| e.primary_key.clone())
            .ok_or(DbError::NoSuchTable(table_id))
    }

    /// Returns the ids of every registered table.
    pub fn table_ids(&self) -> Vec<u32> {
        self.inner.read().tables.keys().copied().collect()
    }

    /// Removes every table from the catalog.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.name_to_id.clear();
        inner.tables.clear();
    }

    /// Loads table definitions from a catalog text file: one table per
    /// line, `name (field type[, field type pk, ...])` with
    /// `type ∈ {int, string}` and an optional `pk` marking the primary-key
    /// column. Each table is registered with a heap file `<name>.dat` next
    /// to the catalog file.
    pub fn load_schema<P: AsRef<Path>>(&self, catalog_path: P) -> Result<()> {
        let catalog_path = catalog_path.as_ref();
        let base_dir = catalog_path.parent().unwrap_or_else(|| Path::new("."));
        let contents = fs::read_to_string(catalog_path)?;

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (name, fields) = parse_table_line(line)?;
            let mut types = Vec::with_capacity(fields.len());
            let mut names = Vec::with_capacity(fields.len());
            let mut primary_key = String::new();
            for field in &fields {
                types.push(field.ty);
                names.push(Some(field.name.clone()));
                if field.is_primary_key {
                    primary_key = field.name.clone();
                }
            }

            let desc = TupleDesc::new(types, names).into_arc();
            let data_path = base_dir.join(format!("{}.dat", name));
            let file = Arc::new(HeapFile::open(&data_path, desc)?);
            debug!(table = %name, id = file.table_id(), "loaded table from catalog");
            self.add_table(file, &name, &primary_key);
        }

        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

struct FieldDef {
    name: String,
    ty: FieldType,
    is_primary_key: bool,
}

fn parse_table_line(line: &str) -> Result<(String, Vec<FieldDef>)> {
    let invalid = || DbError::InvalidCatalogEntry(line.to_string());

    let open = line.find('(').ok_or_else(invalid)?;
    let close = line.rfind(')').ok_or_else(invalid)?;
    if close < open {
        return Err(invalid());
    }

    let name = line[..open].trim();
    if name.is_empty() {
        return Err(invalid());
    }

    let mut fields = Vec::new();
    for part in line[open + 1..close].split(',') {
        let mut words = part.split_whitespace();
        let field_name = words.next().ok_or_else(invalid)?;
        let ty = match words.next().ok_or_else(invalid)? {
            "int" => FieldType::Int,
            "string" => FieldType::Text,
            _ => return Err(invalid()),
        };
        let is_primary_key = match words.next() {
            None => false,
            Some("pk") => true,
            Some(_) => return Err(invalid()),
        };
        fields.push(FieldDef {
            name: field_name.to_string(),
            ty,
            is_primary_key,
        });
    }

    if fields.is_empty() {
        return Err(invalid());
    }
    Ok((name.to_string(), fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_line() {
        let (name, fields) = parse_table_line("users (id int pk, name string)").unwrap();
        assert_eq!(name, "users");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "id");
        assert_eq!(fields[0].ty, FieldType::Int);
        assert!(fields[0].is_primary_key);
        assert_eq!(fields[1].ty, FieldType::Text);
        assert!(!fields[1].is_primary_key);
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert!(parse_table_line("no parens here").is_err());
        assert!(parse_table_line("t (x float)").is_err());
        assert!(parse_table_line("t (x int extra_annotation)").is_err());
        assert!(parse_table_line("(x int)").is_err());
        assert!(parse_table_line("t ()").is_err());
    }
}
