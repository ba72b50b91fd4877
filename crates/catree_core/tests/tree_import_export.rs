use catree_core::db::open_db_in_memory;
use catree_core::tabular::{
    export_categories, export_to_path, import_from_path, import_from_reader, read_rows,
};
use catree_core::{
    Category, CategoryId, CategoryRepository, CategoryService, CategoryServiceError, ImportError,
    NewCategory, RepoError, RepoResult, SqliteCategoryRepository, DEFAULT_EXPORT_FILE_NAME,
};
use rusqlite::Connection;
use std::cell::Cell;
use std::collections::BTreeSet;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn service(conn: &Connection) -> CategoryService<SqliteCategoryRepository<'_>> {
    CategoryService::new(SqliteCategoryRepository::try_new(conn).unwrap())
}

/// SQLite store whose lookups or saves start failing after a fixed number of
/// successful calls.
struct FlakyStore<'conn> {
    inner: SqliteCategoryRepository<'conn>,
    lookups_left: Cell<usize>,
    saves_left: Cell<usize>,
}

impl<'conn> FlakyStore<'conn> {
    fn new(conn: &'conn Connection, lookups_left: usize, saves_left: usize) -> Self {
        Self {
            inner: SqliteCategoryRepository::try_new(conn).unwrap(),
            lookups_left: Cell::new(lookups_left),
            saves_left: Cell::new(saves_left),
        }
    }
}

fn take_budget(budget: &Cell<usize>) -> RepoResult<()> {
    match budget.get() {
        0 => Err(RepoError::InvalidData("disk I/O error".to_string())),
        left => {
            budget.set(left - 1);
            Ok(())
        }
    }
}

impl CategoryRepository for FlakyStore<'_> {
    fn find_by_id(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        self.inner.find_by_id(id)
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Option<Category>> {
        take_budget(&self.lookups_left)?;
        self.inner.find_by_name(name)
    }

    fn save(&self, category: &NewCategory) -> RepoResult<Category> {
        take_budget(&self.saves_left)?;
        self.inner.save(category)
    }

    fn update(&self, category: &Category) -> RepoResult<()> {
        self.inner.update(category)
    }

    fn delete(&self, id: CategoryId) -> RepoResult<usize> {
        self.inner.delete(id)
    }

    fn find_all(&self) -> RepoResult<Vec<Category>> {
        self.inner.find_all()
    }
}

fn stored_names(conn: &Connection) -> Vec<String> {
    SqliteCategoryRepository::try_new(conn)
        .unwrap()
        .find_all()
        .unwrap()
        .into_iter()
        .map(|category| category.name)
        .collect()
}

/// (name, parent name) pairs; independent of store-assigned ids.
fn shape(categories: &[Category]) -> BTreeSet<(String, Option<String>)> {
    categories
        .iter()
        .map(|category| {
            let parent = category.parent_id.map(|parent_id| {
                categories
                    .iter()
                    .find(|candidate| candidate.id == parent_id)
                    .map(|parent| parent.name.clone())
                    .unwrap_or_default()
            });
            (category.name.clone(), parent)
        })
        .collect()
}

#[test]
fn export_then_import_into_fresh_store_reproduces_tree() {
    let source_conn = setup();
    let source = service(&source_conn);
    // Burn a few ids so the fresh store assigns different ones.
    source.add_root("Scratch").unwrap();
    source.add_root("Scratch2").unwrap();
    source.remove("Scratch").unwrap();
    source.remove("Scratch2").unwrap();

    source.add_root("Electronics").unwrap();
    source.add_child_by_name("Electronics", "Phones").unwrap();
    source.add_child_by_name("Phones", "Android").unwrap();
    source.add_root("Garden").unwrap();
    source.add_child_by_name("Electronics", "Laptops").unwrap();
    source.add_child_by_name("Garden", "Tools").unwrap();

    let mut buffer = Vec::new();
    export_categories(&mut buffer, &source.list_all().unwrap()).unwrap();

    let target_conn = setup();
    let target = service(&target_conn);
    let report = import_from_reader(&target, buffer.as_slice()).unwrap();

    assert_eq!(report.added, 6);
    assert!(report.rejected.is_empty());
    assert_eq!(
        shape(&target.list_all().unwrap()),
        shape(&source.list_all().unwrap())
    );
    assert_eq!(target.render_tree().unwrap(), source.render_tree().unwrap());
}

#[test]
fn invalid_parent_reference_aborts_and_keeps_earlier_rows() {
    let conn = setup();
    let service = service(&conn);
    let table = "ID,Name,Parent ID\n1,Root,None\n2,Child,1\n3,Broken,xyz\n4,Never,None\n";

    let err = import_from_reader(&service, table.as_bytes()).unwrap_err();
    match &err {
        ImportError::InvalidParentReference {
            row_number,
            value,
            applied,
        } => {
            assert_eq!(*row_number, 4);
            assert_eq!(value, "xyz");
            assert_eq!(*applied, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("row 4"));

    let names: Vec<String> = service
        .list_all()
        .unwrap()
        .into_iter()
        .map(|category| category.name)
        .collect();
    assert_eq!(names, vec!["Root", "Child"]);
}

#[test]
fn blank_rows_are_skipped_silently() {
    let conn = setup();
    let service = service(&conn);
    let table = "ID,Name,Parent ID\n,,\n1,Root,none\n , , \n2,Leaf,1.0\n";

    let report = import_from_reader(&service, table.as_bytes()).unwrap();

    assert_eq!(report.added, 2);
    assert_eq!(report.skipped_blank, 2);
    assert!(report.rejected.is_empty());
    assert_eq!(service.render_tree().unwrap(), "- Root\n  - Leaf\n");
}

#[test]
fn rejected_rows_do_not_abort_and_duplicates_still_anchor_children() {
    let conn = setup();
    let service = service(&conn);
    service.add_root("Existing").unwrap();
    let table = "ID,Name,Parent ID\n10,Existing,None\n11,Child,10\n12,Lost,999\n";

    let report = import_from_reader(&service, table.as_bytes()).unwrap();

    assert_eq!(report.added, 1);
    assert_eq!(report.rejected.len(), 2);
    assert_eq!(report.rejected[0].row_number, 2);
    assert_eq!(report.rejected[1].row_number, 4);
    assert!(report.message().contains("2 row(s) rejected"));
    assert_eq!(service.render_tree().unwrap(), "- Existing\n  - Child\n");
}

#[test]
fn numeric_parent_outside_file_refers_to_existing_store_id() {
    let conn = setup();
    let service = service(&conn);
    let anchor = service.add_root("Anchor").unwrap().category;
    let table = format!("ID,Name,Parent ID\n,Attached,{}\n", anchor.id);

    let report = import_from_reader(&service, table.as_bytes()).unwrap();

    assert_eq!(report.added, 1);
    assert_eq!(service.render_tree().unwrap(), "- Anchor\n  - Attached\n");
}

#[test]
fn file_round_trip_uses_default_export_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_EXPORT_FILE_NAME);

    let source_conn = setup();
    let source = service(&source_conn);
    source.add_root("Root").unwrap();
    source.add_child_by_name("Root", "Child").unwrap();
    export_to_path(&path, &source.list_all().unwrap()).unwrap();

    let rows = read_rows(std::fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].parent_id, "None");

    let target_conn = setup();
    let target = service(&target_conn);
    import_from_path(&target, &path).unwrap();
    assert_eq!(target.render_tree().unwrap(), "- Root\n  - Child\n");
}

#[test]
fn missing_import_file_is_a_read_failure() {
    let dir = tempfile::tempdir().unwrap();
    let conn = setup();
    let service = service(&conn);

    let err = import_from_path(&service, dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, ImportError::Read(_)));
}

#[test]
fn rows_under_a_rejected_file_parent_are_rejected_not_reattached() {
    let conn = setup();
    let service = service(&conn);
    let unrelated = service.add_root("Unrelated").unwrap().category;
    assert_eq!(unrelated.id, 1);
    let table = "ID,Name,Parent ID\n1,Orphan,999\n2,Grandchild,1\n3,Deeper,2\n";

    let report = import_from_reader(&service, table.as_bytes()).unwrap();

    assert_eq!(report.added, 0);
    let rows: Vec<u64> = report.rejected.iter().map(|row| row.row_number).collect();
    assert_eq!(rows, vec![2, 3, 4]);
    assert_eq!(
        report.rejected[1].reason,
        "Parent category with ID 1 not found."
    );
    assert_eq!(service.render_tree().unwrap(), "- Unrelated\n");
}

#[test]
fn storage_failure_aborts_import_and_keeps_earlier_rows() {
    let conn = setup();
    let service = CategoryService::new(FlakyStore::new(&conn, usize::MAX, 2));
    let table = "ID,Name,Parent ID\n1,Root,None\n2,Child,1\n3,Third,None\n4,Never,None\n";

    let err = import_from_reader(&service, table.as_bytes()).unwrap_err();

    match &err {
        ImportError::IoFailure {
            row_number,
            source,
            applied,
        } => {
            assert_eq!(*row_number, 4);
            assert_eq!(*applied, 2);
            assert!(matches!(source, CategoryServiceError::Repo(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("row 4"));
    assert_eq!(stored_names(&conn), vec!["Root", "Child"]);
}

#[test]
fn failing_duplicate_lookup_aborts_as_storage_failure() {
    let conn = setup();
    SqliteCategoryRepository::try_new(&conn)
        .unwrap()
        .save(&NewCategory::root("Existing").unwrap())
        .unwrap();
    // First lookup reports the duplicate, the merge lookup then fails.
    let service = CategoryService::new(FlakyStore::new(&conn, 1, usize::MAX));
    let table = "ID,Name,Parent ID\n10,Existing,None\n11,Child,10\n";

    let err = import_from_reader(&service, table.as_bytes()).unwrap_err();

    assert!(matches!(
        err,
        ImportError::IoFailure {
            row_number: 2,
            applied: 0,
            ..
        }
    ));
    assert_eq!(stored_names(&conn), vec!["Existing"]);
}
