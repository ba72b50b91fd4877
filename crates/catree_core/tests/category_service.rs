use catree_core::db::open_db_in_memory;
use catree_core::{
    CategoryService, CategoryServiceError, ParentRef, SqliteCategoryRepository,
    EMPTY_TREE_MESSAGE,
};
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn service(conn: &Connection) -> CategoryService<SqliteCategoryRepository<'_>> {
    CategoryService::new(SqliteCategoryRepository::try_new(conn).unwrap())
}

fn names(service: &CategoryService<SqliteCategoryRepository<'_>>) -> Vec<String> {
    service
        .list_all()
        .unwrap()
        .into_iter()
        .map(|category| category.name)
        .collect()
}

#[test]
fn add_root_rejects_duplicate_names_only() {
    let conn = setup();
    let service = service(&conn);

    let added = service.add_root("Books").unwrap();
    assert_eq!(added.category.name, "Books");
    assert_eq!(added.parent, None);

    let err = service.add_root("Books").unwrap_err();
    assert!(matches!(err, CategoryServiceError::DuplicateName(ref name) if name == "Books"));
    assert_eq!(err.to_string(), "Category \"Books\" already exists.");

    service.add_root("Music").unwrap();
    service.add_root("books").unwrap();
    assert_eq!(names(&service), vec!["Books", "Music", "books"]);
}

#[test]
fn add_root_rejects_blank_name() {
    let conn = setup();
    let service = service(&conn);

    let err = service.add_root("   ").unwrap_err();
    assert!(matches!(err, CategoryServiceError::InvalidName));
    assert!(names(&service).is_empty());
}

#[test]
fn add_child_by_name_requires_existing_parent() {
    let conn = setup();
    let service = service(&conn);

    let err = service.add_child_by_name("Ghost", "Child").unwrap_err();
    assert!(matches!(
        err,
        CategoryServiceError::ParentNotFound(ParentRef::Name(ref name)) if name == "Ghost"
    ));
    assert_eq!(err.to_string(), "Parent category \"Ghost\" not found.");
    assert!(names(&service).is_empty());
}

#[test]
fn add_child_by_name_links_child_to_parent() {
    let conn = setup();
    let service = service(&conn);

    let parent = service.add_root("Books").unwrap().category;
    let added = service.add_child_by_name("Books", "Poetry").unwrap();

    assert_eq!(added.category.parent_id, Some(parent.id));
    assert_eq!(
        added.message(),
        "Category \"Poetry\" added under parent category \"Books\"."
    );
}

#[test]
fn add_child_checks_parent_before_duplicate_name() {
    let conn = setup();
    let service = service(&conn);
    service.add_root("Taken").unwrap();

    let err = service.add_child_by_name("Ghost", "Taken").unwrap_err();
    assert!(matches!(err, CategoryServiceError::ParentNotFound(_)));

    service.add_root("Parent").unwrap();
    let err = service.add_child_by_name("Parent", "Taken").unwrap_err();
    assert!(matches!(err, CategoryServiceError::DuplicateName(_)));
}

#[test]
fn add_child_by_id_resolves_parent_by_identifier() {
    let conn = setup();
    let service = service(&conn);

    let parent = service.add_root("Root").unwrap().category;
    let added = service.add_child_by_id(parent.id, "Leaf").unwrap();
    assert_eq!(added.category.parent_id, Some(parent.id));
    assert_eq!(added.parent, Some(ParentRef::Id(parent.id)));

    let err = service.add_child_by_id(parent.id + 50, "Other").unwrap_err();
    assert!(matches!(
        err,
        CategoryServiceError::ParentNotFound(ParentRef::Id(id)) if id == parent.id + 50
    ));
}

#[test]
fn remove_deletes_target_and_all_descendants() {
    let conn = setup();
    let service = service(&conn);

    service.add_root("Root").unwrap();
    service.add_child_by_name("Root", "Child").unwrap();
    service.add_child_by_name("Child", "Grandchild").unwrap();
    service.add_root("Other").unwrap();

    let removed = service.remove("Root").unwrap();
    assert_eq!(removed.removed_count, 3);
    assert_eq!(
        removed.message(),
        "Category \"Root\" and its 2 descendant(s) removed."
    );
    assert_eq!(names(&service), vec!["Other"]);
}

#[test]
fn remove_missing_category_returns_not_found() {
    let conn = setup();
    let service = service(&conn);

    let err = service.remove("Nothing").unwrap_err();
    assert!(matches!(err, CategoryServiceError::NotFound(ref name) if name == "Nothing"));
    assert_eq!(err.to_string(), "Category \"Nothing\" not found.");
}

#[test]
fn render_tree_reports_empty_store() {
    let conn = setup();
    let service = service(&conn);

    assert_eq!(service.render_tree().unwrap(), EMPTY_TREE_MESSAGE);
}

#[test]
fn render_tree_indents_children_two_spaces_per_level() {
    let conn = setup();
    let service = service(&conn);

    service.add_root("Root").unwrap();
    service.add_child_by_name("Root", "Child").unwrap();
    assert_eq!(service.render_tree().unwrap(), "- Root\n  - Child\n");

    service.add_root("Second").unwrap();
    service.add_child_by_name("Child", "Leaf").unwrap();
    assert_eq!(
        service.render_tree().unwrap(),
        "- Root\n  - Child\n    - Leaf\n- Second\n"
    );
}

#[test]
fn add_remove_scenario_leaves_only_untouched_root() {
    let conn = setup();
    let service = service(&conn);

    service.add_root("A").unwrap();
    service.add_root("B").unwrap();
    service.add_child_by_name("A", "C").unwrap();
    service.remove("A").unwrap();

    assert_eq!(names(&service), vec!["B"]);
}
