use super::*;
use crate::cond;
use crate::value::Value;

fn aliased(alias: &str) -> Composite {
    let mut composite = Composite::new();
    composite.set_alias(alias);
    composite
}

#[test]
fn test_factories_render_templates() {
    assert_eq!(eq(1).render("c"), "c = ?");
    assert_eq!(eq(1).binds(), vec![Value::Int(1)]);
    assert_eq!(not_eq("a").render("c"), "c <> ?");
    assert_eq!(gt(1).render("c"), "c > ?");
    assert_eq!(gte(1).render("c"), "c >= ?");
    assert_eq!(lt(1).render("c"), "c < ?");
    assert_eq!(lte(1).render("c"), "c <= ?");
    assert_eq!(after(1).render("c"), "c > ?");
    assert_eq!(before(1).render("c"), "c < ?");
    assert_eq!(like("a%").render("c"), "c LIKE ?");
    assert_eq!(in_list(vec![1, 2]).render("c"), "c IN ?");
    assert_eq!(in_list(vec![1, 2]).binds(), vec![Value::from(vec![1, 2])]);
}

#[test]
fn test_between_binds_both_bounds() {
    let e = between(1, 5);
    assert_eq!(e.render("age"), "age BETWEEN ? AND ?");
    assert_eq!(e.binds(), vec![Value::Int(1), Value::Int(5)]);
}

#[test]
fn test_null_and_blank() {
    assert_eq!(is_null().render("c"), "c IS NULL");
    assert!(is_null().binds().is_empty());
    assert_eq!(blank().render("c"), "c IS NULL OR NOT c");
    assert!(blank().binds().is_empty());
}

#[test]
fn test_not_wraps_child() {
    assert_eq!(not(eq(1)).render("c"), "NOT (c = ?)");
    assert_eq!(not(eq(1)).binds(), vec![Value::Int(1)]);
    assert_eq!(not(1).render("c"), "NOT (c = ?)");
    assert_eq!(not(vec!["a", "b"]).render("c"), "NOT (c IN ?)");
    assert_eq!(not(not(is_null())).render("c"), "NOT (NOT (c IS NULL))");
}

#[test]
fn test_custom_template() {
    let e = expr("LOWER(%s) = LOWER(?)", ["Ann"]);
    assert_eq!(e.render("name"), "LOWER(name) = LOWER(?)");
    assert_eq!(e.binds(), vec![Value::from("Ann")]);
}

#[test]
fn test_columnize() {
    assert_eq!(columnize("name", Some("author")), "author.name");
    assert_eq!(columnize("b.name", Some("author")), "b.name");
    assert_eq!(columnize("COUNT(*)", Some("author")), "COUNT(*)");
    assert_eq!(columnize("name", None), "name");
    assert_eq!(columnize("name", Some("")), "name");
}

#[test]
fn test_alias() {
    assert_eq!(alias("authors", "author"), "authors AS author");
}

#[test]
fn test_empty_composite() {
    let composite = Composite::new();
    assert_eq!(composite.compile(), (String::new(), Vec::new()));
    assert!(composite.is_empty());
}

#[test]
fn test_mapping_and_any() {
    let mut composite = aliased("test");
    composite
        .all(cond! { "name" => "test" })
        .any(cond! { "foo" => "bar" });

    assert_eq!(composite.expr(), "test.name = ? OR test.foo = ?");
    assert_eq!(
        composite.binds(),
        vec![Value::from("test"), Value::from("bar")]
    );
}

#[test]
fn test_mapping_list_becomes_in() {
    let mut composite = aliased("test");
    composite.all(cond! { "name" => vec!["a", "b"] });

    assert_eq!(composite.expr(), "test.name IN ?");
    assert_eq!(composite.binds(), vec![Value::from(vec!["a", "b"])]);
}

#[test]
fn test_mapping_pairs_share_entry_joiner() {
    let mut composite = aliased("a");
    composite.any(cond! { "x" => 1, "y" => 2 });
    composite.all(cond! { "z" => 3 });

    assert_eq!(composite.expr(), "a.x = ? OR a.y = ? AND a.z = ?");
}

#[test]
fn test_mapping_with_expression_values() {
    let mut composite = aliased("author");
    composite.all(cond! { "age" => gt(18), "deleted_at" => is_null(), "b.id" => 3 });

    assert_eq!(
        composite.expr(),
        "author.age > ? AND author.deleted_at IS NULL AND b.id = ?"
    );
    assert_eq!(composite.binds(), vec![Value::Int(18), Value::Int(3)]);
}

#[test]
fn test_literal_pairs_are_not_qualified() {
    let mut composite = aliased("author");
    composite.all(Condition::map([
        Pair::literal("author.id = b.author_id"),
        Pair::column("active", true),
    ]));

    assert_eq!(
        composite.expr(),
        "author.id = b.author_id AND author.active = ?"
    );
    assert_eq!(composite.binds(), vec![Value::Bool(true)]);
}

#[test]
fn test_raw_strings_keep_binds_and_skip_qualification() {
    let mut composite = aliased("author");
    composite
        .all_with("name = ?", ["ann"])
        .any("id IS NOT NULL");

    assert_eq!(composite.expr(), "name = ? OR id IS NOT NULL");
    assert_eq!(composite.binds(), vec![Value::from("ann")]);
}

#[test]
fn test_nested_composite_uses_parent_alias() {
    let mut inner = Composite::new();
    inner.all(cond! { "a" => 1 }).any(cond! { "b" => 2 });

    let mut outer = aliased("t");
    outer.all(cond! { "c" => 0 }).all(inner);

    assert_eq!(outer.expr(), "t.c = ? AND t.a = ? OR t.b = ?");
    assert_eq!(
        outer.binds(),
        vec![Value::Int(0), Value::Int(1), Value::Int(2)]
    );
}

#[test]
fn test_not_of_composite_groups() {
    let mut composite = aliased("author");
    composite.all(not(any(cond! { "name" => "x", "id" => 1 })));

    assert_eq!(composite.expr(), "NOT (author.name = ? OR author.id = ?)");
}

#[test]
fn test_compile_is_cached_until_modified() {
    let mut composite = aliased("t");
    composite.all(cond! { "a" => 1 });

    let first = composite.compile();
    assert_eq!(composite.compile(), first);
    assert_eq!(composite.expr(), "t.a = ?");

    composite.all(cond! { "b" => 2 });
    assert_eq!(composite.expr(), "t.a = ? AND t.b = ?");

    composite.set_alias("u");
    assert_eq!(composite.expr(), "u.a = ? AND u.b = ?");
}

#[test]
fn test_clone_does_not_share_cache() {
    let mut original = aliased("t");
    original.all(cond! { "a" => 1 });
    assert_eq!(original.expr(), "t.a = ?");

    let mut copy = original.clone();
    copy.all(cond! { "b" => 2 });

    assert_eq!(original.expr(), "t.a = ?");
    assert_eq!(copy.expr(), "t.a = ? AND t.b = ?");
}

#[test]
fn test_every_leaf_after_the_first_gets_one_joiner() {
    let mut composite = Composite::new();
    composite.any("a").all("b").any("c").all("d");

    let sql = composite.expr();
    assert_eq!(sql, "a AND b OR c AND d");
    assert!(!sql.starts_with(" AND") && !sql.starts_with(" OR"));
}

#[test]
fn test_empty_groups_add_no_joiner() {
    let mut composite = aliased("t");
    composite
        .all(cond! { "a" => 1 })
        .all(Composite::new())
        .any(not(Composite::new()))
        .all(cond! { "b" => 2 });

    assert_eq!(composite.expr(), "t.a = ? AND t.b = ?");
    assert_eq!(composite.binds(), vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_not_of_empty_group_renders_nothing() {
    let mut composite = aliased("t");
    composite.all(not(Composite::new()));

    assert_eq!(composite.expr(), "");
    assert!(composite.binds().is_empty());
}
