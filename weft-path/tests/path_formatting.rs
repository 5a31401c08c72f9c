//! Snapshot tests for path formatting

use weft_path::{Path, PathStep};

#[test]
fn test_empty_path_is_root() {
    weft_testhelpers::setup();

    let path = Path::new();
    insta::assert_snapshot!(path.format(), @"<root>");
}

#[test]
fn test_simple_field_path() {
    weft_testhelpers::setup();

    let mut path = Path::new();
    path.push(PathStep::Field("max_retries".into()));

    insta::assert_snapshot!(path.format(), @"max_retries");
}

#[test]
fn test_nested_struct_path() {
    weft_testhelpers::setup();

    let mut path = Path::new();
    path.push(PathStep::Field("inner".into()));
    path.push(PathStep::Field("value".into()));

    insta::assert_snapshot!(path.format(), @"inner.value");
}

#[test]
fn test_list_inside_struct_path() {
    weft_testhelpers::setup();

    let path: Path = [
        PathStep::Field("outer".into()),
        PathStep::Field("items".into()),
        PathStep::Index(3),
        PathStep::Field("name".into()),
    ]
    .into_iter()
    .collect();

    insta::assert_snapshot!(path.to_string(), @"outer.items[3].name");
}

#[test]
fn test_root_list_path() {
    weft_testhelpers::setup();

    let path = Path::new().index(0).index(7);
    insta::assert_snapshot!(path.format(), @"[0][7]");
}
