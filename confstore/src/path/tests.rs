//! Tests for path parsing and rendering.

use super::*;
use rstest::rstest;

fn member(name: &str) -> PathSegment {
    PathSegment::Member(name.to_owned())
}

#[rstest]
#[case("", vec![])]
#[case("a", vec![member("a")])]
#[case("a.b.c", vec![member("a"), member("b"), member("c")])]
#[case("a[3]", vec![member("a"), PathSegment::Index(3)])]
#[case("a.b[2].c", vec![member("a"), member("b"), PathSegment::Index(2), member("c")])]
#[case("[0].name", vec![PathSegment::Index(0), member("name")])]
#[case("grid[1][2]", vec![member("grid"), PathSegment::Index(1), PathSegment::Index(2)])]
#[case("a[x]", vec![member("a[x]")])]
#[case("a[-1]", vec![member("a[-1]")])]
#[case("a[1]b", vec![member("a[1]b")])]
fn parses_default_syntax(#[case] path: &str, #[case] expected: Vec<PathSegment>) {
    let parsed = PathSyntax::default().parse(path).expect("path parses");
    assert_eq!(parsed, expected);
}

#[rstest]
#[case("DATABASE_HOST", vec![member("DATABASE"), member("HOST")])]
#[case("SERVERS_0", vec![member("SERVERS"), PathSegment::Index(0)])]
#[case("SERVERS_1_NAME", vec![member("SERVERS"), PathSegment::Index(1), member("NAME")])]
#[case("_0_NAME", vec![PathSegment::Index(0), member("NAME")])]
#[case("A_1B", vec![member("A"), member("1B")])]
fn parses_env_syntax(#[case] path: &str, #[case] expected: Vec<PathSegment>) {
    let parsed = PathSyntax::env().parse(path).expect("path parses");
    assert_eq!(parsed, expected);
}

#[rstest]
#[case(".a")]
#[case("a.")]
#[case("a..b")]
fn rejects_empty_segments(#[case] path: &str) {
    let err = PathSyntax::default().parse(path).expect_err("path must be rejected");
    assert!(matches!(err, PathError::EmptySegment { .. }));
}

#[rstest]
fn overflowing_index_is_member_text() {
    let path = "a[99999999999999999999999]";
    let parsed = PathSyntax::default().parse(path).expect("path parses");
    assert_eq!(parsed, vec![member(path)]);
}

#[rstest]
#[case(PathSyntax::default(), "servers[0].name")]
#[case(PathSyntax::env(), "SERVERS_0_NAME")]
#[case(PathSyntax::default(), "[2][0]")]
fn render_inverts_parse(#[case] syntax: PathSyntax, #[case] path: &str) {
    let parsed = syntax.parse(path).expect("path parses");
    assert_eq!(syntax.render(&parsed), path);
}

#[rstest]
fn custom_separator_and_format() {
    let syntax = PathSyntax::new("/", IndexFormat::new("#%d").expect("valid template"))
        .expect("valid syntax");
    let parsed = syntax.parse("a/b#4/c").expect("path parses");
    assert_eq!(
        parsed,
        vec![member("a"), member("b"), PathSegment::Index(4), member("c")]
    );
}

#[rstest]
fn empty_separator_is_rejected() {
    assert_eq!(
        PathSyntax::new("", IndexFormat::brackets()),
        Err(PathError::EmptySeparator)
    );
}

#[rstest]
fn segments_match_case_insensitively() {
    assert!(member("Host").matches(&member("HOST")));
    assert!(!member("host").matches(&PathSegment::Index(0)));
}
