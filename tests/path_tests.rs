use dom_source_map::path::resolve::{element_children, find_root, find_root_in_tree, parse_selector};
use dom_source_map::{MapperError, PathError, PathStep, StructuralPath, element_path, resolve_path};
use scraper::Html;

use crate::common::pages::{NESTED, first, main_root};

mod common;

// ============================================================================
// element_path
// ============================================================================

#[test]
fn path_of_nested_element_counts_element_siblings() {
    let doc = Html::parse_document(NESTED);
    let root = main_root(&doc);
    let p = first(&doc, "p");

    let path = element_path(root, p).unwrap();
    assert_eq!(
        path.steps(),
        &[
            PathStep::new("section", 0),
            PathStep::new("div", 1),
            PathStep::new("p", 0),
        ],
        "DIV is the second element child of SECTION"
    );
    assert_eq!(path.to_string(), "SECTION[0] > DIV[1] > P[0]");
}

#[test]
fn path_of_root_is_empty() {
    let doc = Html::parse_document(NESTED);
    let root = main_root(&doc);
    let path = element_path(root, root).unwrap();
    assert!(path.is_empty());
    assert_eq!(path.to_string(), "<root>");
}

#[test]
fn path_index_spans_all_tags() {
    let doc = Html::parse_document("<main><h1>a</h1><p>b</p><p>c</p></main>");
    let root = main_root(&doc);
    let last = doc
        .select(&parse_selector("p").unwrap())
        .nth(1)
        .unwrap();

    let path = element_path(root, last).unwrap();
    assert_eq!(path.steps(), &[PathStep::new("p", 2)]);
}

#[test]
fn element_outside_root_is_rejected() {
    let doc = Html::parse_document("<header><h1>x</h1></header><main><p>y</p></main>");
    let root = main_root(&doc);
    let outside = first(&doc, "h1");

    let err = element_path(root, outside).unwrap_err();
    assert_eq!(err, PathError::NotDescendant { tag: "H1".into() });
}

#[test]
fn identical_structure_gives_equal_paths() {
    let a = Html::parse_document(NESTED);
    let b = Html::parse_document(NESTED);
    let pa = element_path(main_root(&a), first(&a, "p")).unwrap();
    let pb = element_path(main_root(&b), first(&b, "p")).unwrap();
    assert_eq!(pa, pb, "same shape must yield the same path");
}

// ============================================================================
// resolve_path
// ============================================================================

#[test]
fn resolve_inverts_element_path() {
    let doc = Html::parse_document(NESTED);
    let root = main_root(&doc);
    for el in root.descendants().skip(1).filter_map(scraper::ElementRef::wrap) {
        let path = element_path(root, el).unwrap();
        assert_eq!(resolve_path(root, &path), Some(el), "round trip for {}", path);
    }
}

#[test]
fn resolve_rejects_tag_mismatch() {
    let doc = Html::parse_document(NESTED);
    let root = main_root(&doc);
    let path = StructuralPath::new(vec![PathStep::new("article", 0)]);
    assert!(resolve_path(root, &path).is_none());
}

#[test]
fn resolve_rejects_missing_index() {
    let doc = Html::parse_document(NESTED);
    let root = main_root(&doc);
    let path = StructuralPath::new(vec![PathStep::new("section", 0), PathStep::new("div", 7)]);
    assert!(resolve_path(root, &path).is_none());
}

// ============================================================================
// Keys
// ============================================================================

#[test]
fn key_round_trips() {
    let path = StructuralPath::new(vec![PathStep::new("ul", 3), PathStep::new("li", 0)]);
    assert_eq!(path.key(), "3:UL/0:LI");
    assert_eq!(StructuralPath::from_key(&path.key()).unwrap(), path);
    assert_eq!(StructuralPath::from_key("").unwrap(), StructuralPath::default());
}

#[test]
fn malformed_keys_are_rejected() {
    assert!(matches!(
        StructuralPath::from_key("UL"),
        Err(PathError::MalformedKey { .. })
    ));
    assert!(matches!(
        StructuralPath::from_key("x:UL"),
        Err(PathError::MalformedKey { .. })
    ));
    assert_eq!(
        StructuralPath::from_key("0:P/1:"),
        Err(PathError::EmptyTag { position: 1 })
    );
}

// ============================================================================
// Roots and selectors
// ============================================================================

#[test]
fn find_root_takes_first_match() {
    let doc = Html::parse_document(r#"<div class="r" id="a"></div><div class="r" id="b"></div>"#);
    let root = find_root(&doc, &parse_selector(".r").unwrap()).unwrap();
    assert_eq!(root.value().id(), Some("a"));
}

#[test]
fn find_root_in_tree_starts_anywhere() {
    let doc = Html::parse_document(NESTED);
    let p = first(&doc, "p");
    let root = find_root_in_tree(p, &parse_selector("main").unwrap()).unwrap();
    assert_eq!(root, main_root(&doc));
}

#[test]
fn element_children_skip_text() {
    let doc = Html::parse_document("<main> a <b>1</b> c <i>2</i></main>");
    let names: Vec<&str> = element_children(main_root(&doc))
        .map(|el| el.value().name())
        .collect();
    assert_eq!(names, vec!["b", "i"]);
}

#[test]
fn bad_selector_is_reported() {
    let err = parse_selector("p[").unwrap_err();
    match err {
        MapperError::InvalidSelector { selector, .. } => assert_eq!(selector, "p["),
        other => panic!("expected InvalidSelector, got {:?}", other),
    }
}
