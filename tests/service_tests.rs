use dom_source_map::dom::edit;
use dom_source_map::{
    DecorationOptions, MapperError, MapperService, PathRegistry, TokenTable, element_path,
    initialize_mapper, initialize_session,
};
use scraper::{ElementRef, Html};

use crate::common::decorators::{DropImages, EchoParagraphs, PrependBanner, WrapBlocks};
use crate::common::pages::{ARTICLE, DUPLICATE_TEXT, config, first, main_root, select};

mod common;

async fn identity_service(source: &str) -> MapperService {
    initialize_mapper(source, &config(), Some(DecorationOptions::identity()))
        .await
        .unwrap()
}

// ============================================================================
// Identity rendering
// ============================================================================

#[tokio::test]
async fn identity_lookup_returns_element_at_same_path() {
    let service = identity_service(ARTICLE).await;
    let page = Html::parse_document(ARTICLE);
    let page_root = main_root(&page);

    for css in ["main h1", "main p", "main img"] {
        let page_el = first(&page, css);
        let source_el = service
            .find_source_element(page_el)
            .unwrap_or_else(|| panic!("{} should map", css));
        assert_eq!(
            element_path(service.source_root().unwrap(), source_el).unwrap(),
            element_path(page_root, page_el).unwrap(),
            "identity rendering keeps paths for {}",
            css
        );
    }
}

#[tokio::test]
async fn untracked_elements_map_to_none() {
    let service = identity_service(ARTICLE).await;
    let page = Html::parse_document(ARTICLE);

    assert!(service.find_source_element(first(&page, "main")).is_none(), "root itself");
    assert!(service.find_source_element(first(&page, "main b")).is_none(), "inside a leaf");
    assert!(service.find_source_element(first(&page, "header h1")).is_none(), "outside root");
}

#[tokio::test]
async fn lookups_are_repeatable() {
    let service = identity_service(ARTICLE).await;
    let page = Html::parse_document(ARTICLE);
    let p = first(&page, "main p");

    let once = service.find_source_element(p).map(|el| el.id());
    let twice = service.find_source_element(p).map(|el| el.id());
    assert!(once.is_some());
    assert_eq!(once, twice);
}

#[tokio::test]
async fn source_doc_is_the_live_document() {
    let mut service = identity_service(ARTICLE).await;
    assert!(std::ptr::eq(service.source_doc(), service.source_doc()));
    assert!(!service.source_markup().contains("HASH_"), "source is the original, not the marked copy");

    let h1 = first(service.source_doc(), "main h1").id();
    assert!(edit::replace_with_text(service.source_doc_mut(), h1, "Changed"));

    let page = Html::parse_document(ARTICLE);
    let source_h1 = service.find_source_element(first(&page, "main h1")).unwrap();
    assert_eq!(source_h1.inner_html(), "Changed");
}

#[tokio::test]
async fn all_mapped_elements_pairs_every_tracked_element() {
    let service = identity_service(ARTICLE).await;
    let page = Html::parse_document(ARTICLE);

    let pairs = service.all_mapped_elements(&page);
    assert_eq!(pairs.len(), 3);
    let tags: Vec<&str> = pairs.iter().map(|p| p.page.element.value().name()).collect();
    assert_eq!(tags, vec!["h1", "p", "img"]);
    for pair in &pairs {
        assert_eq!(pair.source.path, pair.page.path);
        assert_eq!(
            pair.source.element.value().name(),
            pair.page.element.value().name()
        );
        assert!(service.tokens().contains(&pair.token));
    }
}

#[tokio::test]
async fn duplicate_text_maps_to_distinct_sources() {
    let service = identity_service(DUPLICATE_TEXT).await;
    let page = Html::parse_document(DUPLICATE_TEXT);
    let paragraphs = select(&page, "p");

    let a = service.find_source_element(paragraphs[0]).unwrap();
    let b = service.find_source_element(paragraphs[1]).unwrap();
    assert_ne!(a.id(), b.id());

    let ta = service.token_for_page_element(paragraphs[0]).unwrap();
    let tb = service.token_for_page_element(paragraphs[1]).unwrap();
    assert_ne!(ta, tb);
}

#[tokio::test]
async fn source_without_root_fails_at_render() {
    let err = initialize_mapper("<div><p>x</p></div>", &config(), Some(DecorationOptions::identity()))
        .await
        .unwrap_err();
    assert!(matches!(err, MapperError::RootNotFound { .. }), "got {:?}", err);
}

// ============================================================================
// Decorated rendering
// ============================================================================

#[tokio::test]
async fn wrapped_page_elements_map_back() {
    let options = DecorationOptions::new().with_decorator(WrapBlocks);
    let session = initialize_session(ARTICLE, &config(), Some(options)).await.unwrap();
    let service = session.service();
    let page = session.page();

    let page_p = first(page, "main div.wrap > p");
    let source_p = service.find_source_element(page_p).unwrap();
    assert_eq!(source_p.inner_html(), "World <b>bold</b>");

    let wrapper = first(page, "main div.wrap");
    assert!(service.find_source_element(wrapper).is_none(), "decorator-added wrapper");
}

#[tokio::test]
async fn inserted_siblings_shift_page_paths_only() {
    let options = DecorationOptions::new().with_decorator(PrependBanner);
    let session = initialize_session(ARTICLE, &config(), Some(options)).await.unwrap();
    let service = session.service();

    for (token, source_path) in service.source_paths().iter() {
        let page_path = service.page_paths().get(token).unwrap();
        assert_eq!(page_path.steps()[0].index, source_path.steps()[0].index + 1);
    }
    let banner = first(session.page(), "main aside");
    assert!(service.find_source_element(banner).is_none());
}

#[tokio::test]
async fn removed_elements_are_absent_from_page_paths() {
    let options = DecorationOptions::new().with_decorator(DropImages);
    let service = initialize_mapper(ARTICLE, &config(), Some(options)).await.unwrap();

    assert_eq!(service.source_paths().len(), 3);
    assert_eq!(service.page_paths().len(), 2);
    assert!(service.page_paths().is_subset_of(service.source_paths()));
}

#[tokio::test]
async fn echoed_content_resolves_to_deepest_copy() {
    let options = DecorationOptions::new()
        .with_decorator(WrapBlocks)
        .with_decorator(EchoParagraphs);
    let session = initialize_session(ARTICLE, &config(), Some(options)).await.unwrap();
    let service = session.service();

    let echoes = select(session.page(), "main div.wrap > p");
    assert_eq!(echoes.len(), 2, "original and echo");
    let mapped: Vec<bool> = echoes
        .iter()
        .map(|el| service.find_source_element(*el).is_some())
        .collect();
    assert_eq!(mapped.iter().filter(|m| **m).count(), 1, "one rendered element per token");
}

// ============================================================================
// Drift and construction
// ============================================================================

#[tokio::test]
async fn structural_source_edit_makes_lookup_miss() {
    let mut service = identity_service(ARTICLE).await;
    let h1 = first(service.source_doc(), "main h1").id();
    assert!(edit::remove_element(service.source_doc_mut(), h1));

    let page = Html::parse_document(ARTICLE);
    assert!(
        service.find_source_element(first(&page, "main h1")).is_none(),
        "P now sits at index 0; the H1 path must not resolve to it"
    );
    assert!(service.find_source_element(first(&page, "main p")).is_none());
}

#[test]
fn construction_rejects_unknown_page_tokens() {
    let mut page_paths = PathRegistry::new();
    page_paths.insert("HASH_P_xxxxxxxx_HTML".into(), Default::default());

    let err = MapperService::new(
        Html::parse_document(ARTICLE),
        TokenTable::new(),
        PathRegistry::new(),
        page_paths,
        config(),
    )
    .unwrap_err();
    assert!(matches!(err, MapperError::Configuration(_)));
}

#[test]
fn empty_registries_answer_none() {
    let service = MapperService::new(
        Html::parse_document(ARTICLE),
        TokenTable::new(),
        PathRegistry::new(),
        PathRegistry::new(),
        config(),
    )
    .unwrap();
    let page = Html::parse_document(ARTICLE);
    let p: ElementRef<'_> = first(&page, "main p");
    assert!(service.find_source_element(p).is_none());
    assert!(service.all_mapped_elements(&page).is_empty());
}
