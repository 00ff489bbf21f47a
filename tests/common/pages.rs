use dom_source_map::MapperConfig;
use dom_source_map::path::resolve::{find_root, parse_selector};
use scraper::{ElementRef, Html};

/// Three leaf targets under `main`, one of them outside any container.
pub const ARTICLE: &str = r#"<html><head><title>t</title></head><body>
<header><h1>Site</h1></header>
<main>
  <h1>Hello</h1>
  <p>World <b>bold</b></p>
  <img src="cat.png" alt="cat">
</main>
</body></html>"#;

pub const DUPLICATE_TEXT: &str = "<main><p>Hello</p><p>Hello</p></main>";

pub const LISTS: &str = r#"<main>
  <ul><li>one</li><li>   </li><li><a href="/x">two</a></li></ul>
  <ol><li>first</li></ol>
</main>"#;

pub const NESTED: &str = "<main><section><h2>Title</h2><div><p>Body</p></div></section></main>";

pub fn config() -> MapperConfig {
    MapperConfig::default()
}

pub fn select<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    doc.select(&parse_selector(css).unwrap()).collect()
}

pub fn first<'a>(doc: &'a Html, css: &str) -> ElementRef<'a> {
    select(doc, css)
        .into_iter()
        .next()
        .unwrap_or_else(|| panic!("no element matches '{}'", css))
}

pub fn main_root(doc: &Html) -> ElementRef<'_> {
    find_root(doc, &parse_selector("main").unwrap()).expect("document has a <main>")
}

/// Unique scratch path under the system temp dir.
pub fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("dom_source_map_{}_{}", std::process::id(), name))
}
