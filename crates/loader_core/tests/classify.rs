use loader_core::{classify, ClickedLink, Disposition, LinkZone};
use url::Url;

fn location() -> Url {
    Url::parse("https://example.edu/programs/?term=fall").unwrap()
}

fn content(href: &str) -> Disposition {
    classify(&ClickedLink::new(href, LinkZone::Content), &location())
}

#[test]
fn menu_hash_links_always_load() {
    let menu = |href: &str| classify(&ClickedLink::new(href, LinkZone::Menu), &location());
    assert_eq!(
        menu("#undergrad"),
        Disposition::LoadFragment("undergrad".to_string())
    );
    assert_eq!(menu("#"), Disposition::Default);
    assert_eq!(menu("/about/"), Disposition::Default);
}

#[test]
fn content_link_to_a_fragment_on_this_document_loads() {
    assert_eq!(
        content("#faculty/arts"),
        Disposition::LoadFragment("faculty/arts".to_string())
    );
    assert_eq!(
        content("/programs/#graduate"),
        Disposition::LoadFragment("graduate".to_string())
    );
    assert_eq!(
        content("https://example.edu/programs/#graduate"),
        Disposition::LoadFragment("graduate".to_string())
    );
}

#[test]
fn fragments_outside_the_grammar_are_plain_anchors() {
    assert_eq!(content("#Top_of_page"), Disposition::SamePageAnchor);
    assert_eq!(content("#a//b"), Disposition::SamePageAnchor);
    assert_eq!(content("#/leading"), Disposition::SamePageAnchor);
    assert!(!content("#a b").is_intercepted());
}

#[test]
fn other_documents_and_origins_are_left_to_the_browser() {
    assert_eq!(content("/admissions/#apply"), Disposition::Default);
    assert_eq!(
        content("https://other.example.org/programs/#graduate"),
        Disposition::Default
    );
    assert_eq!(content("/programs/"), Disposition::Default);
    assert_eq!(content(""), Disposition::Default);
}

#[test]
fn links_outside_menu_and_content_are_ignored() {
    let link = ClickedLink::new("#graduate", LinkZone::Outside);
    assert_eq!(classify(&link, &location()), Disposition::Default);
}
