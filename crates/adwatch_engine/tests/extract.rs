use adwatch_core::Entry;
use adwatch_engine::{AdExtractor, ListingExtractor};
use pretty_assertions::assert_eq;

const PAGE_URL: &str = "https://www.example.test/iad/kaufen-und-verkaufen/marktplatz?keyword=bike";

fn ad(id: &str, title: &str, price: &str) -> String {
    format!(
        r#"<div id="{id}">
             <a href="/iad/kaufen-und-verkaufen/d/ad-{id}/">
               <h3>{title}</h3>
               <span data-testid="search-result-entry-price-{id}">{price}</span>
             </a>
           </div>"#
    )
}

fn page(body: &str) -> String {
    format!("<html><body><div id=\"results\">{body}</div></body></html>")
}

#[test]
fn extracts_entries_in_page_order() {
    let html = page(&format!(
        "{}{}",
        ad("1234567", "Kinderfahrrad 20 Zoll", "€ 80"),
        ad("7654321", "Rennrad", "€ 450")
    ));

    let listing = ListingExtractor::new().extract(&html, PAGE_URL);

    assert_eq!(listing.visible_ids, vec!["1234567", "7654321"]);
    assert_eq!(
        listing.entries,
        vec![
            Entry {
                id: "1234567".to_string(),
                title: "Kinderfahrrad 20 Zoll".to_string(),
                price: "€ 80".to_string(),
                link: "https://www.example.test/iad/kaufen-und-verkaufen/d/ad-1234567/"
                    .to_string(),
            },
            Entry {
                id: "7654321".to_string(),
                title: "Rennrad".to_string(),
                price: "€ 450".to_string(),
                link: "https://www.example.test/iad/kaufen-und-verkaufen/d/ad-7654321/"
                    .to_string(),
            },
        ]
    );
}

#[test]
fn ignores_divs_whose_id_is_not_a_long_number() {
    let html = page(&format!(
        r#"<div id="123456"><a href="/x">short</a></div>
           <div id="abc1234567"><a href="/y">mixed</a></div>
           {}"#,
        ad("12345678", "Kept", "€ 1")
    ));

    let listing = ListingExtractor::new().extract(&html, PAGE_URL);
    assert_eq!(listing.visible_ids, vec!["12345678"]);
    assert_eq!(listing.entries.len(), 1);
}

#[test]
fn missing_title_and_price_fall_back() {
    let html = page(r#"<div id="1111111"><a href="https://other.test/ad">link only</a></div>"#);

    let listing = ListingExtractor::new().extract(&html, PAGE_URL);
    let entry = &listing.entries[0];
    assert_eq!(entry.title, "(no title)");
    assert_eq!(entry.price, "(no price)");
    assert_eq!(entry.link, "https://other.test/ad");
}

#[test]
fn ad_without_link_is_visible_but_not_an_entry() {
    let html = page(r#"<div id="2222222"><h3>Sold</h3></div>"#);

    let listing = ListingExtractor::new().extract(&html, PAGE_URL);
    assert_eq!(listing.visible_ids, vec!["2222222"]);
    assert!(listing.entries.is_empty());
}

#[test]
fn price_must_belong_to_the_same_ad() {
    let html = page(
        r#"<div id="3333333"><a href="/a"><h3>A</h3>
             <span data-testid="search-result-entry-price-9999999">€ 5</span></a></div>"#,
    );

    let listing = ListingExtractor::new().extract(&html, PAGE_URL);
    assert_eq!(listing.entries[0].price, "(no price)");
}

#[test]
fn whitespace_in_text_is_collapsed() {
    let html = page(&ad("4444444", "  Berg\n   Rad  ", "\n € 1.200 "));

    let listing = ListingExtractor::new().extract(&html, PAGE_URL);
    assert_eq!(listing.entries[0].title, "Berg Rad");
    assert_eq!(listing.entries[0].price, "€ 1.200");
}
