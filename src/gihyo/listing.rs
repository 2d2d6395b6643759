use std::str::FromStr;

use scraper::{ElementRef, Html, Node, Selector};

use crate::gihyo::common::{Format, NEXT_PAGE_CSS};
use crate::gihyo::ebook::Ebook;

/// One page of the "my page" purchase listing.
#[derive(Debug, Default)]
pub struct Listing {
    pub ebooks: Vec<Ebook>,
    pub has_next: bool,
}

/// Parses the purchase listing out of a "my page" document.
///
/// An item is an `li` holding `a > p.title`; its formats are the
/// `a > ul > li` entries classed `epub` or `pdf`. Items without a
/// recognised format are kept with an empty format list.
pub fn parse_listing(html: &str) -> Listing {
    let document = Html::parse_document(html);

    let item_selector = Selector::parse("li").expect("Failed to parse listing items");
    let next_selector = Selector::parse(NEXT_PAGE_CSS).expect("Failed to parse next page link");

    let ebooks = document
        .select(&item_selector)
        .filter_map(|item| {
            let link = child_element(item, "a")?;
            let title = child_elements(link, "p").find(|p| has_class(*p, "title"))?;
            Some((link, title))
        })
        .enumerate()
        .map(|(position, (link, title))| Ebook {
            position,
            title: rendered_text(title),
            formats: listed_formats(link),
        })
        .collect();

    Listing {
        ebooks,
        has_next: document.select(&next_selector).next().is_some(),
    }
}

fn listed_formats(link: ElementRef) -> Vec<Format> {
    let flagged: Vec<Format> = child_elements(link, "ul")
        .flat_map(|list| child_elements(list, "li"))
        .flat_map(|entry| {
            entry
                .value()
                .classes()
                .filter_map(|class| Format::from_str(class).ok())
                .collect::<Vec<_>>()
        })
        .collect();

    enum_iterator::all::<Format>()
        .filter(|format| flagged.contains(format))
        .collect()
}

fn child_elements<'a>(
    parent: ElementRef<'a>,
    name: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == name)
}

fn child_element<'a>(parent: ElementRef<'a>, name: &'a str) -> Option<ElementRef<'a>> {
    child_elements(parent, name).next()
}

fn has_class(element: ElementRef, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Text as a browser renders it: whitespace runs collapse to one space,
/// `<br>` starts a new line, blank lines are dropped.
fn rendered_text(element: ElementRef) -> String {
    let mut raw = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => raw.push_str(text),
            Node::Element(el) if el.name() == "br" => raw.push('\n'),
            _ => {}
        }
    }

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const MY_PAGE: &str = r##"
        <html><body>
        <ul class="nav"><li><a href="/dp">トップ</a></li></ul>
        <ul class="items">
          <li>
            <a href="javascript:void(0)">
              <p class="title">Software Design 2022年1月号</p>
              <ul><li class="pdf">PDF</li></ul>
            </a>
          </li>
          <li>
            <a href="javascript:void(0)">
              <p class="title">
                WEB+DB PRESS<br>Vol.130
              </p>
              <ul><li class="pdf">PDF</li><li class="epub">EPUB</li></ul>
            </a>
          </li>
          <li>
            <a href="javascript:void(0)">
              <p class="title">紙の本のおまけ</p>
              <ul><li class="other">その他</li></ul>
            </a>
          </li>
        </ul>
        <ol class="paging"><li class="paging-number">1</li><li><a class="next" href="#">次へ</a></li></ol>
        </body></html>
    "##;

    #[test]
    fn parses_items_in_document_order() {
        let listing = parse_listing(MY_PAGE);
        let titles: Vec<&str> = listing.ebooks.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Software Design 2022年1月号",
                "WEB+DB PRESS\nVol.130",
                "紙の本のおまけ"
            ]
        );
        let positions: Vec<usize> = listing.ebooks.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn parses_flagged_formats() {
        let listing = parse_listing(MY_PAGE);
        assert_eq!(listing.ebooks[0].formats, vec![Format::Pdf]);
        assert_eq!(listing.ebooks[1].formats, vec![Format::Epub, Format::Pdf]);
        assert!(listing.ebooks[2].formats.is_empty());
    }

    #[test]
    fn detects_next_page_link() {
        assert!(parse_listing(MY_PAGE).has_next);
        let last_page = MY_PAGE.replace(r##"<a class="next" href="#">次へ</a>"##, "");
        assert!(!parse_listing(&last_page).has_next);
    }

    #[test]
    fn items_are_counted_like_the_click_xpath() {
        let html = r#"
            <ul>
              <li><a href="/dp/ebook/1"><img src="cover.png"></a><a><p class="title">表紙リンクの後</p></a></li>
              <li><a><p class="title new">新着 Rust入門</p><ul><li class="epub">EPUB</li></ul></a></li>
              <li><a><p class="subtitle">サブタイトルのみ</p></a></li>
            </ul>
        "#;
        let listing = parse_listing(html);
        assert_eq!(listing.ebooks.len(), 1);
        assert_eq!(listing.ebooks[0].position, 0);
        assert_eq!(listing.ebooks[0].title, "新着 Rust入門");
        assert_eq!(listing.ebooks[0].formats, vec![Format::Epub]);
    }

    #[test]
    fn empty_page_has_no_items() {
        let listing = parse_listing("<html><body><p>購入履歴はありません</p></body></html>");
        assert!(listing.ebooks.is_empty());
        assert!(!listing.has_next);
    }
}
