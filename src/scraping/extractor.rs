use scraper::{ElementRef, Html, Selector};

use crate::config::PortalConfig;
use crate::error::AppError;

pub const ROW_SELECTOR: &str = r#"td.subject[onclick^="fnProperties("]"#;
const PAGE_LINK_SELECTOR: &str = "td.pagenum a[href*='page=']";
pub const DETAIL_CONTAINER_SELECTOR: &str = "div.infor_customer";
const SECTION_HEADING_SELECTOR: &str = "div.infor_customer > h2";

fn selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::BrowserError(format!("invalid selector '{}': {}", css, e)))
}

/// Parses the listing table of the console.
pub struct ListingParser {
    rows: Selector,
    page_links: Selector,
}

impl ListingParser {
    pub fn new() -> Result<Self, AppError> {
        Ok(Self {
            rows: selector(ROW_SELECTOR)?,
            page_links: selector(PAGE_LINK_SELECTOR)?,
        })
    }

    /// QIDs in document order, taken from the first quoted argument of
    /// each row's `fnProperties(...)` handler.
    pub fn record_ids(&self, html: &str) -> Vec<String> {
        let doc = Html::parse_document(html);
        doc.select(&self.rows)
            .filter_map(|cell| cell.value().attr("onclick"))
            .filter_map(|onclick| onclick.split('\'').nth(1))
            .map(str::to_string)
            .collect()
    }

    /// Highest `page=` number among the pagination links, 1 without any.
    pub fn total_pages(&self, html: &str) -> u32 {
        let doc = Html::parse_document(html);
        doc.select(&self.page_links)
            .filter_map(|link| link.value().attr("href"))
            .filter_map(|href| href.rsplit("page=").next())
            .filter_map(|n| n.trim().parse::<u32>().ok())
            .max()
            .unwrap_or(1)
    }
}

/// Pulls question and answer text out of the two detail views.
///
/// Both views render sections as `div.infor_customer > h2` headings. A
/// missing section yields an empty string.
pub struct DetailExtractor {
    headings: Selector,
    question_marker: String,
    answer_marker: String,
}

impl DetailExtractor {
    pub fn new(portal: &PortalConfig) -> Result<Self, AppError> {
        Ok(Self {
            headings: selector(SECTION_HEADING_SELECTOR)?,
            question_marker: portal.question_marker.clone(),
            answer_marker: portal.answer_marker.clone(),
        })
    }

    /// Text of the first `div` sibling following the question heading.
    pub fn question(&self, html: &str) -> String {
        let doc = Html::parse_document(html);
        let Some(heading) = self.find_heading(&doc, &self.question_marker) else {
            return String::new();
        };

        heading
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "div")
            .map(|div| element_text(&div))
            .unwrap_or_default()
    }

    /// Paragraphs after the answer heading, up to the next `h2`.
    pub fn answer(&self, html: &str) -> String {
        let doc = Html::parse_document(html);
        let Some(heading) = self.find_heading(&doc, &self.answer_marker) else {
            return String::new();
        };
        let target = heading.id();

        let mut paragraphs = Vec::new();
        let mut passed_heading = false;
        for node in doc.tree.root().descendants() {
            if node.id() == target {
                passed_heading = true;
                continue;
            }
            if !passed_heading {
                continue;
            }
            let Some(el) = ElementRef::wrap(node) else {
                continue;
            };
            match el.value().name() {
                "h2" => break,
                "p" => paragraphs.push(element_text(&el)),
                _ => {}
            }
        }

        paragraphs.join("\n")
    }

    fn find_heading<'a>(&self, doc: &'a Html, marker: &str) -> Option<ElementRef<'a>> {
        doc.select(&self.headings)
            .find(|h2| h2.text().collect::<String>().contains(marker))
    }
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <table>
          <tr><td class="num">1</td><td class="subject" onclick="fnProperties('1001','x')">first</td></tr>
          <tr><td class="subject" onclick="fnProperties('1002')">second</td></tr>
          <tr><td class="subject" onclick="otherHandler('9999')">ignored</td></tr>
          <tr><td class="subject" onclick="fnProperties('1003', 2)">third</td></tr>
        </table>
        <table><tr><td class="pagenum">
          <a href="index.asp?rCriterion=1&amp;page=2">2</a>
          <a href="index.asp?rCriterion=1&amp;page=7">7</a>
          <a href="index.asp?rCriterion=1&amp;page=3">3</a>
          <a href="index.asp?rCriterion=1&amp;page=next">next</a>
        </td></tr></table>
    "#;

    fn extractor() -> DetailExtractor {
        DetailExtractor::new(&PortalConfig::default()).unwrap()
    }

    #[test]
    fn record_ids_in_document_order() {
        let parser = ListingParser::new().unwrap();
        assert_eq!(parser.record_ids(LISTING), vec!["1001", "1002", "1003"]);
    }

    #[test]
    fn total_pages_takes_highest_link() {
        let parser = ListingParser::new().unwrap();
        assert_eq!(parser.total_pages(LISTING), 7);
    }

    #[test]
    fn total_pages_defaults_to_one() {
        let parser = ListingParser::new().unwrap();
        assert_eq!(parser.total_pages("<table><tr><td>no pages</td></tr></table>"), 1);
        assert!(parser.record_ids("<p>empty</p>").is_empty());
    }

    #[test]
    fn question_is_trimmed_sibling_block() {
        let html = r#"
            <div class="infor_customer">
              <h2>고객정보</h2>
              <div>someone</div>
              <h2>질문내용</h2>
              <div>
                  Hello
              </div>
              <div>not this</div>
            </div>
        "#;
        assert_eq!(extractor().question(html), "Hello");
    }

    #[test]
    fn question_skips_non_div_siblings() {
        let html = r#"
            <div class="infor_customer">
              <h2>질문내용</h2>
              <span>label</span>
              <div>  line one <b>bold</b> </div>
            </div>
        "#;
        assert_eq!(extractor().question(html), "line one bold");
    }

    #[test]
    fn answer_stops_at_next_heading() {
        let html = r#"
            <div class="infor_customer">
              <h2>질문내용</h2>
              <div><p>question paragraph</p></div>
              <h2>답변내역</h2>
              <div class="answer">
                <p> first </p>
                <p>second</p>
              </div>
              <p>third</p>
              <h2>처리내역</h2>
              <p>after boundary</p>
            </div>
        "#;
        assert_eq!(extractor().answer(html), "first\nsecond\nthird");
    }

    #[test]
    fn missing_heading_yields_empty_text() {
        let html = r#"<div class="infor_customer"><h2>기타</h2><div>x</div><p>y</p></div>"#;
        assert_eq!(extractor().question(html), "");
        assert_eq!(extractor().answer(html), "");

        // Headings outside the customer block are not sections.
        let html = r#"<section><h2>질문내용</h2><div>outside</div></section>"#;
        assert_eq!(extractor().question(html), "");
    }

    #[test]
    fn markers_are_configurable() {
        let portal = PortalConfig {
            question_marker: "question content".to_string(),
            answer_marker: "answer history".to_string(),
            ..PortalConfig::default()
        };
        let extractor = DetailExtractor::new(&portal).unwrap();
        let html = r#"
            <div class="infor_customer">
              <h2>question content</h2><div>Hello</div>
              <h2>answer history</h2><p>a</p><p>b</p><p>c</p>
              <h2>next</h2><p>d</p>
            </div>
        "#;
        assert_eq!(extractor.question(html), "Hello");
        assert_eq!(extractor.answer(html), "a\nb\nc");
    }
}
