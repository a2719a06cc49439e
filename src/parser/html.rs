// file: src/parser/html.rs
// description: broker review page extraction with scraper
// reference: https://docs.rs/scraper

use crate::error::{PipelineError, Result};
use crate::models::{
    AffiliateLink, FromLabel, NormalizedBrokerRecord, Regulation, Review, TradingCondition,
};
use crate::parser::BrokerPageParser;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

lazy_static! {
    static ref H1: Selector = Selector::parse("h1").expect("h1 selector is valid");
    static ref OG_TITLE: Selector =
        Selector::parse(r#"meta[property="og:title"]"#).expect("og:title selector is valid");
    static ref TITLE: Selector = Selector::parse("title").expect("title selector is valid");
    static ref SECTION_HEADING: Selector =
        Selector::parse("h2, h3").expect("heading selector is valid");
    static ref LIST_ITEM: Selector = Selector::parse("li").expect("li selector is valid");
    static ref TABLE_ROW: Selector = Selector::parse("tr").expect("tr selector is valid");
    static ref HEADER_CELL: Selector = Selector::parse("th").expect("th selector is valid");
    static ref DATA_CELL: Selector = Selector::parse("td").expect("td selector is valid");
    static ref REVIEW_BLOCK: Selector =
        Selector::parse(r#"[itemprop="review"], .review, .user-review"#)
            .expect("review selector is valid");
    static ref REVIEW_BODY: Selector =
        Selector::parse(r#"[itemprop="reviewBody"], .review-body, .review-text"#)
            .expect("review body selector is valid");
    static ref REVIEW_AUTHOR: Selector =
        Selector::parse(r#"[itemprop="author"], .review-author"#)
            .expect("review author selector is valid");
    static ref REVIEW_RATING: Selector =
        Selector::parse(r#"[itemprop="ratingValue"], .review-rating, .rating"#)
            .expect("rating selector is valid");
    static ref ANCHOR: Selector = Selector::parse("a[href]").expect("anchor selector is valid");

    static ref TITLE_SUFFIX: Regex =
        Regex::new(r"(?i)\s*(?:[-|:–—]\s*)?(?:broker\s+)?\breviews?\b.*$")
            .expect("TITLE_SUFFIX regex is valid");
    static ref AFFILIATE_QUERY: Regex =
        Regex::new(r"(?i)[?&](?:aff|affid|affiliate|affiliate_id|ref|refid|partner)=")
            .expect("AFFILIATE_QUERY regex is valid");
    static ref LICENSE_NUMBER: Regex =
        Regex::new(r"(?i)licen[cs]e\b\s*(?:no\.?|number|#)?\s*:?\s*([A-Z0-9][A-Z0-9/-]*)")
            .expect("LICENSE_NUMBER regex is valid");
    static ref PAREN_COUNTRY: Regex =
        Regex::new(r"\(([^)]+)\)").expect("PAREN_COUNTRY regex is valid");
    static ref RATING_VALUE: Regex =
        Regex::new(r"(\d+(?:\.\d+)?)").expect("RATING_VALUE regex is valid");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Regulations,
    Features,
    TradingConditions,
    AccountTypes,
    Platforms,
    PaymentMethods,
    Support,
    Education,
    Promotions,
}

impl Section {
    /// Order matters: "minimum deposit" belongs to trading conditions,
    /// "deposit methods" to payments.
    fn from_heading(heading: &str) -> Option<Self> {
        let h = heading.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| h.contains(n));

        if has(&["account"]) {
            Some(Self::AccountTypes)
        } else if has(&["payment", "deposit method", "withdrawal", "funding"]) {
            Some(Self::PaymentMethods)
        } else if has(&["trading condition", "fees", "spread", "commission", "leverage"]) {
            Some(Self::TradingConditions)
        } else if has(&["support", "customer service", "contact"]) {
            Some(Self::Support)
        } else if has(&["education", "learning", "academy", "research"]) {
            Some(Self::Education)
        } else if has(&["promotion", "bonus", "offer"]) {
            Some(Self::Promotions)
        } else if has(&["regulat", "licen", "safety", "trust"]) {
            Some(Self::Regulations)
        } else if has(&["platform", "software", "app"]) {
            Some(Self::Platforms)
        } else if has(&["feature", "pros", "highlights"]) {
            Some(Self::Features)
        } else {
            None
        }
    }
}

/// Extracts broker fields from a review page. Collections come from
/// `h2`/`h3` sections followed by lists or key/value tables; reviews and
/// affiliate links are found anywhere in the page.
#[derive(Debug, Clone, Default)]
pub struct HtmlReviewParser;

impl HtmlReviewParser {
    pub fn new() -> Self {
        Self
    }

    fn extract_name(document: &Html) -> Option<String> {
        let candidates = [
            document.select(&H1).next().map(|el| element_text(&el)),
            document
                .select(&OG_TITLE)
                .next()
                .and_then(|el| el.value().attr("content"))
                .map(collapse_whitespace),
            document.select(&TITLE).next().map(|el| element_text(&el)),
        ];

        candidates
            .into_iter()
            .flatten()
            .map(|raw| clean_title(&raw))
            .find(|name| !name.is_empty())
    }

    fn extract_sections(document: &Html, record: &mut NormalizedBrokerRecord) {
        for heading in document.select(&SECTION_HEADING) {
            let Some(section) = Section::from_heading(&element_text(&heading)) else {
                continue;
            };

            let mut labels = Vec::new();
            let mut pairs = Vec::new();

            for sibling in heading.next_siblings().filter_map(ElementRef::wrap) {
                if matches!(sibling.value().name(), "h1" | "h2" | "h3") {
                    break;
                }
                labels.extend(
                    sibling
                        .select(&LIST_ITEM)
                        .map(|li| element_text(&li))
                        .filter(|t| !t.is_empty()),
                );
                pairs.extend(table_pairs(&sibling));
            }

            Self::apply_section(record, section, labels, pairs);
        }
    }

    fn apply_section(
        record: &mut NormalizedBrokerRecord,
        section: Section,
        labels: Vec<String>,
        pairs: Vec<(String, String)>,
    ) {
        if section == Section::TradingConditions {
            record.trading_conditions.extend(
                pairs
                    .into_iter()
                    .map(|(label, value)| TradingCondition { label, value }),
            );
            record
                .trading_conditions
                .extend(labels.into_iter().map(TradingCondition::from_label));
            return;
        }

        let labels = labels
            .into_iter()
            .chain(pairs.into_iter().map(|(label, value)| format!("{}: {}", label, value)));

        match section {
            Section::Regulations => record.regulations.extend(labels.map(|l| regulation_from_text(&l))),
            Section::Features => record.features.extend(labels.map(FromLabel::from_label)),
            Section::AccountTypes => record.account_types.extend(labels.map(FromLabel::from_label)),
            Section::Platforms => record.platforms.extend(labels.map(FromLabel::from_label)),
            Section::PaymentMethods => {
                record.payment_methods.extend(labels.map(FromLabel::from_label))
            }
            Section::Support => record.support.extend(labels.map(FromLabel::from_label)),
            Section::Education => record.education.extend(labels.map(FromLabel::from_label)),
            Section::Promotions => record.promotions.extend(labels.map(FromLabel::from_label)),
            Section::TradingConditions => {}
        }
    }

    fn extract_reviews(document: &Html) -> Vec<Review> {
        let mut reviews = Vec::new();
        let mut seen = HashSet::new();

        for block in document.select(&REVIEW_BLOCK) {
            let body = block
                .select(&REVIEW_BODY)
                .next()
                .map(|el| element_text(&el))
                .unwrap_or_else(|| element_text(&block));

            if body.is_empty() || !seen.insert(body.clone()) {
                continue;
            }

            let author = block
                .select(&REVIEW_AUTHOR)
                .next()
                .map(|el| element_text(&el))
                .filter(|a| !a.is_empty());

            let rating = block.select(&REVIEW_RATING).next().and_then(|el| {
                let raw = el
                    .value()
                    .attr("content")
                    .map(str::to_string)
                    .unwrap_or_else(|| element_text(&el));
                RATING_VALUE
                    .captures(&raw)
                    .and_then(|c| c.get(1))
                    .and_then(|m| m.as_str().parse::<f64>().ok())
            });

            reviews.push(Review {
                author,
                rating,
                body,
            });
        }

        reviews
    }

    fn extract_affiliate_links(document: &Html) -> Vec<AffiliateLink> {
        let mut links = Vec::new();
        let mut seen = HashSet::new();

        for anchor in document.select(&ANCHOR) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let sponsored = anchor
                .value()
                .attr("rel")
                .map(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("sponsored")))
                .unwrap_or(false);

            if !(sponsored || AFFILIATE_QUERY.is_match(href)) || !seen.insert(href.to_string()) {
                continue;
            }

            let label = element_text(&anchor);
            links.push(AffiliateLink {
                url: href.to_string(),
                label: if label.is_empty() { None } else { Some(label) },
            });
        }

        links
    }
}

impl BrokerPageParser for HtmlReviewParser {
    fn parse(&self, html: &str, source: &str) -> Result<NormalizedBrokerRecord> {
        if html.trim().is_empty() {
            return Err(PipelineError::HtmlParse {
                file: source.to_string(),
                message: "document is empty".to_string(),
            });
        }

        let document = Html::parse_document(html);

        let mut record = NormalizedBrokerRecord {
            name: Self::extract_name(&document),
            ..NormalizedBrokerRecord::default()
        };

        Self::extract_sections(&document, &mut record);
        record.reviews = Self::extract_reviews(&document);
        record.affiliate_links = Self::extract_affiliate_links(&document);

        Ok(record)
    }
}

fn element_text(element: &ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean_title(raw: &str) -> String {
    TITLE_SUFFIX
        .replace(raw, "")
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '|' | ':' | '–' | '—'))
        .to_string()
}

fn table_pairs(element: &ElementRef) -> Vec<(String, String)> {
    let rows: Vec<ElementRef> = if element.value().name() == "tr" {
        vec![*element]
    } else {
        element.select(&TABLE_ROW).collect()
    };

    rows.iter()
        .filter_map(|row| {
            let label = row
                .select(&HEADER_CELL)
                .next()
                .map(|c| element_text(&c))
                .or_else(|| row.select(&DATA_CELL).next().map(|c| element_text(&c)))?;
            let value = row
                .select(&DATA_CELL)
                .map(|c| element_text(&c))
                .filter(|v| *v != label)
                .last()?;
            if label.is_empty() {
                None
            } else {
                Some((label, value))
            }
        })
        .collect()
}

fn regulation_from_text(text: &str) -> Regulation {
    let license_number = LICENSE_NUMBER
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    let country = PAREN_COUNTRY
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string());

    let authority = text
        .split(['(', ',', '-', '–'])
        .next()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(text)
        .to_string();

    Regulation {
        authority,
        license_number,
        country,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"
        <!DOCTYPE html>
        <html>
        <head>
            <title>XM Review 2024 | Compare Brokers</title>
            <meta property="og:title" content="XM Broker Review">
        </head>
        <body>
            <h1>XM Review</h1>
            <h2>Regulation &amp; Safety</h2>
            <ul>
                <li>CySEC (Cyprus) - License No. 120/10</li>
                <li>ASIC (Australia)</li>
            </ul>
            <h2>Trading Platforms</h2>
            <ul><li>MetaTrader 4</li><li>MetaTrader 5</li></ul>
            <h2>Trading Conditions</h2>
            <table>
                <tr><th>Minimum deposit</th><td>$5</td></tr>
                <tr><th>Max leverage</th><td>1:1000</td></tr>
            </table>
            <h3>Deposit Methods</h3>
            <ol><li>Visa</li><li>Skrill</li></ol>
            <div class="review">
                <span class="review-author">Ana</span>
                <span itemprop="ratingValue" content="4.5">4.5/5</span>
                <p class="review-body">Fast withdrawals.</p>
            </div>
            <a href="https://xm.com/register?aff=99" rel="nofollow">Open account</a>
            <a href="https://xm.com/about">About</a>
            <a href="https://partner.example/xm" rel="sponsored noopener">Visit XM</a>
        </body>
        </html>
    "#;

    fn parse(html: &str) -> NormalizedBrokerRecord {
        HtmlReviewParser::new().parse(html, "xm-review.html").unwrap()
    }

    #[test]
    fn test_name_from_heading_without_review_suffix() {
        assert_eq!(parse(PAGE).name.as_deref(), Some("XM"));
    }

    #[test]
    fn test_name_falls_back_to_title() {
        let record = parse("<html><head><title>Plus500 Review | Site</title></head><body></body></html>");
        assert_eq!(record.name.as_deref(), Some("Plus500"));
    }

    #[test]
    fn test_review_inside_a_word_is_not_a_suffix() {
        let record = parse("<html><body><h1>Preview Markets Review</h1></body></html>");
        assert_eq!(record.name.as_deref(), Some("Preview Markets"));

        let record = parse("<html><body><h1>Reviewed Capital</h1></body></html>");
        assert_eq!(record.name.as_deref(), Some("Reviewed Capital"));
    }

    #[test]
    fn test_missing_name_is_none() {
        let record = parse("<html><body><p>No headings here</p></body></html>");
        assert_eq!(record.name, None);
    }

    #[test]
    fn test_sections_collect_lists_and_tables() {
        let record = parse(PAGE);

        assert_eq!(record.regulations.len(), 2);
        assert_eq!(record.regulations[0].authority, "CySEC");
        assert_eq!(record.regulations[0].country.as_deref(), Some("Cyprus"));
        assert_eq!(record.regulations[0].license_number.as_deref(), Some("120/10"));

        assert_eq!(record.platforms.len(), 2);
        assert_eq!(record.payment_methods.len(), 2);
        assert_eq!(
            record.trading_conditions[0],
            TradingCondition {
                label: "Minimum deposit".to_string(),
                value: "$5".to_string()
            }
        );
    }

    #[test]
    fn test_reviews_and_affiliate_links() {
        let record = parse(PAGE);

        assert_eq!(record.reviews.len(), 1);
        assert_eq!(record.reviews[0].author.as_deref(), Some("Ana"));
        assert_eq!(record.reviews[0].rating, Some(4.5));
        assert_eq!(record.reviews[0].body, "Fast withdrawals.");

        let urls: Vec<&str> = record.affiliate_links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://xm.com/register?aff=99", "https://partner.example/xm"]
        );
    }

    #[test]
    fn test_empty_document_is_an_error() {
        assert!(HtmlReviewParser::new().parse("   ", "empty.html").is_err());
    }
}
