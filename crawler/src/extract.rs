//! Turning a page's HTML into word counts and outgoing links.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Count the words visible on a page.
///
/// Script, style and noscript subtrees are skipped, tokens are lowercased
/// and split on non-alphanumeric boundaries, and words fully matching any
/// ignored pattern are dropped.
pub fn word_counts(html: &str, ignored_words: &[Regex]) -> HashMap<String, usize> {
    let document = Html::parse_document(html);
    let mut text = String::new();
    collect_text(document.root_element(), &mut text);

    let mut counts = HashMap::new();
    for token in text.split(|c: char| !c.is_alphanumeric()) {
        if token.is_empty() {
            continue;
        }
        let word = token.to_lowercase();
        if ignored_words.iter().any(|pattern| pattern.is_match(&word)) {
            continue;
        }
        *counts.entry(word).or_insert(0) += 1;
    }
    counts
}

fn collect_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            let tag_name = child_element.value().name();
            if tag_name == "script" || tag_name == "style" || tag_name == "noscript" {
                continue;
            }
            collect_text(child_element, out);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        }
    }
}

/// Extract the outgoing links of a page as absolute http(s) URLs, in
/// document order, deduplicated.
pub fn links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("a[href]").unwrap();

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for element in document.select(&link_selector) {
        let href = match element.value().attr("href") {
            Some(href) => href.trim(),
            None => continue,
        };

        // Skip empty, javascript, mailto and other non-http(s) schemes
        if href.is_empty()
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with("data:")
        {
            continue;
        }

        // Resolve relative hrefs against the page URL
        let mut absolute = match base_url.join(href) {
            Ok(url) => url,
            Err(_) => continue,
        };
        absolute.set_fragment(None);

        if absolute.scheme() != "http" && absolute.scheme() != "https" {
            continue;
        }

        let url = absolute.to_string();
        if seen.insert(url.clone()) {
            links.push(url);
        }
    }
    links
}
