//! Markdown section parser.
//!
//! Splits a semi-structured markdown roadmap into ordered
//! [`RoadmapSection`] records. A section starts at a heading of the form
//! `#### **Day <start>–<end>: <focus area>**` (en dash between the day
//! numbers) and runs to the start of the next such heading, or the end of
//! the document.
//!
//! Parsing is total: malformed emphasis or link syntax is simply not
//! collected, and a document with no recognized headings parses to an
//! empty list rather than an error.

use once_cell::sync::Lazy;
use regex::Regex;

use super::model::{Resource, RoadmapSection};

static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"#### \*\*Day (\d+)–(\d+): ([^*]+)\*\*").expect("header pattern is valid")
});

static TOPIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("topic pattern is valid"));

static RESOURCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("resource pattern is valid"));

/// One recognized section heading: where the whole match starts and ends,
/// plus the captured day range and focus area.
struct Heading {
    start: usize,
    end: usize,
    day_range: String,
    focus_area: String,
}

/// Parse a markdown document into ordered sections.
///
/// `completed` is always initialized to `false`, regardless of any
/// completion markers in the source text.
pub fn parse(markdown: &str) -> Vec<RoadmapSection> {
    let headings: Vec<Heading> = HEADER_RE
        .captures_iter(markdown)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Heading {
                start: whole.start(),
                end: whole.end(),
                day_range: format!("Day {}–{}", &caps[1], &caps[2]),
                focus_area: caps[3].trim().to_string(),
            })
        })
        .collect();

    let mut sections = Vec::with_capacity(headings.len());
    for (i, heading) in headings.iter().enumerate() {
        let section_end = headings
            .get(i + 1)
            .map_or(markdown.len(), |next| next.start);

        // The section's content span includes its own heading line; the
        // topic/resource pass runs only on the body after the heading so
        // the heading's bold span is not reported as a topic.
        let content = markdown[heading.start..section_end].trim().to_string();
        let body = &markdown[heading.end..section_end];

        let topics: Vec<String> = TOPIC_RE
            .captures_iter(body)
            .map(|caps| caps[1].trim().to_string())
            .collect();

        let resources: Vec<Resource> = RESOURCE_RE
            .captures_iter(body)
            .map(|caps| Resource {
                title: caps[1].to_string(),
                url: caps[2].to_string(),
            })
            .collect();

        sections.push(RoadmapSection {
            title: format!("{}: {}", heading.day_range, heading.focus_area),
            content,
            day_range: heading.day_range.clone(),
            focus_area: heading.focus_area.clone(),
            topics,
            resources,
            completed: false,
        });
    }

    sections
}
