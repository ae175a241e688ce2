//! HTML slide converter.
//!
//! Reads one HTML document and turns it into a [`Slide`]: the first `<h1>`
//! (or the document `<title>`) becomes the slide title, and `<h2>`-`<h4>`,
//! `<p>`, `<blockquote>` and `<li>` elements become paragraphs in document order.
//! Layout and styling are not interpreted.

use std::borrow::Cow;

use async_trait::async_trait;
use regex::{Captures, Regex};
use tracing::{debug, error};

use crate::contract::{
    ConversionError, Paragraph, ParagraphKind, PresentationBuilder, Slide, SlideConverter,
    SlideSource,
};

pub struct HtmlSlideConverter {
    ignored: Regex,
    body: Regex,
    body_open: Regex,
    title: Regex,
    heading: Regex,
    block: Regex,
    line_break: Regex,
    tag: Regex,
    entity: Regex,
    whitespace: Regex,
}

impl Default for HtmlSlideConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlSlideConverter {
    pub fn new() -> Self {
        // Patterns are constant; failing to compile them is a programming error.
        let re = |pattern: &str| Regex::new(pattern).expect("valid slide pattern");
        Self {
            ignored: re(r"(?is)<!--.*?-->|<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>"),
            body: re(r"(?is)<body\b[^>]*>(.*?)</body\s*>"),
            body_open: re(r"(?i)<body\b"),
            title: re(r"(?is)<title\b[^>]*>(.*?)</title\s*>"),
            heading: re(r"(?is)<h1\b[^>]*>(.*?)</h1\s*>"),
            block: re(
                r"(?is)<(h2|h3|h4|p|li|blockquote)\b[^>]*>(.*?)</(?:h2|h3|h4|p|li|blockquote)\s*>",
            ),
            line_break: re(r"(?i)<br\s*/?>"),
            tag: re(r"(?s)<[^>]*>"),
            entity: re(r"&(?:#x[0-9A-Fa-f]+|#[0-9]+|[A-Za-z][A-Za-z0-9]*);"),
            whitespace: re(r"\s+"),
        }
    }

    /// Parses slide markup. `source` is only used for error reporting.
    pub fn parse(&self, source: &SlideSource, html: &str) -> Result<Slide, ConversionError> {
        let html = self.ignored.replace_all(html, "");

        let body = match self.body.captures(&html) {
            Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(""),
            None if self.body_open.is_match(&html) => {
                return Err(ConversionError::Invalid(format!(
                    "{}: unterminated <body> element",
                    source.path.display()
                )));
            }
            None => {
                return Err(ConversionError::MissingBody {
                    path: source.path.clone(),
                })
            }
        };

        let title = self
            .heading
            .captures(body)
            .or_else(|| self.title.captures(&html))
            .and_then(|caps| caps.get(1))
            .map(|m| self.clean_text(m.as_str()))
            .filter(|t| !t.is_empty());

        let mut paragraphs: Vec<Paragraph> = self
            .block
            .captures_iter(body)
            .filter_map(|caps| {
                let kind = match caps[1].to_ascii_lowercase().as_str() {
                    "h2" | "h3" | "h4" => ParagraphKind::Heading,
                    "li" => ParagraphKind::Bullet,
                    _ => ParagraphKind::Body,
                };
                let text = self.clean_text(&caps[2]);
                (!text.is_empty()).then_some(Paragraph { text, kind })
            })
            .collect();

        // Bare text with no recognised block elements still makes a slide.
        if paragraphs.is_empty() {
            let without_title = self.heading.replace_all(body, "");
            let text = self.clean_text(&without_title);
            if !text.is_empty() {
                paragraphs.push(Paragraph {
                    text,
                    kind: ParagraphKind::Body,
                });
            }
        }

        if title.is_none() && paragraphs.is_empty() {
            return Err(ConversionError::EmptySlide {
                path: source.path.clone(),
            });
        }

        Ok(Slide {
            title,
            paragraphs,
            source: source.path.clone(),
        })
    }

    fn clean_text(&self, fragment: &str) -> String {
        let text = self.line_break.replace_all(fragment, " ");
        let text = self.tag.replace_all(&text, "");
        let text = self.decode_entities(&text);
        self.whitespace.replace_all(&text, " ").trim().to_string()
    }

    /// Decodes character references one at a time. Unknown entities and bare
    /// `&` are left as written.
    fn decode_entities<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.entity.replace_all(text, |caps: &Captures| {
            let reference = &caps[0];
            match quick_xml::escape::unescape(reference) {
                Ok(decoded) => decoded.into_owned(),
                Err(_) => reference.to_string(),
            }
        })
    }
}

#[async_trait]
impl SlideConverter for HtmlSlideConverter {
    async fn convert(
        &self,
        source: &SlideSource,
        builder: &mut dyn PresentationBuilder,
    ) -> Result<(), ConversionError> {
        let html = tokio::fs::read_to_string(&source.path).await.map_err(|e| {
            error!(error = ?e, slide = %source.path.display(), "Failed to read slide");
            ConversionError::Io {
                path: source.path.clone(),
                source: e,
            }
        })?;

        let slide = self.parse(source, &html)?;
        debug!(
            slide = %source.name(),
            title = slide.title.as_deref().unwrap_or(""),
            paragraphs = slide.paragraphs.len(),
            "Parsed slide"
        );
        builder.add_slide(slide);
        Ok(())
    }
}
