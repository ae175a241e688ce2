//! Presentation builder that writes an OOXML (`.pptx`) package.
//!
//! Slides are kept in memory until [`PresentationBuilder::serialize`], which
//! renders every part, zips them and moves the package into place atomically.
//! The package holds one master, one blank layout and one theme; each slide is
//! a title text box plus a body text box.

use std::fmt::Write as FmtWrite;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use quick_xml::escape::escape;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::contract::{
    BuildError, DeckMetadata, Layout, ParagraphKind, PresentationBuilder, Slide,
};

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const NS_PRESENTATION: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const REL_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";

/// Half an inch, in EMU.
const MARGIN: u64 = 457_200;
const TITLE_HEIGHT: u64 = 914_400;
const FIRST_SLIDE_ID: usize = 256;

#[derive(Debug, Default)]
pub struct PptxDeckBuilder {
    metadata: DeckMetadata,
    slides: Vec<Slide>,
    serialized: bool,
}

impl PptxDeckBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metadata(&self) -> &DeckMetadata {
        &self.metadata
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// Renders the whole package into memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>, BuildError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut part = |name: &str, content: &str| -> Result<(), BuildError> {
            zip.start_file(name, options)?;
            zip.write_all(content.as_bytes())?;
            Ok(())
        };

        part("[Content_Types].xml", &self.content_types_xml())?;
        part("_rels/.rels", PACKAGE_RELS_XML)?;
        part("docProps/core.xml", &self.core_xml())?;
        part("docProps/app.xml", &self.app_xml())?;
        part("ppt/presentation.xml", &self.presentation_xml())?;
        part("ppt/_rels/presentation.xml.rels", &self.presentation_rels_xml())?;
        part("ppt/slideMasters/slideMaster1.xml", &slide_master_xml())?;
        part(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            &rels_xml(&[
                ("rId1", REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
                ("rId2", REL_THEME, "../theme/theme1.xml"),
            ]),
        )?;
        part("ppt/slideLayouts/slideLayout1.xml", &slide_layout_xml())?;
        part(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            &rels_xml(&[("rId1", REL_SLIDE_MASTER, "../slideMasters/slideMaster1.xml")]),
        )?;
        part("ppt/theme/theme1.xml", THEME_XML)?;

        let slide_rels = rels_xml(&[("rId1", REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml")]);
        for (index, slide) in self.slides.iter().enumerate() {
            let number = index + 1;
            part(
                &format!("ppt/slides/slide{number}.xml"),
                &slide_xml(slide, self.metadata.layout),
            )?;
            part(&format!("ppt/slides/_rels/slide{number}.xml.rels"), &slide_rels)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    fn content_types_xml(&self) -> String {
        let mut xml = String::with_capacity(2048);
        xml.push_str(XML_HEADER);
        xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
        xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
        xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
        xml.push_str(r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#);
        xml.push_str(r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>"#);
        xml.push_str(r#"<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#);
        xml.push_str(r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#);
        xml.push_str(r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#);
        xml.push_str(r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#);
        for number in 1..=self.slides.len() {
            let _ = write!(
                xml,
                r#"<Override PartName="/ppt/slides/slide{number}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
            );
        }
        xml.push_str("</Types>");
        xml
    }

    fn core_xml(&self) -> String {
        let meta = &self.metadata;
        let mut xml = String::with_capacity(1024);
        xml.push_str(XML_HEADER);
        xml.push_str(r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#);
        let _ = write!(xml, "<dc:title>{}</dc:title>", escape(meta.title.as_str()));
        if let Some(subject) = &meta.subject {
            let _ = write!(xml, "<dc:subject>{}</dc:subject>", escape(subject.as_str()));
        }
        let _ = write!(
            xml,
            "<dc:creator>{0}</dc:creator><cp:lastModifiedBy>{0}</cp:lastModifiedBy>",
            escape(meta.author.as_str())
        );
        xml.push_str("<cp:revision>1</cp:revision></cp:coreProperties>");
        xml
    }

    fn app_xml(&self) -> String {
        format!(
            r#"{XML_HEADER}<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes"><Application>{}</Application><Slides>{}</Slides></Properties>"#,
            env!("CARGO_PKG_NAME"),
            self.slides.len()
        )
    }

    fn presentation_xml(&self) -> String {
        let (cx, cy) = self.metadata.layout.dimensions();
        let mut xml = String::with_capacity(1024);
        xml.push_str(XML_HEADER);
        let _ = write!(xml, r#"<p:presentation {NS_PRESENTATION} saveSubsetFonts="1">"#);
        xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
        if !self.slides.is_empty() {
            xml.push_str("<p:sldIdLst>");
            for index in 0..self.slides.len() {
                let _ = write!(
                    xml,
                    r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                    FIRST_SLIDE_ID + index,
                    index + 3
                );
            }
            xml.push_str("</p:sldIdLst>");
        }
        let _ = write!(xml, r#"<p:sldSz cx="{cx}" cy="{cy}"/>"#);
        xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
        xml.push_str("</p:presentation>");
        xml
    }

    // rId1 and rId2 are fixed; slides follow from rId3 in deck order.
    fn presentation_rels_xml(&self) -> String {
        let slide_targets: Vec<(String, String)> = (1..=self.slides.len())
            .map(|number| (format!("rId{}", number + 2), format!("slides/slide{number}.xml")))
            .collect();
        let mut rels = vec![
            ("rId1", REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml"),
            ("rId2", REL_THEME, "theme/theme1.xml"),
        ];
        rels.extend(
            slide_targets
                .iter()
                .map(|(id, target)| (id.as_str(), REL_SLIDE, target.as_str())),
        );
        rels_xml(&rels)
    }
}

#[async_trait]
impl PresentationBuilder for PptxDeckBuilder {
    fn set_metadata(&mut self, metadata: &DeckMetadata) {
        self.metadata = metadata.clone();
    }

    fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    fn slide_count(&self) -> usize {
        self.slides.len()
    }

    async fn serialize(&mut self, output_path: &Path) -> Result<(), BuildError> {
        if self.serialized {
            return Err(BuildError::AlreadySerialized);
        }
        let bytes = self.to_bytes()?;
        debug!(
            bytes = bytes.len(),
            slides = self.slides.len(),
            layout = self.metadata.layout.name(),
            "Rendered presentation package"
        );

        let output = output_path.to_path_buf();
        tokio::task::spawn_blocking(move || write_atomically(&output, &bytes))
            .await
            .map_err(|e| BuildError::Io(std::io::Error::other(e)))??;

        self.serialized = true;
        info!(output = %output_path.display(), slides = self.slides.len(), "Presentation written");
        Ok(())
    }
}

/// Writes to a temporary file next to `output` and renames it over `output`,
/// so readers never observe a partially written package.
fn write_atomically(output: &Path, bytes: &[u8]) -> Result<(), BuildError> {
    let dir: PathBuf = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(output).map_err(|e| BuildError::Persist {
        path: output.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

fn rels_xml(rels: &[(&str, &str, &str)]) -> String {
    let mut xml = String::with_capacity(256 + rels.len() * 160);
    xml.push_str(XML_HEADER);
    xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
    for (id, kind, target) in rels {
        let _ = write!(
            xml,
            r#"<Relationship Id="{id}" Type="{kind}" Target="{target}"/>"#
        );
    }
    xml.push_str("</Relationships>");
    xml
}

fn group_shape_header(xml: &mut String) {
    xml.push_str(r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#);
    xml.push_str(r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#);
}

fn slide_master_xml() -> String {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_HEADER);
    let _ = write!(xml, "<p:sldMaster {NS_PRESENTATION}>");
    xml.push_str(r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>"#);
    group_shape_header(&mut xml);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str(r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#);
    xml.push_str(r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#);
    xml.push_str("</p:sldMaster>");
    xml
}

fn slide_layout_xml() -> String {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_HEADER);
    let _ = write!(xml, r#"<p:sldLayout {NS_PRESENTATION} type="blank" preserve="1">"#);
    xml.push_str(r#"<p:cSld name="Blank"><p:spTree>"#);
    group_shape_header(&mut xml);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>");
    xml
}

fn text_box(xml: &mut String, id: u32, name: &str, (x, y, cx, cy): (u64, u64, u64, u64)) {
    let _ = write!(
        xml,
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr><p:txBody><a:bodyPr wrap="square" rtlCol="0"><a:normAutofit/></a:bodyPr><a:lstStyle/>"#
    );
}

fn run(xml: &mut String, text: &str, size: u32, bold: bool) {
    let bold = if bold { r#" b="1""# } else { "" };
    let _ = write!(
        xml,
        r#"<a:r><a:rPr lang="en-US" sz="{size}"{bold} dirty="0"/><a:t>{}</a:t></a:r>"#,
        escape(text)
    );
}

fn slide_xml(slide: &Slide, layout: Layout) -> String {
    let (width, height) = layout.dimensions();
    let inner_width = width.saturating_sub(2 * MARGIN);
    let body_top = MARGIN + TITLE_HEIGHT;
    let body_height = height.saturating_sub(body_top + MARGIN);

    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_HEADER);
    let _ = write!(xml, "<p:sld {NS_PRESENTATION}>");
    xml.push_str("<p:cSld><p:spTree>");
    group_shape_header(&mut xml);

    let mut next_id = 2;
    if let Some(title) = &slide.title {
        text_box(&mut xml, next_id, "Title", (MARGIN, MARGIN, inner_width, TITLE_HEIGHT));
        xml.push_str("<a:p>");
        run(&mut xml, title, 3200, true);
        xml.push_str("</a:p></p:txBody></p:sp>");
        next_id += 1;
    }

    if !slide.paragraphs.is_empty() {
        text_box(&mut xml, next_id, "Body", (MARGIN, body_top, inner_width, body_height));
        for paragraph in &slide.paragraphs {
            xml.push_str("<a:p>");
            match paragraph.kind {
                ParagraphKind::Heading => run(&mut xml, &paragraph.text, 2000, true),
                ParagraphKind::Body => run(&mut xml, &paragraph.text, 1600, false),
                ParagraphKind::Bullet => {
                    xml.push_str(r#"<a:pPr marL="285750" indent="-285750"><a:buFont typeface="Arial"/><a:buChar char="&#8226;"/></a:pPr>"#);
                    run(&mut xml, &paragraph.text, 1600, false);
                }
            }
            xml.push_str("</a:p>");
        }
        xml.push_str("</p:txBody></p:sp>");
    }

    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>");
    xml
}

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/></Relationships>"#;

const THEME_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements>"#,
    r#"<a:clrScheme name="Office">"#,
    r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#,
    r#"<a:dk2><a:srgbClr val="44546A"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2>"#,
    r#"<a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2>"#,
    r#"<a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4>"#,
    r#"<a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6>"#,
    r#"<a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink>"#,
    r#"</a:clrScheme>"#,
    r#"<a:fontScheme name="Office"><a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
    r#"<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme>"#,
    r#"<a:fmtScheme name="Office">"#,
    r#"<a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst>"#,
    r#"<a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst>"#,
    r#"<a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst>"#,
    r#"<a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst>"#,
    r#"</a:fmtScheme></a:themeElements></a:theme>"#,
);
