//! PPTX slide extractor implementation.

use deckcheck_core::{Error, Result, RunWorkspace, SlideExtractor, SlideRecord};
use image::ImageFormat;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

const PRESENTATION_PATH: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PATH: &str = "ppt/_rels/presentation.xml.rels";

/// Extractor for PPTX (Office Open XML) files.
pub struct PptxExtractor;

impl PptxExtractor {
    /// Create a new PPTX extractor.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PPTX file from a reader, writing pictures into `workspace`.
    pub fn parse<R: Read + Seek>(
        &self,
        reader: R,
        workspace: &RunWorkspace,
    ) -> Result<Vec<SlideRecord>> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ParseError(format!("Not a PPTX (ZIP) container: {}", e)))?;

        let slide_order = self.get_slide_order(&mut archive)?;
        log::debug!("Found {} slides", slide_order.len());

        let mut slides = Vec::with_capacity(slide_order.len());
        for (idx, slide_path) in slide_order.iter().enumerate() {
            slides.push(self.parse_slide(&mut archive, slide_path, idx + 1, workspace)?);
        }

        Ok(slides)
    }

    /// Get the ordered list of slide part paths.
    ///
    /// The slide id list in presentation.xml defines the order. Decks without
    /// one fall back to the numbering of the slide relationships.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels = self
            .read_relationships(archive, PRESENTATION_RELS_PATH)
            .map_err(|e| Error::ParseError(e.to_string()))?;
        let presentation = self
            .read_file_from_archive(archive, PRESENTATION_PATH)
            .map_err(|e| Error::ParseError(e.to_string()))?;
        let slide_ids = parse_slide_id_list(&presentation)?;

        if !slide_ids.is_empty() {
            let mut paths = Vec::with_capacity(slide_ids.len());
            for rel_id in &slide_ids {
                match rels.get(rel_id) {
                    Some(rel) if rel.is_slide() => paths.push(resolve_part_path("ppt", &rel.target)),
                    _ => log::warn!("Slide relationship '{}' not found, skipping", rel_id),
                }
            }
            return Ok(paths);
        }

        let mut slides: Vec<(String, Option<usize>)> = rels
            .values()
            .filter(|rel| rel.is_slide())
            .map(|rel| {
                let order = extract_slide_number(&rel.target).or_else(|| extract_slide_number(&rel.id));
                (resolve_part_path("ppt", &rel.target), order)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse a single slide from the archive.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        slide_number: usize,
        workspace: &RunWorkspace,
    ) -> Result<SlideRecord> {
        let content = self.read_file_from_archive(archive, slide_path)?;
        let shapes = extract_shapes_from_xml(&content)?;
        let mut slide = SlideRecord::new(slide_number);

        let has_pictures = shapes.iter().any(|s| matches!(s, ShapeContent::Picture(_)));
        let rels = if has_pictures {
            self.read_relationships(archive, &slide_rels_path(slide_path))
                .unwrap_or_else(|e| {
                    log::warn!("Slide {} has pictures but no relationships: {}", slide_number, e);
                    HashMap::new()
                })
        } else {
            HashMap::new()
        };

        for shape in shapes {
            match shape {
                ShapeContent::Text(text) => slide.add_text(&text),
                ShapeContent::Picture(rel_id) => {
                    let Some(rel) = rels.get(&rel_id) else {
                        log::warn!("Slide {}: picture relationship '{}' not found", slide_number, rel_id);
                        continue;
                    };
                    let media_path = resolve_part_path(part_dir(slide_path), &rel.target);
                    let bytes = match self.read_bytes_from_archive(archive, &media_path) {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            log::warn!("Slide {}: {}", slide_number, e);
                            continue;
                        }
                    };

                    let image_path = workspace.image_path(slide_number, slide.images.len());
                    if save_picture(&bytes, &image_path)? {
                        slide.add_image(image_path);
                    }
                }
            }
        }

        Ok(slide)
    }

    /// Read a relationships part into a map keyed by relationship id.
    fn read_relationships<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<HashMap<String, Relationship>> {
        let content = self.read_file_from_archive(archive, path)?;
        let mut reader = Reader::from_str(&content);
        let mut rels = HashMap::new();

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if local_name(e.name().as_ref()) == b"Relationship" =>
                {
                    let mut rel = Relationship::default();
                    for attr in e.attributes().flatten() {
                        let value = String::from_utf8_lossy(&attr.value).to_string();
                        match attr.key.as_ref() {
                            b"Id" => rel.id = value,
                            b"Type" => rel.rel_type = value,
                            b"Target" => rel.target = value,
                            _ => {}
                        }
                    }
                    rels.insert(rel.id.clone(), rel);
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing relationships '{}': {}",
                        path, e
                    )));
                }
                _ => {}
            }
        }

        Ok(rels)
    }

    /// Read a text file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }

    /// Read a binary file from the ZIP archive.
    fn read_bytes_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<Vec<u8>> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(bytes)
    }
}

impl Default for PptxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SlideExtractor for PptxExtractor {
    fn extract(&self, path: &Path, workspace: &RunWorkspace) -> Result<Vec<SlideRecord>> {
        let file = File::open(path)?;
        self.parse(BufReader::new(file), workspace)
    }
}

/// One entry of a relationships part.
#[derive(Debug, Default)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

impl Relationship {
    fn is_slide(&self) -> bool {
        self.rel_type.ends_with("/slide")
    }
}

/// Content of a shape, in slide order.
#[derive(Debug, PartialEq)]
enum ShapeContent {
    /// Trimmed, non-empty text frame content. Paragraphs are separated by
    /// newlines.
    Text(String),
    /// Relationship id of an embedded picture.
    Picture(String),
}

/// Collect text frames and embedded pictures from the top level of a slide's
/// shape tree.
///
/// Group shapes are not descended into. Of an `mc:AlternateContent` block
/// only the `mc:Choice` branch is read, since `mc:Fallback` repeats it.
fn extract_shapes_from_xml(xml_content: &str) -> Result<Vec<ShapeContent>> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml_content);

    let mut in_text_shape = false;
    let mut in_picture = false;
    let mut in_text_body = false;
    let mut in_text_run = false;
    let mut paragraphs = 0usize;
    let mut current_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"grpSp" | b"Fallback" => {
                    reader.read_to_end(e.name()).map_err(slide_xml_error)?;
                }
                b"sp" => {
                    in_text_shape = true;
                    paragraphs = 0;
                    current_text.clear();
                }
                b"pic" => in_picture = true,
                b"txBody" if in_text_shape => in_text_body = true,
                b"p" if in_text_body => start_paragraph(&mut current_text, &mut paragraphs),
                b"t" if in_text_body => in_text_run = true,
                b"blip" if in_picture => {
                    if let Some(rel_id) = embed_id(e) {
                        shapes.push(ShapeContent::Picture(rel_id));
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"p" if in_text_body => start_paragraph(&mut current_text, &mut paragraphs),
                b"br" if in_text_body => current_text.push('\n'),
                b"blip" if in_picture => {
                    if let Some(rel_id) = embed_id(e) {
                        shapes.push(ShapeContent::Picture(rel_id));
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text_run => {
                let text = e.unescape().unwrap_or_default();
                current_text.push_str(&text);
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    let text = current_text.trim();
                    if in_text_shape && !text.is_empty() {
                        shapes.push(ShapeContent::Text(text.to_string()));
                    }
                    current_text.clear();
                    in_text_shape = false;
                    in_text_body = false;
                    in_text_run = false;
                }
                b"pic" => in_picture = false,
                b"txBody" => in_text_body = false,
                b"t" => in_text_run = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(slide_xml_error(e)),
            _ => {}
        }
    }

    Ok(shapes)
}

fn slide_xml_error(e: quick_xml::Error) -> Error {
    Error::ParseError(format!("Error parsing slide XML: {}", e))
}

fn start_paragraph(text: &mut String, paragraphs: &mut usize) {
    if *paragraphs > 0 {
        text.push('\n');
    }
    *paragraphs += 1;
}

/// The `r:embed` relationship id of a `a:blip` element.
fn embed_id(element: &BytesStart) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| local_name(attr.key.as_ref()) == b"embed")
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Decode picture bytes and write them as PNG.
///
/// Returns `false` when the bytes are not a decodable raster image (e.g.
/// EMF/WMF vector pictures); such pictures are skipped.
fn save_picture(bytes: &[u8], path: &Path) -> Result<bool> {
    match image::load_from_memory(bytes) {
        Ok(picture) => {
            picture
                .save_with_format(path, ImageFormat::Png)
                .map_err(|e| Error::ImageError(format!("Failed to write {}: {}", path.display(), e)))?;
            Ok(true)
        }
        Err(e) => {
            log::warn!("Skipping undecodable picture {}: {}", path.display(), e);
            Ok(false)
        }
    }
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slides/slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

/// Collect the `r:id` values of `p:sldId` entries, in document order.
fn parse_slide_id_list(xml_content: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml_content);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                let rel_id = e
                    .attributes()
                    .flatten()
                    .find(|attr| {
                        let key = attr.key.as_ref();
                        key.contains(&b':') && local_name(key) == b"id"
                    })
                    .map(|attr| String::from_utf8_lossy(&attr.value).to_string());
                if let Some(rel_id) = rel_id {
                    ids.push(rel_id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::ParseError(format!(
                    "Error parsing presentation.xml: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Directory of a part, e.g. "ppt/slides" for "ppt/slides/slide1.xml".
fn part_dir(part_path: &str) -> &str {
    part_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Relationships part of a slide, e.g. "ppt/slides/_rels/slide1.xml.rels".
fn slide_rels_path(slide_path: &str) -> String {
    match slide_path.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", slide_path),
    }
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_part_path(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckcheck_core::RunId;
    use image::GenericImageView;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
    const SLIDE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    const IMAGE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

    struct TestSlide {
        shapes: String,
        image: Option<Vec<u8>>,
    }

    impl TestSlide {
        fn new(shapes: &[String]) -> Self {
            Self {
                shapes: shapes.concat(),
                image: None,
            }
        }

        fn with_image(mut self, bytes: Vec<u8>) -> Self {
            self.image = Some(bytes);
            self
        }
    }

    fn text_shape(paragraphs: &[&str]) -> String {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", p))
            .collect();
        format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="TextBox 1"/></p:nvSpPr><p:txBody><a:bodyPr/>{}</p:txBody></p:sp>"#,
            body
        )
    }

    fn picture_shape(rel_id: &str) -> String {
        format!(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="4" name="Picture 3"/></p:nvPicPr><p:blipFill><a:blip r:embed="{}"/></p:blipFill></p:pic>"#,
            rel_id
        )
    }

    fn png_bytes() -> Vec<u8> {
        let picture = image::RgbImage::from_pixel(2, 2, image::Rgb([200, 30, 30]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(picture)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    /// Build a PPTX in memory. `order` lists slide indexes as they appear in
    /// the slide id list; `None` omits the list entirely.
    fn build_pptx(slides: &[TestSlide], order: Option<&[usize]>) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();

        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        rels.push_str(r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#);
        for idx in 0..slides.len() {
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{}" Target="slides/slide{}.xml"/>"#,
                idx + 2,
                SLIDE_REL,
                idx + 1
            ));
        }
        rels.push_str("</Relationships>");

        let id_list = order
            .map(|order| {
                let ids: String = order
                    .iter()
                    .enumerate()
                    .map(|(pos, idx)| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + pos, idx + 2))
                    .collect();
                format!("<p:sldIdLst>{}</p:sldIdLst>", ids)
            })
            .unwrap_or_default();
        let presentation = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation {}>{}</p:presentation>"#,
            NS, id_list
        );

        zip.start_file(PRESENTATION_PATH, options).unwrap();
        zip.write_all(presentation.as_bytes()).unwrap();
        zip.start_file(PRESENTATION_RELS_PATH, options).unwrap();
        zip.write_all(rels.as_bytes()).unwrap();

        for (idx, slide) in slides.iter().enumerate() {
            let n = idx + 1;
            let xml = format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld {}><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>"#,
                NS, slide.shapes
            );
            zip.start_file(format!("ppt/slides/slide{}.xml", n), options).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();

            if let Some(bytes) = &slide.image {
                let slide_rels = format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId2" Type="{}" Target="../media/image{}.png"/></Relationships>"#,
                    IMAGE_REL, n
                );
                zip.start_file(format!("ppt/slides/_rels/slide{}.xml.rels", n), options)
                    .unwrap();
                zip.write_all(slide_rels.as_bytes()).unwrap();
                zip.start_file(format!("ppt/media/image{}.png", n), options).unwrap();
                zip.write_all(bytes).unwrap();
            }
        }

        zip.finish().unwrap().into_inner()
    }

    fn workspace() -> (tempfile::TempDir, RunWorkspace) {
        let root = tempfile::tempdir().unwrap();
        let workspace = RunWorkspace::create(root.path(), RunId::new()).unwrap();
        (root, workspace)
    }

    #[test]
    fn test_text_per_shape_in_order() {
        let (_root, ws) = workspace();
        let deck = build_pptx(
            &[TestSlide::new(&[
                text_shape(&["Quarterly Review"]),
                text_shape(&["  Revenue: $5M", "Growth 3x faster"]),
                text_shape(&["   "]),
            ])],
            Some(&[0]),
        );

        let slides = PptxExtractor::new().parse(Cursor::new(deck), &ws).unwrap();

        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].slide_number, 1);
        assert_eq!(
            slides[0].text,
            vec!["Quarterly Review", "Revenue: $5M\nGrowth 3x faster"]
        );
        assert!(slides[0].images.is_empty());
    }

    #[test]
    fn test_runs_keep_spacing_and_entities() {
        let (_root, ws) = workspace();
        let shape = r#"<p:sp><p:txBody><a:p><a:r><a:t>R&amp;D spend </a:t></a:r><a:r><a:t>is $2M</a:t></a:r><a:br/><a:r><a:t>next line</a:t></a:r></a:p></p:txBody></p:sp>"#;
        let deck = build_pptx(&[TestSlide::new(&[shape.to_string()])], Some(&[0]));

        let slides = PptxExtractor::new().parse(Cursor::new(deck), &ws).unwrap();

        assert_eq!(slides[0].text, vec!["R&D spend is $2M\nnext line"]);
    }

    #[test]
    fn test_empty_slides_are_kept() {
        let (_root, ws) = workspace();
        let deck = build_pptx(
            &[
                TestSlide::new(&[text_shape(&["One"])]),
                TestSlide::new(&[]),
                TestSlide::new(&[text_shape(&["Three"])]),
            ],
            Some(&[0, 1, 2]),
        );

        let slides = PptxExtractor::new().parse(Cursor::new(deck), &ws).unwrap();

        let numbers: Vec<usize> = slides.iter().map(|s| s.slide_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(slides[1].is_empty());
        assert_eq!(slides[2].text, vec!["Three"]);
    }

    #[test]
    fn test_slide_id_list_defines_order() {
        let (_root, ws) = workspace();
        let deck = build_pptx(
            &[
                TestSlide::new(&[text_shape(&["stored first"])]),
                TestSlide::new(&[text_shape(&["stored second"])]),
            ],
            Some(&[1, 0]),
        );

        let slides = PptxExtractor::new().parse(Cursor::new(deck), &ws).unwrap();

        assert_eq!(slides[0].slide_number, 1);
        assert_eq!(slides[0].text, vec!["stored second"]);
        assert_eq!(slides[1].text, vec!["stored first"]);
    }

    #[test]
    fn test_fallback_order_without_slide_id_list() {
        let (_root, ws) = workspace();
        let slides: Vec<TestSlide> = (1..=11)
            .map(|n| TestSlide::new(&[text_shape(&[format!("slide {}", n).as_str()])]))
            .collect();
        let deck = build_pptx(&slides, None);

        let slides = PptxExtractor::new().parse(Cursor::new(deck), &ws).unwrap();

        assert_eq!(slides.len(), 11);
        assert_eq!(slides[1].text, vec!["slide 2"]);
        assert_eq!(slides[10].text, vec!["slide 11"]);
    }

    #[test]
    fn test_pictures_written_to_workspace() {
        let (_root, ws) = workspace();
        let deck = build_pptx(
            &[
                TestSlide::new(&[text_shape(&["Intro"])]),
                TestSlide::new(&[text_shape(&["Chart"]), picture_shape("rId2")])
                    .with_image(png_bytes()),
            ],
            Some(&[0, 1]),
        );

        let slides = PptxExtractor::new().parse(Cursor::new(deck), &ws).unwrap();

        assert!(slides[0].images.is_empty());
        assert_eq!(slides[1].images, vec![ws.image_path(2, 0)]);
        assert!(slides[1].images[0].starts_with(ws.path()));
        let written = image::open(&slides[1].images[0]).unwrap();
        assert_eq!(written.dimensions(), (2, 2));
    }

    #[test]
    fn test_extract_from_upload_path_with_pictures() {
        let (_root, ws) = workspace();
        let deck = build_pptx(
            &[
                TestSlide::new(&[text_shape(&["Chart"]), picture_shape("rId2")])
                    .with_image(png_bytes()),
                TestSlide::new(&[text_shape(&["Summary"])]),
            ],
            Some(&[0, 1]),
        );
        let path = ws.upload_path();
        std::fs::write(&path, deck).unwrap();

        let slides = PptxExtractor::new().extract(&path, &ws).unwrap();

        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].images, vec![ws.image_path(1, 0)]);
        assert_eq!(slides[1].text, vec!["Summary"]);
        assert!(path.exists());
    }

    #[test]
    fn test_undecodable_picture_skipped() {
        let (_root, ws) = workspace();
        let deck = build_pptx(
            &[TestSlide::new(&[text_shape(&["Logo"]), picture_shape("rId2")])
                .with_image(b"not an image".to_vec())],
            Some(&[0]),
        );

        let slides = PptxExtractor::new().parse(Cursor::new(deck), &ws).unwrap();

        assert_eq!(slides[0].text, vec!["Logo"]);
        assert!(slides[0].images.is_empty());
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let (_root, ws) = workspace();
        let path = ws.upload_path();
        std::fs::write(&path, b"plain text, not a presentation").unwrap();

        let err = PptxExtractor::new().extract(&path, &ws).unwrap_err();

        assert!(matches!(err, Error::ParseError(_)));
    }

    #[test]
    fn test_zip_without_presentation_is_parse_error() {
        let (_root, ws) = workspace();
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("hello.txt", FileOptions::default()).unwrap();
        zip.write_all(b"hi").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let err = PptxExtractor::new().parse(Cursor::new(bytes), &ws).unwrap_err();

        assert!(matches!(err, Error::ParseError(_)));
    }

    #[test]
    fn test_extract_shapes_from_xml() {
        let xml = format!(
            "<p:sld {}><p:cSld><p:spTree>{}{}</p:spTree></p:cSld></p:sld>",
            NS,
            picture_shape("rId7"),
            text_shape(&["Title"])
        );
        assert_eq!(
            extract_shapes_from_xml(&xml).unwrap(),
            vec![
                ShapeContent::Picture("rId7".to_string()),
                ShapeContent::Text("Title".to_string()),
            ]
        );
    }

    #[test]
    fn test_alternate_content_read_once() {
        let xml = format!(
            r#"<p:sld {} xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006"><p:cSld><p:spTree><mc:AlternateContent><mc:Choice Requires="p14">{}</mc:Choice><mc:Fallback>{}</mc:Fallback></mc:AlternateContent></p:spTree></p:cSld></p:sld>"#,
            NS,
            text_shape(&["Revenue $5M"]),
            text_shape(&["Revenue $5M"])
        );

        assert_eq!(
            extract_shapes_from_xml(&xml).unwrap(),
            vec![ShapeContent::Text("Revenue $5M".to_string())]
        );
    }

    #[test]
    fn test_group_shapes_skipped() {
        let group = format!(
            r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="5" name="Group 4"/></p:nvGrpSpPr>{}{}</p:grpSp>"#,
            text_shape(&["Inside group"]),
            picture_shape("rId9")
        );
        let xml = format!(
            "<p:sld {}><p:cSld><p:spTree>{}{}{}</p:spTree></p:cSld></p:sld>",
            NS,
            text_shape(&["Before"]),
            group,
            text_shape(&["After"])
        );

        assert_eq!(
            extract_shapes_from_xml(&xml).unwrap(),
            vec![
                ShapeContent::Text("Before".to_string()),
                ShapeContent::Text("After".to_string()),
            ]
        );
    }

    #[test]
    fn test_malformed_slide_xml_is_parse_error() {
        let xml = format!(
            "<p:sld {}><p:cSld><p:spTree>{}<p:sp><p:txBody></p:sp></p:spTree></p:cSld></p:sld>",
            NS,
            text_shape(&["Kept?"])
        );
        assert!(matches!(extract_shapes_from_xml(&xml), Err(Error::ParseError(_))));

        let (_root, ws) = workspace();
        let broken = "<p:sp><p:txBody></p:sp>".to_string();
        let deck = build_pptx(
            &[TestSlide::new(&[text_shape(&["Fine"])]), TestSlide::new(&[broken])],
            Some(&[0, 1]),
        );

        let err = PptxExtractor::new().parse(Cursor::new(deck), &ws).unwrap_err();

        assert!(matches!(err, Error::ParseError(_)));
    }

    #[test]
    fn test_resolve_part_path() {
        assert_eq!(resolve_part_path("ppt/slides", "../media/image1.png"), "ppt/media/image1.png");
        assert_eq!(resolve_part_path("ppt", "slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(resolve_part_path("ppt", "/ppt/slides/slide2.xml"), "ppt/slides/slide2.xml");
        assert_eq!(resolve_part_path("ppt/slides", "./slide3.xml"), "ppt/slides/slide3.xml");
    }

    #[test]
    fn test_slide_rels_path() {
        assert_eq!(slide_rels_path("ppt/slides/slide1.xml"), "ppt/slides/_rels/slide1.xml.rels");
        assert_eq!(part_dir("ppt/slides/slide1.xml"), "ppt/slides");
    }

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slides/slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }
}
