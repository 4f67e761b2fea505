use quick_xml::events::Event;
use quick_xml::Reader;
use url::Url;

use crate::util::time::parse_timestamp;

use super::error::FetchError;
use super::types::{LoadStats, LoadedSitemap, SitemapEntry};

#[derive(Copy, Clone)]
enum Field { Loc, LastMod }

/// Parse a `<urlset>` document. Records with an unusable `<loc>` or
/// `<lastmod>` are counted in [`LoadStats`] and left out.
pub fn parse_urlset(xml: &[u8]) -> Result<LoadedSitemap, FetchError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut out = LoadedSitemap::default();
    let mut root_seen = false;
    // urlset = 1, url = 2, loc/lastmod = 3; extension children such as
    // <image:loc> sit deeper and are ignored
    let mut depth = 0usize;
    let mut in_url = false;
    let mut field: Option<Field> = None;
    let mut loc = String::new();
    let mut lastmod: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if !root_seen {
                    root_seen = true;
                    match name.as_ref() {
                        b"urlset" => {}
                        b"sitemapindex" => return Err(FetchError::SitemapIndex),
                        other => return Err(FetchError::NotASitemap(String::from_utf8_lossy(other).into_owned())),
                    }
                }
                depth += 1;
                match name.as_ref() {
                    b"url" if depth == 2 => { in_url = true; loc.clear(); lastmod = None; }
                    b"loc" if in_url && depth == 3 => field = Some(Field::Loc),
                    b"lastmod" if in_url && depth == 3 => field = Some(Field::LastMod),
                    _ => field = None,
                }
            }
            Ok(Event::Empty(e)) if !root_seen => {
                // `<urlset/>` is a valid, empty sitemap
                root_seen = true;
                match e.local_name().as_ref() {
                    b"urlset" => {}
                    b"sitemapindex" => return Err(FetchError::SitemapIndex),
                    other => return Err(FetchError::NotASitemap(String::from_utf8_lossy(other).into_owned())),
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(f) = field {
                    let text = e.unescape().map_err(|err| FetchError::Xml(err.to_string()))?;
                    push_text(f, &text, &mut loc, &mut lastmod);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(f) = field {
                    let raw = e.into_inner();
                    push_text(f, &String::from_utf8_lossy(&raw), &mut loc, &mut lastmod);
                }
            }
            Ok(Event::End(e)) => {
                if in_url && depth == 2 && e.local_name().as_ref() == b"url" {
                    in_url = false;
                    finish_entry(&loc, lastmod.as_deref(), &mut out);
                }
                field = None;
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(FetchError::Xml(format!("at position {}: {err}", reader.buffer_position())));
            }
            _ => {}
        }
        buf.clear();
    }

    if !root_seen {
        return Err(FetchError::Xml("document has no root element".to_string()));
    }
    out.stats.entries = out.entries.len();
    Ok(out)
}

fn push_text(field: Field, text: &str, loc: &mut String, lastmod: &mut Option<String>) {
    match field {
        Field::Loc => loc.push_str(text),
        Field::LastMod => lastmod.get_or_insert_with(String::new).push_str(text),
    }
}

fn finish_entry(loc: &str, lastmod: Option<&str>, out: &mut LoadedSitemap) {
    let url = loc.trim();
    if url.is_empty() || Url::parse(url).is_err() {
        out.stats.bad_loc += 1;
        return;
    }
    let Some(raw) = lastmod.map(str::trim).filter(|s| !s.is_empty()) else {
        out.stats.missing_lastmod += 1;
        return;
    };
    match parse_timestamp(raw) {
        Some(last_modified) => out.entries.push(SitemapEntry { url: url.to_string(), last_modified }),
        None => out.stats.bad_lastmod += 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/a</loc><lastmod>2024-05-01</lastmod></url>
  <url>
    <loc> https://example.com/b?x=1&amp;y=2 </loc>
    <lastmod>2024-05-02T10:00:00+02:00</lastmod>
    <changefreq>daily</changefreq>
  </url>
  <url><loc>https://example.com/no-date</loc></url>
  <url><loc>https://example.com/bad-date</loc><lastmod>someday</lastmod></url>
  <url><loc>/relative</loc><lastmod>2024-05-01</lastmod></url>
  <url><loc><![CDATA[https://example.com/c]]></loc><lastmod>2024-05-03</lastmod></url>
</urlset>"#;

    #[test]
    fn parses_entries_in_document_order() {
        let got = parse_urlset(SAMPLE.as_bytes()).unwrap();
        let urls: Vec<&str> = got.entries.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b?x=1&y=2", "https://example.com/c"]);
        assert_eq!(got.entries[1].last_modified.to_string(), "2024-05-02 08:00:00");
    }

    #[test]
    fn counts_skipped_records() {
        let got = parse_urlset(SAMPLE.as_bytes()).unwrap();
        assert_eq!(got.stats, LoadStats { entries: 3, bad_loc: 1, missing_lastmod: 1, bad_lastmod: 1 });
        assert_eq!(got.stats.skipped(), 3);
    }

    #[test]
    fn rejects_sitemap_index() {
        let xml = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
            <sitemap><loc>https://example.com/s1.xml</loc></sitemap></sitemapindex>"#;
        assert!(matches!(parse_urlset(xml.as_bytes()), Err(FetchError::SitemapIndex)));
    }

    #[test]
    fn rejects_other_documents() {
        let html = "<html><body><p>not found</p></body></html>";
        match parse_urlset(html.as_bytes()) {
            Err(FetchError::NotASitemap(root)) => assert_eq!(root, "html"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(parse_urlset(b""), Err(FetchError::Xml(_))));
    }

    #[test]
    fn extension_children_do_not_leak_into_loc() {
        let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
                xmlns:image="http://www.google.com/schemas/sitemap-image/1.1"
                xmlns:video="http://www.google.com/schemas/sitemap-video/1.1">
            <url>
                <loc>https://example.com/page</loc>
                <lastmod>2024-05-01</lastmod>
                <image:image><image:loc>https://example.com/img.jpg</image:loc></image:image>
                <video:video><video:loc>https://example.com/clip.mp4</video:loc><video:lastmod>2020-01-01</video:lastmod></video:video>
            </url>
            <url><image:image><image:loc>https://example.com/orphan.jpg</image:loc></image:image><loc>https://example.com/second</loc><lastmod>2024-05-02</lastmod></url>
        </urlset>"#;
        let got = parse_urlset(xml.as_bytes()).unwrap();
        let urls: Vec<&str> = got.entries.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/page", "https://example.com/second"]);
        assert_eq!(got.entries[0].last_modified.to_string(), "2024-05-01 00:00:00");
        assert_eq!(got.stats.skipped(), 0);
    }

    #[test]
    fn empty_urlset_is_fine() {
        let got = parse_urlset(b"<urlset></urlset>").unwrap();
        assert!(got.entries.is_empty());
        let got = parse_urlset(b"<urlset/>").unwrap();
        assert!(got.entries.is_empty());
    }
}
