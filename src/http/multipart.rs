/// One part of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    /// `name="..."` from Content-Disposition.
    pub name: String,
    /// `filename="..."`; present only on file parts.
    pub filename: Option<String>,
    /// The part's own Content-Type header, if sent.
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Part {
    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }

    pub fn text(&self) -> Option<String> {
        String::from_utf8(self.data.clone()).ok()
    }
}

fn position(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len().max(1)).position(|w| w == needle)
}

/// `boundary` parameter of a multipart Content-Type, quotes stripped.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("boundary") {
            return None;
        }
        let value = value.trim().trim_matches('"');
        (!value.is_empty()).then(|| value.to_owned())
    })
}

/// Parses every part of a multipart body. Malformed parts are skipped.
pub fn parse_parts(body: &[u8], boundary: &str) -> Vec<Part> {
    const HEADER_END: &[u8] = b"\r\n\r\n";
    let delimiter = format!("--{}", boundary).into_bytes();
    let mut parts = Vec::new();

    let mut rest = body;
    while !rest.is_empty() {
        let (chunk, next) = match position(rest, &delimiter) {
            Some(at) => (&rest[..at], &rest[at + delimiter.len()..]),
            None => (rest, &[][..]),
        };
        rest = next;

        let Some(sep_pos) = position(chunk, HEADER_END) else {
            continue;
        };
        let headers = String::from_utf8_lossy(&chunk[..sep_pos]);
        let Some(name) = header_param(&headers, "name") else {
            continue;
        };

        let raw = &chunk[sep_pos + HEADER_END.len()..];
        let data = raw.strip_suffix(b"\r\n").unwrap_or(raw);
        parts.push(Part {
            name,
            filename: header_param(&headers, "filename"),
            content_type: part_content_type(&headers),
            data: data.to_vec(),
        });
    }
    parts
}

/// The file part named `field`, falling back to the first file part.
pub fn file_part<'a>(parts: &'a [Part], field: &str) -> Option<&'a Part> {
    parts
        .iter()
        .find(|p| p.is_file() && p.name == field)
        .or_else(|| parts.iter().find(|p| p.is_file()))
}

/// The value of the non-file field named `field`.
pub fn text_field(parts: &[Part], field: &str) -> Option<String> {
    parts
        .iter()
        .find(|p| !p.is_file() && p.name == field)
        .and_then(Part::text)
}

/// Reads `key="value"` from a Content-Disposition line.
///
/// Matches on a leading `; ` or line start so that `name` does not match
/// inside `filename`.
fn header_param(headers: &str, key: &str) -> Option<String> {
    let disposition = headers
        .lines()
        .find(|l| l.to_ascii_lowercase().starts_with("content-disposition"))?;
    disposition
        .split(';')
        .map(str::trim)
        .find_map(|kv| {
            let (k, v) = kv.split_once('=')?;
            if k.trim().eq_ignore_ascii_case(key) {
                Some(v.trim().trim_matches('"').to_owned())
            } else {
                None
            }
        })
}

fn part_content_type(headers: &str) -> Option<String> {
    headers.lines().find_map(|l| {
        let (k, v) = l.split_once(':')?;
        if k.trim().eq_ignore_ascii_case("content-type") {
            Some(v.trim().to_owned())
        } else {
            None
        }
    })
}
