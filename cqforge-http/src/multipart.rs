//! `multipart/form-data` encoding for the content write API.

use uuid::Uuid;

/// Field telling the write API how to decode every other part.
pub const CHARSET_FIELD: (&str, &str) = ("_charset_", "utf-8");

/// An encoded multipart body and the boundary that delimits it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    pub boundary: String,
    pub bytes: Vec<u8>,
}

impl MultipartBody {
    /// Encode `fields` with a freshly generated boundary.
    pub fn encode(fields: &[(String, String)]) -> Self {
        let boundary = format!("----cqforge{}", Uuid::new_v4().simple());
        let bytes = encode_with_boundary(fields, &boundary);
        Self { boundary, bytes }
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

/// Encode `fields` as RFC 7578 form parts separated by `boundary`.
///
/// Repeated names produce repeated parts, in order. Values are UTF-8 and a
/// trailing `_charset_=utf-8` part says so; without it the servlet decodes
/// them as ISO-8859-1.
pub fn encode_with_boundary(fields: &[(String, String)], boundary: &str) -> Vec<u8> {
    let mut out = Vec::new();
    let (charset_name, charset) = CHARSET_FIELD;
    let parts = fields
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .chain(std::iter::once((charset_name, charset)));
    for (name, value) in parts {
        out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        out.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                escape_name(name)
            )
            .as_bytes(),
        );
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    out
}

fn escape_name(name: &str) -> String {
    name.replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn encodes_parts_in_order() {
        let body = encode_with_boundary(&fields(&[("title", "World"), ("subtitle@Delete", "")]), "XYZ");
        let text = String::from_utf8(body).unwrap();
        assert_eq!(
            text,
            "--XYZ\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nWorld\r\n\
             --XYZ\r\nContent-Disposition: form-data; name=\"subtitle@Delete\"\r\n\r\n\r\n\
             --XYZ\r\nContent-Disposition: form-data; name=\"_charset_\"\r\n\r\nutf-8\r\n\
             --XYZ--\r\n"
        );
    }

    #[test]
    fn empty_form_still_declares_its_charset() {
        let body = encode_with_boundary(&[], "B");
        assert_eq!(
            String::from_utf8(body).unwrap(),
            "--B\r\nContent-Disposition: form-data; name=\"_charset_\"\r\n\r\nutf-8\r\n--B--\r\n"
        );
    }

    #[test]
    fn non_ascii_values_are_sent_as_utf8() {
        let body = encode_with_boundary(&fields(&[("title", "Grüße")]), "B");
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("name=\"title\"\r\n\r\nGrüße\r\n"));
        assert!(text.contains("name=\"_charset_\"\r\n\r\nutf-8\r\n"));
    }

    #[test]
    fn quotes_in_names_are_escaped() {
        let body = encode_with_boundary(&fields(&[("a\"b", "v")]), "B");
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("name=\"a%22b\""));
    }

    #[test]
    fn generated_boundary_appears_in_content_type() {
        let body = MultipartBody::encode(&fields(&[("k", "v")]));
        assert!(body.content_type().ends_with(&body.boundary));
        let text = String::from_utf8(body.bytes.clone()).unwrap();
        assert!(text.starts_with(&format!("--{}\r\n", body.boundary)));
    }
}
