use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;

/// 10 MB limit for avatar and campaign image uploads.
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// A drained multipart form: text fields by name plus the one file field.
#[derive(Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.trim())
    }
}

/// Read every part of `multipart`, keeping the first non-empty part named
/// `file_field` as the upload.
///
/// Other parts are drained. Only those without a file name that hold valid
/// UTF-8 are kept as text fields.
pub async fn read_upload(mut multipart: Multipart, file_field: &str) -> Result<UploadForm, MultipartError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == file_field && form.file.is_none() {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let bytes = field.bytes().await?;
            if !bytes.is_empty() {
                form.file = Some(UploadedFile { file_name, bytes });
            }
            continue;
        }

        let is_file = field.file_name().is_some();
        let bytes = field.bytes().await?;
        if is_file {
            continue;
        }
        if let Ok(value) = String::from_utf8(bytes.to_vec()) {
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

/// Checkbox style flag: `true`, `1` and `on` are set, anything else is not.
pub fn is_checked(value: Option<&str>) -> bool {
    matches!(value, Some("true" | "1" | "on"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{Request, header};

    const BOUNDARY: &str = "upload-test";

    fn part(name: &str, file_name: Option<&str>, bytes: &[u8]) -> Vec<u8> {
        let disposition = match file_name {
            Some(f) => format!("form-data; name=\"{}\"; filename=\"{}\"", name, f),
            None => format!("form-data; name=\"{}\"", name),
        };
        let mut out = format!("--{}\r\nContent-Disposition: {}\r\n\r\n", BOUNDARY, disposition).into_bytes();
        out.extend_from_slice(bytes);
        out.extend_from_slice(b"\r\n");
        out
    }

    async fn multipart(parts: &[Vec<u8>]) -> Multipart {
        let mut body = parts.concat();
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        let request = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    #[tokio::test]
    async fn binary_extra_parts_are_skipped() {
        let form = multipart(&[
            part("user_id", None, b"4"),
            part("blob", None, &[0xff, 0xfe, 0x00]),
            part("file", Some("a.png"), b"first"),
            part("file", Some("b.png"), &[0xc3, 0x28]),
            part("other", Some("c.bin"), &[0x80]),
        ])
        .await;

        let upload = read_upload(form, "file").await.unwrap();
        let file = upload.file.unwrap();
        assert_eq!(file.file_name, "a.png");
        assert_eq!(&file.bytes[..], b"first");
        assert_eq!(upload.fields.get("user_id").map(String::as_str), Some("4"));
        assert!(!upload.fields.contains_key("blob"));
        assert!(!upload.fields.contains_key("file"));
        assert!(!upload.fields.contains_key("other"));
    }

    #[test]
    fn checkbox_values() {
        assert!(is_checked(Some("true")));
        assert!(is_checked(Some("on")));
        assert!(!is_checked(Some("false")));
        assert!(!is_checked(None));
    }
}
