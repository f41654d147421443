//! Collecting `multipart/form-data` submissions.
//!
//! Forms with an optional image upload are posted as multipart. The whole
//! submission is read up front into text fields and files so the same
//! validation code serves both encodings.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;

/// A file sent with a form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Every field of a multipart submission.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    fields: HashMap<String, Vec<String>>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    /// Read the whole submission.
    ///
    /// File inputs left empty arrive with no file name and no bytes; they
    /// are dropped.
    ///
    /// # Errors
    ///
    /// Returns the extractor error if the body is malformed.
    pub async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };

            match field.file_name().map(ToString::to_string) {
                Some(file_name) => {
                    let bytes = field.bytes().await?;
                    if !file_name.is_empty() && !bytes.is_empty() {
                        form.files.insert(name, UploadedFile { file_name, bytes });
                    }
                }
                None => {
                    let text = field.text().await?;
                    form.fields.entry(name).or_default().push(text);
                }
            }
        }

        Ok(form)
    }

    /// The first value of a text field, or `""`.
    #[must_use]
    pub fn text(&self, name: &str) -> &str {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map_or("", String::as_str)
    }

    /// Every value of a repeated field, such as a checkbox group.
    #[must_use]
    pub fn all(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Remove and return an uploaded file.
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    #[cfg(test)]
    pub(crate) fn with_fields(pairs: &[(&str, &str)]) -> Self {
        let mut form = Self::default();
        for (name, value) in pairs {
            form.fields
                .entry((*name).to_string())
                .or_default()
                .push((*value).to_string());
        }
        form
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        extract::FromRequest,
        http::{Request, header::CONTENT_TYPE},
    };

    use super::*;

    const BOUNDARY: &str = "XBOUNDARYX";

    fn body() -> String {
        [
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nMilk\r\n"),
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"suppliers\"\r\n\r\n1\r\n"),
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"suppliers\"\r\n\r\n3\r\n"),
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"milk.png\"\r\n\
                 Content-Type: image/png\r\n\r\nPNGDATA\r\n"
            ),
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"logo\"; filename=\"\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n\r\n"
            ),
            format!("--{BOUNDARY}--\r\n"),
        ]
        .concat()
    }

    async fn read_form() -> MultipartForm {
        let request = Request::builder()
            .method("POST")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body()))
            .unwrap();
        let multipart = Multipart::from_request(request, &()).await.unwrap();
        MultipartForm::read(multipart).await.unwrap()
    }

    #[tokio::test]
    async fn test_reads_text_and_repeated_fields() {
        let form = read_form().await;
        assert_eq!(form.text("title"), "Milk");
        assert_eq!(form.all("suppliers"), ["1", "3"]);
        assert_eq!(form.text("missing"), "");
    }

    #[tokio::test]
    async fn test_keeps_real_files_and_drops_empty_inputs() {
        let mut form = read_form().await;
        let image = form.take_file("image").unwrap();
        assert_eq!(image.file_name, "milk.png");
        assert_eq!(&image.bytes[..], b"PNGDATA");
        assert!(form.take_file("logo").is_none());
    }
}
