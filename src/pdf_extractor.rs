//! PDF text extraction wrapper
//!
//! Wraps the pdf-extract crate. Each page's text is treated as a run of
//! fragments (its non-empty lines) joined by single spaces; pages are joined
//! by newlines and the whole result is trimmed.

/// Join per-page fragments into one document text
pub fn join_pages<P, F>(pages: P) -> String
where
    P: IntoIterator<Item = Vec<F>>,
    F: AsRef<str>,
{
    let mut full_text = String::new();
    for fragments in pages {
        let page = fragments
            .iter()
            .map(|f| f.as_ref())
            .collect::<Vec<_>>()
            .join(" ");
        full_text.push_str(&page);
        full_text.push('\n');
    }
    full_text.trim().to_string()
}

/// Split one page of extracted text into its fragments
fn page_fragments(page_text: &str) -> Vec<&str> {
    page_text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

/// Extract full text from PDF bytes
///
/// Returns error for encrypted or corrupted PDFs. Scanned (image-only)
/// PDFs extract as empty text.
pub fn extract_text_from_pdf(pdf_bytes: &[u8]) -> Result<String, String> {
    // pdf-extract panics on some malformed documents
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(pdf_bytes))
        .map_err(|_| "PDF extraction failed: malformed document".to_string())?
        .map_err(|e| format!("PDF extraction failed: {}", e))?;

    Ok(join_pages(pages.iter().map(|p| page_fragments(p))))
}

/// Minimal single-page PDFs for tests
#[cfg(test)]
pub(crate) mod fixtures {
    /// One page showing `text` in Helvetica, with a valid xref table
    pub(crate) fn single_page_pdf(text: &str) -> Vec<u8> {
        let content = format!("BT /F1 24 Tf 72 720 Td ({}) Tj ET", text);
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
                .to_string(),
            format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref_start = pdf.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            xref.push_str(&format!("{:010} 00000 n \n", offset));
        }
        pdf.extend_from_slice(xref.as_bytes());
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref_start
            )
            .as_bytes(),
        );
        pdf
    }
}
