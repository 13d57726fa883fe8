/// Clause segmentation for uploaded policy documents.
///
/// The server receives page text already extracted from the PDF; it never
/// touches PDF binary content. Segmentation looks for explicit clause
/// headings first ("Clause 3.2:", "Section 4", "Article 2.1"), then bare
/// "n.n" numbering, and when a document has no recognizable structure it
/// falls back to overlapping word chunks so everything is still indexed.
use regex::Regex;

use crate::model::Clause;

pub struct ProcessedDocument {
    pub clauses: Vec<Clause>,
    pub total_pages: usize,
}

pub struct DocumentProcessor {
    chunk_size: usize,
    chunk_overlap: usize,
    heading_re: Regex,
    numbered_re: Regex,
}

impl DocumentProcessor {
    /// `chunk_size`/`chunk_overlap` are in words and only used by the
    /// unstructured fallback.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let heading_re =
            Regex::new(r"(?im)^\s*(?:clause|section|article)\s*(\d+(?:\.\d+)*)\s*[:.\-]?\s*")
                .expect("valid regex");
        let numbered_re = Regex::new(r"(?m)^\s*(\d+\.\d+)[:.\s]").expect("valid regex");

        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
            heading_re,
            numbered_re,
        }
    }

    /// Segment a document's pages into clause records.
    pub fn process(&self, pages: &[String]) -> ProcessedDocument {
        let full_text = pages
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        let clauses = self.detect_clauses(&full_text);

        ProcessedDocument {
            clauses,
            total_pages: pages.len(),
        }
    }

    fn detect_clauses(&self, text: &str) -> Vec<Clause> {
        let mut clauses = split_on_headings(&self.heading_re, text);
        if clauses.is_empty() {
            clauses = split_on_headings(&self.numbered_re, text);
        }
        if clauses.is_empty() {
            clauses = self.chunk_fallback(text);
        }
        clauses
    }

    /// Overlapping word windows for documents without clause structure.
    fn chunk_fallback(&self, text: &str) -> Vec<Clause> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Vec::new();
        }

        let step = self.chunk_size - self.chunk_overlap;
        let mut clauses = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let end = (start + self.chunk_size).min(words.len());
            let content = words[start..end].join(" ");
            let index = clauses.len() + 1;
            clauses.push(Clause {
                clause_id: format!("chunk_{index}"),
                clause_title: format!("Document Section {index}"),
                clause_content: content,
            });
            if end == words.len() {
                break;
            }
            start += step;
        }
        clauses
    }
}

/// Split `text` at each heading match; each clause runs from the end of its
/// heading to the start of the next (or end of text).
fn split_on_headings(heading_re: &Regex, text: &str) -> Vec<Clause> {
    let headings: Vec<(usize, usize, String)> = heading_re
        .captures_iter(text)
        .map(|caps| {
            let m = caps.get(0).expect("whole match");
            (m.start(), m.end(), caps[1].to_string())
        })
        .collect();

    let mut clauses = Vec::new();
    for (i, (_, body_start, id)) in headings.iter().enumerate() {
        let body_end = headings
            .get(i + 1)
            .map(|(next_start, _, _)| *next_start)
            .unwrap_or(text.len());
        let content = text[*body_start..body_end].trim();
        if content.is_empty() {
            continue;
        }
        clauses.push(Clause {
            clause_id: id.clone(),
            clause_title: format!("Clause {id}"),
            clause_content: content.to_string(),
        });
    }
    clauses
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> DocumentProcessor {
        DocumentProcessor::new(1000, 200)
    }

    #[test]
    fn detects_section_headings() {
        let pages = vec![
            "Section 2.1: Hospitalization expenses are covered up to the sum insured.\n\
             Section 2.2: Waiting period of 12 months applies to joint surgery."
                .to_string(),
        ];
        let doc = processor().process(&pages);
        assert_eq!(doc.total_pages, 1);
        assert_eq!(doc.clauses.len(), 2);
        assert_eq!(doc.clauses[0].clause_id, "2.1");
        assert_eq!(doc.clauses[0].clause_title, "Clause 2.1");
        assert!(doc.clauses[0].clause_content.starts_with("Hospitalization"));
        assert_eq!(doc.clauses[1].clause_id, "2.2");
    }

    #[test]
    fn detects_bare_numbering_when_no_keywords() {
        let pages = vec![
            "3.1 Coverage applies to inpatient treatment.\n3.2 Exclusions: dental care".to_string(),
        ];
        let doc = processor().process(&pages);
        assert_eq!(doc.clauses.len(), 2);
        assert_eq!(doc.clauses[0].clause_id, "3.1");
        assert_eq!(doc.clauses[1].clause_id, "3.2");
    }

    #[test]
    fn falls_back_to_chunks_for_unstructured_text() {
        let words: Vec<String> = (0..25).map(|i| format!("word{i}")).collect();
        let pages = vec![words.join(" ")];
        let doc = DocumentProcessor::new(10, 2).process(&pages);
        assert!(doc.clauses.len() > 1);
        assert_eq!(doc.clauses[0].clause_id, "chunk_1");
        assert_eq!(doc.clauses[0].clause_title, "Document Section 1");
        // overlap: the next chunk re-starts before the previous one ended
        assert!(doc.clauses[1].clause_content.starts_with("word8"));
    }

    #[test]
    fn empty_pages_yield_no_clauses() {
        let doc = processor().process(&["   ".to_string(), String::new()]);
        assert!(doc.clauses.is_empty());
        assert_eq!(doc.total_pages, 2);
    }

    #[test]
    fn multi_page_text_is_joined_before_segmentation() {
        let pages = vec![
            "Clause 1: General terms apply to".to_string(),
            "all insured members.\nClause 2: Coverage limit 500,000".to_string(),
        ];
        let doc = processor().process(&pages);
        assert_eq!(doc.clauses.len(), 2);
        assert!(doc.clauses[0]
            .clause_content
            .contains("all insured members."));
    }
}
