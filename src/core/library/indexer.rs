//! 语料索引：每页独立光栅化 → 指纹，文档间并行

use super::corpus::{Corpus, Locator, PageRasterizer};
use super::fingerprint::Fingerprint;
use super::table::Library;
use crate::core::error::{MosaicError, Result};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::path::Path;

/// 索引统计，丢页率直接影响指纹表可复现性
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub documents: usize,
    pub documents_dropped: usize,
    pub pages_indexed: usize,
    pub pages_dropped: usize,
}

impl IndexReport {
    pub fn drop_rate(&self) -> f64 {
        let attempted = self.pages_indexed + self.pages_dropped;
        if attempted == 0 {
            return 0.0;
        }
        self.pages_dropped as f64 / attempted as f64
    }
}

#[derive(Default)]
struct DocumentOutcome {
    pages: Vec<(Locator, Fingerprint)>,
    dropped_pages: usize,
    dropped_document: bool,
}

pub struct LibraryIndexer<'a, R: PageRasterizer + ?Sized> {
    rasterizer: &'a R,
    scale: f32,
}

impl<'a, R: PageRasterizer + ?Sized> LibraryIndexer<'a, R> {
    pub fn new(rasterizer: &'a R, scale: f32) -> Self {
        Self { rasterizer, scale }
    }

    pub fn index(&self, corpus: &Corpus) -> Result<(Library, IndexReport)> {
        if corpus.is_empty() {
            return Err(MosaicError::EmptyCorpus("corpus has no documents".into()));
        }
        info!("📚 Indexing {} documents", corpus.len());

        let outcomes: Vec<DocumentOutcome> = corpus
            .documents()
            .par_iter()
            .map(|doc| self.index_document(doc))
            .collect();

        let mut report = IndexReport {
            documents: corpus.len(),
            ..Default::default()
        };
        let mut registry = Vec::new();
        let mut table = Vec::new();
        for outcome in outcomes {
            report.pages_dropped += outcome.dropped_pages;
            if outcome.dropped_document {
                report.documents_dropped += 1;
            }
            for (locator, fp) in outcome.pages {
                registry.push(locator);
                table.push(fp);
            }
        }
        report.pages_indexed = table.len();

        if report.pages_dropped > 0 || report.documents_dropped > 0 {
            warn!(
                "⚠️ Dropped {} pages ({:.2}%) and {} unreadable documents while indexing",
                report.pages_dropped,
                report.drop_rate() * 100.0,
                report.documents_dropped
            );
        }

        if table.is_empty() {
            return Err(MosaicError::EmptyCorpus(format!(
                "all {} documents failed to produce a fingerprint",
                corpus.len()
            )));
        }

        info!("✅ Indexed {} pages", report.pages_indexed);
        Ok((Library::new(registry, table)?, report))
    }

    fn index_document(&self, doc: &Path) -> DocumentOutcome {
        let pages = match self.rasterizer.page_count(doc) {
            Ok(n) => n,
            Err(e) => {
                debug!("Skipping unreadable document {:?}: {}", doc, e);
                return DocumentOutcome {
                    dropped_document: true,
                    ..Default::default()
                };
            }
        };

        let mut outcome = DocumentOutcome::default();
        for page in 0..pages {
            let locator = Locator::new(doc, page);
            match self.rasterizer.rasterize(&locator, self.scale) {
                Ok(bitmap) => {
                    let fp = Fingerprint::from_luma(&bitmap);
                    outcome.pages.push((locator, fp));
                }
                Err(e) => {
                    debug!("Dropping {:?} page {}: {}", doc, page, e);
                    outcome.dropped_pages += 1;
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SyntheticRasterizer;
    use std::path::PathBuf;

    fn corpus(names: &[&str]) -> Corpus {
        Corpus::from_documents(names.iter().map(PathBuf::from).collect())
    }

    #[test]
    fn test_index_assigns_dense_ids_in_corpus_order() {
        let rasterizer = SyntheticRasterizer::new(&[("a.pdf", 2), ("b.pdf", 3)]);
        let (lib, report) = LibraryIndexer::new(&rasterizer, 0.3)
            .index(&corpus(&["b.pdf", "a.pdf"]))
            .unwrap();

        assert_eq!(lib.len(), 5);
        assert_eq!(report.pages_indexed, 5);
        assert_eq!(report.drop_rate(), 0.0);
        assert_eq!(lib.entry(0).unwrap().locator, Locator::new("a.pdf", 0));
        assert_eq!(lib.entry(2).unwrap().locator, Locator::new("b.pdf", 0));
        assert_eq!(lib.fingerprints()[3], rasterizer.fingerprint_of("b.pdf", 1));
    }

    #[test]
    fn test_failing_pages_are_dropped_and_counted() {
        let rasterizer = SyntheticRasterizer::new(&[("a.pdf", 4)])
            .failing_page("a.pdf", 1)
            .failing_page("a.pdf", 3);
        let (lib, report) = LibraryIndexer::new(&rasterizer, 1.0)
            .index(&corpus(&["a.pdf", "missing.pdf"]))
            .unwrap();

        assert_eq!(lib.len(), 2);
        assert_eq!(report.pages_dropped, 2);
        assert_eq!(report.documents_dropped, 1);
        assert!((report.drop_rate() - 0.5).abs() < 1e-9);
        assert_eq!(lib.entry(1).unwrap().locator.page, 2);
    }

    #[test]
    fn test_empty_corpus_is_fatal() {
        let rasterizer = SyntheticRasterizer::new(&[]);
        let err = LibraryIndexer::new(&rasterizer, 1.0)
            .index(&Corpus::from_documents(vec![]))
            .unwrap_err();
        assert!(matches!(err, MosaicError::EmptyCorpus(_)));
    }

    #[test]
    fn test_all_pages_failing_is_fatal() {
        let rasterizer = SyntheticRasterizer::new(&[("a.pdf", 1)]).failing_page("a.pdf", 0);
        let err = LibraryIndexer::new(&rasterizer, 1.0)
            .index(&corpus(&["a.pdf"]))
            .unwrap_err();
        assert!(matches!(err, MosaicError::EmptyCorpus(_)));
    }
}
