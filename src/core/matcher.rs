//! 批量最近邻匹配（汉明距离）
//!
//! 每帧一次批量调用，查询之间并行；同距离取最小下标。

use crate::core::error::{MosaicError, Result};
use crate::core::library::fingerprint::{hamming_words, Fingerprint};
use rayon::prelude::*;

/// 单个查询的最近库条目：(id, 距离)
pub fn nearest(table: &[Fingerprint], query: &Fingerprint) -> (u32, u32) {
    let q = query.words();
    let mut best = 0usize;
    let mut min_dist = u32::MAX;
    for (i, fp) in table.iter().enumerate() {
        let dist = hamming_words(fp.words(), q);
        if dist < min_dist {
            min_dist = dist;
            best = i;
            if dist == 0 {
                break;
            }
        }
    }
    (best as u32, min_dist)
}

/// 对每个查询返回 argmin_i hamming(query, table[i])
pub fn match_batch(table: &[Fingerprint], queries: &[Fingerprint]) -> Result<Vec<u32>> {
    if table.is_empty() {
        return Err(MosaicError::EmptyLibrary);
    }
    if queries.is_empty() {
        return Ok(Vec::new());
    }
    Ok(queries
        .par_iter()
        .map(|q| nearest(table, q).0)
        .collect())
}
