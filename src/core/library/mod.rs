//! 指纹库 - 把文档语料索引成只读的 64×64 二值指纹表
//!
//! 流程：
//! 1. 语料发现 - 递归扫描目录，按路径排序保证 id 稳定
//! 2. 并行索引 - 每页独立光栅化 + 指纹，失败页丢弃并计数
//! 3. 缓存 - 单文件整体读写，语料摘要不符时自动重建
//! 4. Hero 集 - 置位数极值页面，供大块纯色区域直接引用

pub mod cache;
pub mod corpus;
pub mod fingerprint;
pub mod heroes;
pub mod indexer;
pub mod table;

pub use cache::{CacheStamp, CACHE_FORMAT_VERSION};
pub use corpus::{Corpus, ImagePageRasterizer, LibraryEntry, Locator, PageRasterizer};
pub use fingerprint::{Fingerprint, BITS, SIDE, WORDS};
pub use heroes::{HeroSet, Shade};
pub use indexer::{IndexReport, LibraryIndexer};
pub use table::Library;
