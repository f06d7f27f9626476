use crate::core::config::CanvasSize;
use crate::core::error::Result;
use crate::core::video::frame::Rect;
use serde::{Deserialize, Serialize};

/// 区块内容：纯黑 / 纯白 / 指纹库条目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum ContentId {
    SolidBlack,
    SolidWhite,
    Library(u32),
}

impl ContentId {
    pub const SOLID_BLACK: i32 = -1;
    pub const SOLID_WHITE: i32 = -2;

    pub fn as_i32(&self) -> i32 {
        match *self {
            ContentId::SolidBlack => Self::SOLID_BLACK,
            ContentId::SolidWhite => Self::SOLID_WHITE,
            ContentId::Library(id) => id as i32,
        }
    }

    pub fn library_id(&self) -> Option<u32> {
        match *self {
            ContentId::Library(id) => Some(id),
            _ => None,
        }
    }
}

impl From<ContentId> for i32 {
    fn from(id: ContentId) -> Self {
        id.as_i32()
    }
}

impl TryFrom<i32> for ContentId {
    type Error = String;

    fn try_from(value: i32) -> std::result::Result<Self, Self::Error> {
        match value {
            Self::SOLID_BLACK => Ok(ContentId::SolidBlack),
            Self::SOLID_WHITE => Ok(ContentId::SolidWhite),
            v if v >= 0 => Ok(ContentId::Library(v as u32)),
            v => Err(format!("unknown content id {}", v)),
        }
    }
}

/// (x, y, w, h, content_id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub content_id: ContentId,
}

impl ManifestEntry {
    pub fn new(rect: Rect, content_id: ContentId) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            w: rect.w,
            h: rect.h,
            content_id,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }
}

/// 单帧的区块清单，创建后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    frame_index: usize,
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(frame_index: usize, entries: Vec<ManifestEntry>) -> Self {
        Self {
            frame_index,
            entries,
        }
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// alias 帧：同样的区块，换一个帧号
    pub fn aliased_as(&self, frame_index: usize) -> Manifest {
        Manifest {
            frame_index,
            entries: self.entries.clone(),
        }
    }

    pub fn library_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().filter_map(|e| e.content_id.library_id())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&self.entries)?)
    }

    pub fn from_bytes(frame_index: usize, bytes: &[u8]) -> Result<Manifest> {
        let entries: Vec<ManifestEntry> = bincode::deserialize(bytes)?;
        Ok(Manifest::new(frame_index, entries))
    }

    /// 校验区块恰好铺满画布：无越界、无重叠、无空洞
    pub fn validate_partition(&self, canvas: CanvasSize) -> std::result::Result<(), String> {
        let (cw, ch) = (canvas.width as usize, canvas.height as usize);
        let mut covered = vec![false; cw * ch];
        let mut area = 0usize;
        for (i, e) in self.entries.iter().enumerate() {
            if e.w == 0 || e.h == 0 {
                return Err(format!("entry {} is empty", i));
            }
            let (x1, y1) = (e.x as usize + e.w as usize, e.y as usize + e.h as usize);
            if x1 > cw || y1 > ch {
                return Err(format!("entry {} exceeds the {}x{} canvas", i, cw, ch));
            }
            for y in e.y as usize..y1 {
                for cell in &mut covered[y * cw + e.x as usize..y * cw + x1] {
                    if *cell {
                        return Err(format!("entry {} overlaps an earlier entry", i));
                    }
                    *cell = true;
                }
            }
            area += e.w as usize * e.h as usize;
        }
        if area != cw * ch {
            return Err(format!("entries cover {} of {} pixels", area, cw * ch));
        }
        Ok(())
    }
}
