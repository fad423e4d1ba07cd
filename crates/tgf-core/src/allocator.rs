use std::collections::HashSet;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info};

use crate::{
    domain::{FolderAllocation, FolderId, MembershipRule},
    errors::Error,
    plan::truncate_title,
    ports::ChatPlatform,
    Result,
};

/// Inclusive range of folder ids the platform accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FolderIdRange {
    min: i32,
    max: i32,
}

impl FolderIdRange {
    pub fn new(min: i32, max: i32) -> Result<Self> {
        if min < 1 || max < min {
            return Err(Error::Config(format!(
                "invalid folder id range {min}..={max}"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn size(&self) -> usize {
        (self.max - self.min) as usize + 1
    }

    pub fn contains(&self, id: i32) -> bool {
        (self.min..=self.max).contains(&id)
    }
}

impl Default for FolderIdRange {
    fn default() -> Self {
        Self { min: 11, max: 99 }
    }
}

/// Random draws per allocation before falling back to picking from the free list.
const SAMPLES_PER_SLOT: usize = 4;

/// Issues collision-free folder ids for one run and submits folders.
///
/// The issued-id set is owned here and lives for a single run; build a new
/// allocator per run.
pub struct FolderAllocator<R = StdRng> {
    range: FolderIdRange,
    title_max_chars: usize,
    issued: HashSet<i32>,
    rng: R,
}

impl FolderAllocator<StdRng> {
    pub fn new(range: FolderIdRange, title_max_chars: usize) -> Self {
        Self::with_rng(range, title_max_chars, StdRng::from_entropy())
    }
}

impl<R: Rng + Send> FolderAllocator<R> {
    pub fn with_rng(range: FolderIdRange, title_max_chars: usize, rng: R) -> Self {
        Self {
            range,
            title_max_chars,
            issued: HashSet::new(),
            rng,
        }
    }

    pub fn capacity(&self) -> usize {
        self.range.size()
    }

    pub fn issued(&self) -> usize {
        self.issued.len()
    }

    pub fn remaining(&self) -> usize {
        self.capacity() - self.issued()
    }

    /// Mark ids as taken (e.g. folders already on the account). Out-of-range ids are ignored.
    pub fn reserve(&mut self, ids: impl IntoIterator<Item = i32>) {
        for id in ids {
            if self.range.contains(id) {
                self.issued.insert(id);
            }
        }
    }

    /// Draw an unused id. Fails with `Error::Capacity` once the range is exhausted.
    pub fn allocate(&mut self) -> Result<FolderId> {
        let capacity = self.capacity();
        if self.issued.len() >= capacity {
            return Err(Error::Capacity {
                issued: self.issued.len(),
                capacity,
            });
        }

        for _ in 0..capacity * SAMPLES_PER_SLOT {
            let id = self.rng.gen_range(self.range.min..=self.range.max);
            if self.issued.insert(id) {
                return Ok(FolderId(id));
            }
        }

        // Range is nearly full; pick uniformly from what is left.
        let free: Vec<i32> = (self.range.min..=self.range.max)
            .filter(|id| !self.issued.contains(id))
            .collect();
        let id = free[self.rng.gen_range(0..free.len())];
        self.issued.insert(id);
        debug!(folder_id = id, "folder id picked from free list");
        Ok(FolderId(id))
    }

    /// Submit one folder to the platform, overwriting `existing` when given and
    /// allocating a fresh id otherwise.
    ///
    /// The id stays reserved even if the platform rejects the folder, since a
    /// failed call may still have been applied.
    pub async fn ensure_folder(
        &mut self,
        platform: &dyn ChatPlatform,
        existing: Option<FolderId>,
        title: &str,
        membership_rule: MembershipRule,
    ) -> Result<FolderAllocation> {
        let folder_id = match existing {
            Some(id) => {
                self.reserve([id.0]);
                id
            }
            None => self.allocate()?,
        };
        let folder = FolderAllocation {
            folder_id,
            title: truncate_title(title, self.title_max_chars),
            membership_rule,
        };

        platform.update_folder(&folder).await.map_err(|e| match e {
            Error::Platform(_) => e,
            other => Error::Platform(other.to_string()),
        })?;

        info!(
            folder_id = %folder.folder_id,
            title = %folder.title,
            reused = existing.is_some(),
            "folder saved"
        );
        Ok(folder)
    }
}
